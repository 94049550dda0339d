use ndarray::Array3;
use tempfile::TempDir;

use remotesensing::commands::{build_cli, CommandFactory, RemoteSensingCommandFactory};
use remotesensing::config::Settings;
use remotesensing::coordinate::CoordinateSystem;
use remotesensing::utils::logger::Logger;
use remotesensing::{
    fuse, transform_coordinate, DataType, GeoPolygon, GeoTiffDriver, Geotransform, PixelType,
    RasterError, RasterImage, RasterLoader,
};

const UTM_31N: u32 = 32631;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn path_in(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

/// 30 columns by 20 rows of 10 m pixels in UTM zone 31N, two bands
fn utm_scene() -> RasterImage {
    let pixels = Array3::from_shape_fn((20, 30, 2), |(r, c, b)| (r * 100 + c + b * 10_000) as f64);
    let gt = Geotransform::new(500_000.0, 5_000_000.0, 10.0, -10.0).unwrap();
    RasterImage::new(pixels, gt, CoordinateSystem::UTM(31, true).to_wkt())
}

#[test]
fn test_uint16_round_trip_keeps_georeferencing() {
    init();
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "scene.tif");
    let scene = utm_scene();

    scene.save(&path, PixelType::Uint16).unwrap();
    let loaded = RasterLoader::default().load(&path, None).unwrap();

    assert_eq!(loaded.shape(), (20, 30, 2));
    assert_eq!(loaded.data_type(), DataType::UInt16);
    assert_eq!(loaded.epsg(), Some(UTM_31N));
    assert_eq!(loaded.geotransform(), scene.geotransform());
    assert_eq!(loaded.pixels(), scene.pixels());
}

#[test]
fn test_compressed_float_round_trip() {
    init();
    let dir = TempDir::new().unwrap();
    let pixels = Array3::from_shape_fn((40, 25, 3), |(r, c, b)| r as f64 * 0.25 - c as f64 * 0.5 + b as f64);
    let image = RasterImage::new(pixels, Geotransform::new(2.0, 48.0, 0.001, -0.001).unwrap(), "EPSG:4326");

    for name in ["deflate", "zstd"] {
        let path = path_in(&dir, &format!("{}.tif", name));
        let driver = GeoTiffDriver::with_compression(name).unwrap();
        image.save_with(&driver, &path, PixelType::Float32).unwrap();

        let loaded = RasterLoader::default().load(&path, None).unwrap();
        assert_eq!(loaded.data_type(), DataType::Float32, "{}", name);
        assert_eq!(loaded.epsg(), Some(4326), "{}", name);
        assert_eq!(loaded.pixels(), image.pixels(), "{}", name);
    }
}

#[test]
fn test_rotated_grid_round_trip() {
    init();
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "rotated.tif");
    let gt = Geotransform::from_affine_tuple(100.0, 1.0, 0.5, 200.0, 0.25, -1.0).unwrap();
    let image = RasterImage::new(Array3::from_elem((4, 6, 1), 9.0), gt, "");

    image.save(&path, PixelType::Uint8).unwrap();
    let loaded = RasterLoader::default().load(&path, None).unwrap();

    assert_eq!(loaded.geotransform().to_tuple(), [100.0, 1.0, 0.5, 200.0, 0.25, -1.0]);
    assert_eq!(loaded.epsg(), None);
}

#[test]
fn test_integer_output_saturates() {
    init();
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "saturated.tif");
    let pixels = Array3::from_shape_vec((1, 3, 1), vec![-5.0, 1.6, 70_000.0]).unwrap();
    let image = RasterImage::new(pixels, Geotransform::new(0.0, 0.0, 1.0, -1.0).unwrap(), "");

    image.save(&path, PixelType::Uint16).unwrap();
    let loaded = RasterLoader::default().load(&path, None).unwrap();

    assert_eq!(loaded.pixels().iter().copied().collect::<Vec<_>>(), vec![0.0, 2.0, 65_535.0]);
}

#[test]
fn test_load_extent_in_raster_crs() {
    init();
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "scene.tif");
    let scene = utm_scene();
    scene.save(&path, PixelType::Uint16).unwrap();

    // Columns 5..15, rows 4..12
    let extent = GeoPolygon::from_exterior(&[
        (500_050.0, 4_999_880.0),
        (500_150.0, 4_999_880.0),
        (500_150.0, 4_999_960.0),
        (500_050.0, 4_999_960.0),
        (500_050.0, 4_999_880.0),
    ], Some(UTM_31N));

    let clipped = RasterLoader::default().load(&path, Some(&extent)).unwrap();

    assert_eq!(clipped.shape(), (8, 10, 2));
    assert_eq!(clipped.geotransform().origin_x, 500_050.0);
    assert_eq!(clipped.geotransform().origin_y, 4_999_960.0);
    assert_eq!(clipped.pixels()[[0, 0, 0]], 405.0);
    assert_eq!(clipped.pixels()[[7, 9, 1]], 10_000.0 + 1114.0);
}

#[test]
fn test_load_extent_reprojected_from_wgs84() {
    init();
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "scene.tif");
    utm_scene().save(&path, PixelType::Uint16).unwrap();

    let corners = [
        (500_050.0, 4_999_880.0),
        (500_150.0, 4_999_880.0),
        (500_150.0, 4_999_960.0),
        (500_050.0, 4_999_960.0),
        (500_050.0, 4_999_880.0),
    ];
    let geographic: Vec<(f64, f64)> = corners.iter()
        .map(|&(x, y)| transform_coordinate(x, y, UTM_31N, 4326).unwrap())
        .collect();
    let extent = GeoPolygon::from_exterior(&geographic, Some(4326));

    let clipped = RasterLoader::default().load(&path, Some(&extent)).unwrap();

    assert_eq!(clipped.shape(), (8, 10, 2));
    assert_eq!(clipped.epsg(), Some(UTM_31N));
    assert_eq!(clipped.pixels()[[0, 0, 0]], 405.0);
}

#[test]
fn test_extent_outside_raster_is_empty() {
    init();
    let dir = TempDir::new().unwrap();
    let path = path_in(&dir, "scene.tif");
    utm_scene().save(&path, PixelType::Uint16).unwrap();

    let far_away = GeoPolygon::from_exterior(&[
        (600_000.0, 4_000_000.0),
        (600_100.0, 4_000_000.0),
        (600_100.0, 4_000_100.0),
        (600_000.0, 4_000_000.0),
    ], Some(UTM_31N));

    let result = RasterLoader::default().load(&path, Some(&far_away));
    assert!(matches!(result, Err(RasterError::EmptyExtent(_))));
}

#[test]
fn test_unreadable_inputs_fail_to_open() {
    init();
    let dir = TempDir::new().unwrap();

    let missing = path_in(&dir, "missing.tif");
    let result = RasterLoader::default().load(&missing, None);
    assert!(matches!(result, Err(RasterError::DatasetOpen { ref path, .. }) if *path == missing));

    let text = path_in(&dir, "notes.tif");
    std::fs::write(&text, "not a raster at all").unwrap();
    let result = RasterLoader::default().load(&text, None);
    assert!(matches!(result, Err(RasterError::DatasetOpen { .. })));
}

#[test]
fn test_fuse_loaded_images() {
    init();
    let dir = TempDir::new().unwrap();
    let low_path = path_in(&dir, "low.tif");
    let pan_path = path_in(&dir, "pan.tif");
    let fused_path = path_in(&dir, "fused.tif");

    let mut low_pixels = Array3::<f64>::zeros((5, 5, 2));
    low_pixels.index_axis_mut(ndarray::Axis(2), 0).fill(3.0);
    low_pixels.index_axis_mut(ndarray::Axis(2), 1).fill(7.0);
    let wkt = CoordinateSystem::UTM(31, true).to_wkt();
    RasterImage::new(low_pixels, Geotransform::new(500_000.0, 5_000_000.0, 20.0, -20.0).unwrap(), wkt.clone())
        .save(&low_path, PixelType::Uint8)
        .unwrap();
    RasterImage::new(Array3::from_elem((10, 10, 1), 50.0), Geotransform::new(500_000.0, 5_000_000.0, 10.0, -10.0).unwrap(), wkt)
        .save(&pan_path, PixelType::Uint16)
        .unwrap();

    let loader = RasterLoader::default();
    let fused = fuse(&loader.load(&low_path, None).unwrap(), &loader.load(&pan_path, None).unwrap()).unwrap();
    assert_eq!(fused.shape(), (10, 10, 2));
    assert_eq!(fused.data_type(), DataType::Float64);

    fused.save(&fused_path, PixelType::Float32).unwrap();
    let reloaded = loader.load(&fused_path, None).unwrap();
    assert_eq!(reloaded.geotransform().pixel_width, 10.0);
    for (band, expected) in [(1, 3.0), (2, 7.0)] {
        assert!(reloaded.band(band).unwrap().iter().all(|v| (v - expected).abs() < 1e-4));
    }
}

#[test]
fn test_clip_command_writes_output() {
    init();
    let dir = TempDir::new().unwrap();
    let input = path_in(&dir, "scene.tif");
    let output = path_in(&dir, "clipped.tif");
    utm_scene().save(&input, PixelType::Uint16).unwrap();

    let args = build_cli().try_get_matches_from([
        "remotesensing", input.as_str(),
        "--clip", "--bbox", "500050,4999880,500150,4999960", "--epsg", "32631",
        "--compression", "deflate",
        "-o", output.as_str(),
    ]).unwrap();

    let logger = Logger::disabled();
    let factory = RemoteSensingCommandFactory::new(Settings::default());
    factory.create_command(&args, &logger).unwrap().execute().unwrap();

    let clipped = RasterLoader::default().load(&output, None).unwrap();
    assert_eq!(clipped.shape(), (8, 10, 2));
    assert_eq!(clipped.data_type(), DataType::UInt16);
    assert_eq!(clipped.pixels()[[0, 0, 0]], 405.0);
}

#[test]
fn test_stack_command_concatenates_bands() {
    init();
    let dir = TempDir::new().unwrap();
    let first = path_in(&dir, "first.tif");
    let second = path_in(&dir, "second.tif");
    let output = path_in(&dir, "stacked.tif");
    utm_scene().save(&first, PixelType::Uint16).unwrap();
    utm_scene().save(&second, PixelType::Uint16).unwrap();

    let args = build_cli().try_get_matches_from([
        "remotesensing", first.as_str(), "--stack", second.as_str(), "-o", output.as_str(),
    ]).unwrap();

    let logger = Logger::disabled();
    let factory = RemoteSensingCommandFactory::new(Settings::default());
    factory.create_command(&args, &logger).unwrap().execute().unwrap();

    let stacked = RasterLoader::default().load(&output, None).unwrap();
    assert_eq!(stacked.band_count(), 4);
    assert_eq!(stacked.band(3).unwrap(), utm_scene().band(1).unwrap());
}
