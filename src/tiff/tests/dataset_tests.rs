//! Tests for windowed GeoTIFF decoding

use std::io::Cursor;

use super::test_utils::{bigtiff_fixture, chunk_samples, encode_samples, TiffFixture, Value};
use crate::compression::{AdobeDeflateHandler, CompressionHandler, ZstdHandler};
use crate::coordinate::authority_code_of;
use crate::errors::RasterError;
use crate::io::byte_order::ByteOrder;
use crate::raster::{DataType, RasterDataset};
use crate::tiff::constants::{compression, planar_config, predictor, sample_format, tags};
use crate::tiff::dataset::{ChunkLayout, GeoTiffDataset};
use crate::tiff::geo_keys::GeoKeyDirectory;

fn open(fixture: TiffFixture) -> GeoTiffDataset<Cursor<Vec<u8>>> {
    match GeoTiffDataset::from_reader(fixture.cursor(), "fixture") {
        Ok(dataset) => dataset,
        Err(e) => panic!("fixture failed to open: {}", e),
    }
}

fn striped_value(band: usize, row: usize, col: usize) -> i64 {
    (band * 1000 + row * 10 + col) as i64
}

/// 5x7 two-band uint16 raster in strips of 3 rows, UTM 31N
fn striped_uint16() -> TiffFixture {
    let order = ByteOrder::LittleEndian;
    let chunks = chunk_samples(2, 7, 5, (5, 3), false, false, striped_value)
        .iter()
        .map(|samples| encode_samples(samples, 2, order))
        .collect();

    TiffFixture::new(order)
        .tag(tags::IMAGE_WIDTH, Value::Long(vec![5]))
        .tag(tags::IMAGE_LENGTH, Value::Long(vec![7]))
        .tag(tags::BITS_PER_SAMPLE, Value::Short(vec![16, 16]))
        .tag(tags::SAMPLES_PER_PIXEL, Value::Short(vec![2]))
        .tag(tags::ROWS_PER_STRIP, Value::Long(vec![3]))
        .tag(tags::SAMPLE_FORMAT, Value::Short(vec![sample_format::UNSIGNED; 2]))
        .tag(tags::MODEL_PIXEL_SCALE_TAG, Value::Double(vec![10.0, 10.0, 0.0]))
        .tag(tags::MODEL_TIEPOINT_TAG, Value::Double(vec![0.0, 0.0, 0.0, 500_000.0, 4_000_000.0, 0.0]))
        .tag(tags::GEO_KEY_DIRECTORY_TAG, Value::Short(GeoKeyDirectory::for_epsg(Some(32631)).to_shorts()))
        .chunks(chunks, false)
}

#[test]
fn test_striped_metadata() {
    let dataset = open(striped_uint16());
    assert_eq!(dataset.size(), (5, 7));
    assert_eq!(dataset.band_count(), 2);
    assert_eq!(dataset.data_type(), DataType::UInt16);
    assert_eq!(dataset.layout(), ChunkLayout::Strips { rows_per_strip: 3 });
    assert_eq!(dataset.geotransform(), [500_000.0, 10.0, 0.0, 4_000_000.0, 0.0, -10.0]);
    assert_eq!(dataset.epsg(), Some(32631));
    assert_eq!(authority_code_of(&dataset.projection_wkt()), Some(32631));
}

#[test]
fn test_striped_read_all_and_window() {
    let mut dataset = open(striped_uint16());

    let all = dataset.read_all().unwrap();
    assert_eq!(all.dim(), (2, 7, 5));
    for ((b, r, c), value) in all.indexed_iter() {
        assert_eq!(*value, striped_value(b, r, c) as f64);
    }

    // Spans the boundary between the first and second strip and the short last strip
    let window = dataset.read_window(1, 2, 3, 5).unwrap();
    assert_eq!(window.dim(), (2, 5, 3));
    for ((b, r, c), value) in window.indexed_iter() {
        assert_eq!(*value, striped_value(b, r + 2, c + 1) as f64);
    }
}

#[test]
fn test_empty_bits_per_sample_is_rejected() {
    let fixture = striped_uint16().tag(tags::BITS_PER_SAMPLE, Value::Short(vec![]));
    let result = GeoTiffDataset::from_reader(fixture.cursor(), "fixture");
    assert!(matches!(result, Err(RasterError::TagNotFound(tag)) if tag == tags::BITS_PER_SAMPLE));
}

#[test]
fn test_window_outside_raster() {
    let mut dataset = open(striped_uint16());
    assert!(matches!(dataset.read_window(4, 0, 2, 1), Err(RasterError::InvalidWindow(_))));
    assert!(matches!(dataset.read_window(0, 6, 1, 2), Err(RasterError::InvalidWindow(_))));
    assert!(matches!(dataset.read_window(0, 0, 0, 1), Err(RasterError::InvalidWindow(_))));
}

#[test]
fn test_tiled_planar_big_endian() {
    let order = ByteOrder::BigEndian;
    let chunks: Vec<Vec<u8>> = chunk_samples(2, 5, 6, (4, 4), true, true, striped_value)
        .iter()
        .map(|samples| encode_samples(samples, 2, order))
        .collect();
    assert_eq!(chunks.len(), 8);

    let mut dataset = open(TiffFixture::new(order)
        .tag(tags::IMAGE_WIDTH, Value::Long(vec![6]))
        .tag(tags::IMAGE_LENGTH, Value::Long(vec![5]))
        .tag(tags::BITS_PER_SAMPLE, Value::Short(vec![16, 16]))
        .tag(tags::SAMPLES_PER_PIXEL, Value::Short(vec![2]))
        .tag(tags::PLANAR_CONFIGURATION, Value::Short(vec![planar_config::PLANAR]))
        .tag(tags::TILE_WIDTH, Value::Long(vec![4]))
        .tag(tags::TILE_LENGTH, Value::Long(vec![4]))
        .chunks(chunks, true));

    assert_eq!(dataset.byte_order(), ByteOrder::BigEndian);
    assert_eq!(dataset.layout(), ChunkLayout::Tiles { width: 4, height: 4 });
    assert_eq!(dataset.geotransform(), [0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
    assert_eq!(dataset.projection_wkt(), "");

    let window = dataset.read_window(3, 3, 3, 2).unwrap();
    for ((b, r, c), value) in window.indexed_iter() {
        assert_eq!(*value, striped_value(b, r + 3, c + 3) as f64);
    }
}

#[test]
fn test_predictor_with_deflate_signed_samples() {
    let order = ByteOrder::LittleEndian;
    let value = |band: usize, row: usize, col: usize| (col as i64 - 2) * 300 * (row as i64 + 1) + band as i64 * 7;

    // Horizontal differencing over interleaved samples, stride of two bands
    let mut samples = Vec::new();
    for row in 0..3 {
        let flat: Vec<i16> = (0..4).flat_map(|col| (0..2).map(move |band| value(band, row, col) as i16)).collect();
        for (i, sample) in flat.iter().enumerate() {
            let diff = if i < 2 { *sample } else { sample.wrapping_sub(flat[i - 2]) };
            samples.push(diff as u16 as i64);
        }
    }
    let strip = AdobeDeflateHandler::new().compress(&encode_samples(&samples, 2, order)).unwrap();

    let mut dataset = open(TiffFixture::new(order)
        .tag(tags::IMAGE_WIDTH, Value::Long(vec![4]))
        .tag(tags::IMAGE_LENGTH, Value::Long(vec![3]))
        .tag(tags::BITS_PER_SAMPLE, Value::Short(vec![16, 16]))
        .tag(tags::SAMPLES_PER_PIXEL, Value::Short(vec![2]))
        .tag(tags::SAMPLE_FORMAT, Value::Short(vec![sample_format::SIGNED; 2]))
        .tag(tags::COMPRESSION, Value::Short(vec![compression::DEFLATE]))
        .tag(tags::PREDICTOR, Value::Short(vec![predictor::HORIZONTAL_DIFFERENCING]))
        .chunks(vec![strip], false));

    assert_eq!(dataset.data_type(), DataType::Int16);
    assert_eq!(dataset.compression_name(), "deflate");
    let all = dataset.read_all().unwrap();
    for ((b, r, c), decoded) in all.indexed_iter() {
        assert_eq!(*decoded, value(b, r, c) as f64);
    }
    assert_eq!(all[[0, 2, 0]], -1800.0);
}

#[test]
fn test_float32_zstd_big_endian() {
    let order = ByteOrder::BigEndian;
    let value = |row: usize, col: usize| row as f32 * 0.5 - col as f32 * 1.25;
    let samples: Vec<i64> = (0..2)
        .flat_map(|row| (0..3).map(move |col| value(row, col).to_bits() as i64))
        .collect();
    let strip = ZstdHandler::new().compress(&encode_samples(&samples, 4, order)).unwrap();

    let mut dataset = open(TiffFixture::new(order)
        .tag(tags::IMAGE_WIDTH, Value::Long(vec![3]))
        .tag(tags::IMAGE_LENGTH, Value::Long(vec![2]))
        .tag(tags::BITS_PER_SAMPLE, Value::Short(vec![32]))
        .tag(tags::SAMPLE_FORMAT, Value::Short(vec![sample_format::IEEEFP]))
        .tag(tags::COMPRESSION, Value::Short(vec![compression::ZSTD]))
        .chunks(vec![strip], false));

    assert_eq!(dataset.data_type(), DataType::Float32);
    let all = dataset.read_all().unwrap();
    assert_eq!(all[[0, 1, 2]], -2.0);
    assert_eq!(all[[0, 0, 1]], -1.25);
}

#[test]
fn test_bigtiff_dataset() {
    let mut dataset = match GeoTiffDataset::from_reader(bigtiff_fixture(), "bigtiff") {
        Ok(dataset) => dataset,
        Err(e) => panic!("BigTIFF failed to open: {}", e),
    };
    assert!(dataset.is_big_tiff());
    assert_eq!(dataset.data_type(), DataType::UInt8);

    let all = dataset.read_all().unwrap();
    assert_eq!(all.iter().copied().collect::<Vec<f64>>(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_unsupported_layouts() {
    let base = || TiffFixture::new(ByteOrder::LittleEndian)
        .tag(tags::IMAGE_WIDTH, Value::Long(vec![1]))
        .tag(tags::IMAGE_LENGTH, Value::Long(vec![1]))
        .chunks(vec![vec![0, 0, 0, 0]], false);

    let lzw = GeoTiffDataset::from_reader(base()
        .tag(tags::BITS_PER_SAMPLE, Value::Short(vec![8]))
        .tag(tags::COMPRESSION, Value::Short(vec![compression::LZW]))
        .cursor(), "lzw");
    assert!(matches!(lzw, Err(RasterError::UnsupportedCompression(5))));

    let float_predictor = GeoTiffDataset::from_reader(base()
        .tag(tags::BITS_PER_SAMPLE, Value::Short(vec![32]))
        .tag(tags::SAMPLE_FORMAT, Value::Short(vec![sample_format::IEEEFP]))
        .tag(tags::PREDICTOR, Value::Short(vec![predictor::FLOATING_POINT]))
        .cursor(), "float predictor");
    assert!(matches!(float_predictor, Err(RasterError::UnsupportedLayout(_))));

    let missing_width = GeoTiffDataset::from_reader(TiffFixture::new(ByteOrder::LittleEndian)
        .tag(tags::IMAGE_LENGTH, Value::Long(vec![1]))
        .cursor(), "no width");
    assert!(matches!(missing_width, Err(RasterError::TagNotFound(256))));
}
