//! Loading georeferenced rasters, optionally restricted to an extent

use log::{debug, info};

use super::clip::{PixelWindow, PolygonClipper};
use super::dataset::{RasterDataset, RasterDriver};
use super::image::RasterImage;
use crate::coordinate::{authority_code_of, CoordinateTransformer, GeoPolygon, Geotransform};
use crate::errors::{RasterError, RasterResult};
use crate::tiff::GeoTiffDriver;

/// Reads datasets through a `RasterDriver` into `RasterImage`s
pub struct RasterLoader<D: RasterDriver> {
    driver: D,
    clipper: PolygonClipper,
    transformer: CoordinateTransformer,
}

impl Default for RasterLoader<GeoTiffDriver> {
    fn default() -> Self {
        RasterLoader::new(GeoTiffDriver::new())
    }
}

impl<D: RasterDriver> RasterLoader<D> {
    pub fn new(driver: D) -> Self {
        RasterLoader {
            driver,
            clipper: PolygonClipper::new(),
            transformer: CoordinateTransformer::new(),
        }
    }

    /// Use a differently configured clipper for extent masking
    pub fn with_clipper(mut self, clipper: PolygonClipper) -> Self {
        self.clipper = clipper;
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Load a raster, reading only the window covering `extent` when given
    ///
    /// An extent with an EPSG code is reprojected into the dataset's CRS
    /// first; one without is assumed to already be in it. Pixels of the
    /// window outside the extent are set to 0.
    ///
    /// An extent with an EPSG code cannot be placed on a dataset whose
    /// projection has no authority code and fails with `InvalidArgument`.
    ///
    /// # Arguments
    /// * `path` - dataset path handed to the driver
    /// * `extent` - optional polygon restricting the read
    ///
    /// # Returns
    /// The loaded image, `DatasetOpen` when the driver cannot open the path,
    /// or `EmptyExtent` when the extent does not overlap the raster
    pub fn load(&self, path: &str, extent: Option<&GeoPolygon>) -> RasterResult<RasterImage> {
        let mut dataset = self.driver.open(path)?;
        let geotransform = Geotransform::from_array(&dataset.geotransform())?;
        let projection = dataset.projection_wkt();
        let (width, height) = dataset.size();

        info!("Opened {} ({}x{}, {} bands, {})", path, width, height, dataset.band_count(), dataset.data_type());

        let Some(extent) = extent else {
            let pixels = dataset.read_all()?;
            return Ok(to_image(pixels, geotransform, projection, &dataset));
        };

        let extent = self.to_dataset_crs(extent, &projection)?;
        let pixel_extent = extent.to_pixel(&geotransform);
        let bounds = pixel_extent.bounds()
            .ok_or_else(|| RasterError::EmptyExtent("extent polygon has no vertices".to_string()))?;

        let window = PixelWindow::covering(&bounds, width, height)?;
        debug!("Reading window {:?} of {}", window, path);

        let pixels = dataset.read_window(window.x, window.y, window.width, window.height)?;
        let window_transform = geotransform.subset(window.x, window.y);
        let image = to_image(pixels, window_transform, projection, &dataset);

        // The window origin moved, so the extent is re-expressed in window pixels
        let window_extent = extent.to_pixel(&window_transform);
        self.clipper.clip(&image, &window_extent, 0.0)
    }

    fn to_dataset_crs(&self, extent: &GeoPolygon, projection: &str) -> RasterResult<GeoPolygon> {
        match (extent.epsg(), authority_code_of(projection)) {
            (Some(from), Some(to)) if from != to => extent.transform_to(to, &self.transformer),
            (Some(from), None) => Err(RasterError::InvalidArgument(format!(
                "extent is in EPSG:{} but the dataset has no known coordinate system",
                from
            ))),
            _ => Ok(extent.clone()),
        }
    }
}

/// Wrap a band-major read as a `(rows, cols, bands)` image
fn to_image<T: RasterDataset>(pixels: ndarray::Array3<f64>, geotransform: Geotransform, projection: String, dataset: &T) -> RasterImage {
    let pixels = pixels.permuted_axes([1, 2, 0]).as_standard_layout().into_owned();
    RasterImage::new(pixels, geotransform, projection).with_data_type(dataset.data_type())
}
