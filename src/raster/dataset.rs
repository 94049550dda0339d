//! Raster I/O seams
//!
//! The loader and `RasterImage::save` talk to storage only through these
//! traits. `GeoTiffDriver` is the bundled implementation; tests substitute
//! in-memory drivers.

use ndarray::{Array2, Array3};

use super::pixel_type::{DataType, PixelType};
use crate::errors::RasterResult;

/// An opened raster dataset
pub trait RasterDataset {
    /// `(width, height)` in pixels
    fn size(&self) -> (usize, usize);

    /// Number of bands
    fn band_count(&self) -> usize;

    /// Storage type of the samples
    fn data_type(&self) -> DataType;

    /// GDAL-ordered affine coefficients
    fn geotransform(&self) -> [f64; 6];

    /// Projection as WKT, empty when unknown
    fn projection_wkt(&self) -> String;

    /// Read a pixel window as a band-major `(bands, rows, cols)` array
    ///
    /// # Arguments
    /// * `x` - first column
    /// * `y` - first row
    /// * `width` - number of columns
    /// * `height` - number of rows
    fn read_window(&mut self, x: usize, y: usize, width: usize, height: usize) -> RasterResult<Array3<f64>>;

    /// Read every pixel of every band
    fn read_all(&mut self) -> RasterResult<Array3<f64>> {
        let (width, height) = self.size();
        self.read_window(0, 0, width, height)
    }
}

/// Opens and creates raster datasets
pub trait RasterDriver {
    type Dataset: RasterDataset;

    /// Open an existing dataset; failures surface as `DatasetOpen`
    fn open(&self, path: &str) -> RasterResult<Self::Dataset>;

    /// Create a dataset and write every band in one go
    ///
    /// All bands share one `(rows, cols)` shape; width, height and band
    /// count are taken from them.
    fn create_and_write(
        &self,
        path: &str,
        pixel_type: PixelType,
        geotransform: &[f64; 6],
        projection_wkt: &str,
        bands: &[Array2<f64>],
    ) -> RasterResult<()>;
}
