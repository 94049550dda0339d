//! Compression handler trait definition

use crate::errors::RasterResult;

/// Strategy trait for the compression schemes of GeoTIFF strips and tiles
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip or tile
    fn decompress(&self, data: &[u8]) -> RasterResult<Vec<u8>>;

    /// Compress one strip or tile
    fn compress(&self, data: &[u8]) -> RasterResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// TIFF Compression tag value
    fn code(&self) -> u16;
}
