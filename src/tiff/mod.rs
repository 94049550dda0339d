//! GeoTIFF reading and writing
//!
//! Structure parsing for classic TIFF and BigTIFF, GeoKey handling, windowed
//! pixel decoding and the strip writer behind `GeoTiffDriver`.

pub mod builder;
pub mod constants;
pub mod dataset;
pub mod driver;
pub mod geo_keys;
pub mod ifd;
pub mod reader;
#[cfg(test)]
mod tests;

pub use builder::{GeoTiffBuilder, TagValue};
pub use dataset::{ChunkLayout, GeoTiffDataset};
pub use driver::GeoTiffDriver;
pub use geo_keys::{GeoKeyDirectory, GeoKeyEntry, ModelTags};
pub use ifd::{IFDEntry, IFD};
pub use reader::TiffReader;
