//! Georeferenced raster images and their I/O seams

pub mod clip;
pub mod dataset;
pub mod image;
pub mod loader;
pub mod pixel_type;

pub use self::clip::{PixelWindow, PolygonClipper};
pub use self::dataset::{RasterDataset, RasterDriver};
pub use self::image::RasterImage;
pub use self::loader::RasterLoader;
pub use self::pixel_type::{DataType, PixelType};
