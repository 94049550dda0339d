//! Georeferenced raster images for remote sensing
//!
//! Loads GeoTIFF scenes (optionally restricted to an extent polygon) into
//! `RasterImage`s, clips them with polygons, fuses multispectral and
//! panchromatic imagery with SFIM and writes the results back as GeoTIFF.

pub mod commands;
pub mod compression;
pub mod config;
pub mod coordinate;
pub mod errors;
pub mod io;
pub mod processing;
pub mod raster;
pub mod tiff;
pub mod utils;

pub use coordinate::{
    authority_code_of, get_mgrs_info, pixel_to_world, transform_coordinate, world_to_pixel, BoundingBox,
    CoordinateSystem, CoordinateTransformer, GeoPolygon, Geotransform, MgrsInfo,
};
pub use errors::{RasterError, RasterResult};
pub use processing::{fuse, Sfim};
pub use raster::{DataType, PixelType, PolygonClipper, RasterImage, RasterLoader};
pub use tiff::{GeoTiffDataset, GeoTiffDriver};
