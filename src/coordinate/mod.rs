//! Coordinate handling for georeferenced rasters
//!
//! This module provides the pixel/world geotransform, coordinate systems and
//! transformations between them, extent polygons and MGRS lookups.

mod bbox;
mod crs;
mod geotransform;
mod mgrs;
mod polygon;
mod transform;

// Re-export key types
pub use self::bbox::BoundingBox;
pub use self::crs::{authority_code_of, utm_central_meridian, CoordinateSystem, CoordinateSystemFactory};
pub use self::geotransform::{pixel_to_world, world_to_pixel, Geotransform};
pub use self::mgrs::{get_mgrs_info, latitude_band, mgrs_info_for, utm_zone, MgrsInfo};
pub use self::polygon::GeoPolygon;
pub use self::transform::{transform_coordinate, CoordinateTransformer};
