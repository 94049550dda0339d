//! Affine mapping between the pixel grid and projected coordinates
//!
//! Coefficients follow the six-term GDAL ordering:
//! `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`.

use std::fmt;

use crate::errors::{RasterError, RasterResult};

/// Immutable affine transform for an axis-aligned raster
///
/// Derived transforms ([`Geotransform::subset`], [`Geotransform::scale`])
/// return new values; nothing here mutates in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geotransform {
    /// World X of the upper-left corner of pixel (0, 0)
    pub origin_x: f64,
    /// World Y of the upper-left corner of pixel (0, 0)
    pub origin_y: f64,
    /// Pixel size along X, in world units
    pub pixel_width: f64,
    /// Pixel size along Y, usually negative for north-up rasters
    pub pixel_height: f64,
    /// Row rotation term (zero for north-up rasters)
    pub rotation_x: f64,
    /// Column rotation term (zero for north-up rasters)
    pub rotation_y: f64,
}

impl Geotransform {
    /// Create a north-up geotransform with no rotation
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> RasterResult<Self> {
        Self::from_affine_tuple(origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height)
    }

    /// Construct from the six raw affine coefficients
    ///
    /// # Arguments
    /// * `a` - origin X
    /// * `b` - pixel width
    /// * `c` - row rotation
    /// * `d` - origin Y
    /// * `e` - column rotation
    /// * `f` - pixel height
    ///
    /// # Returns
    /// The geotransform, or `MalformedGeotransform` when a pixel size is zero
    /// or any coefficient is not finite
    pub fn from_affine_tuple(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> RasterResult<Self> {
        let coefficients = [a, b, c, d, e, f];
        if coefficients.iter().any(|v| !v.is_finite()) {
            return Err(RasterError::MalformedGeotransform(
                format!("non-finite coefficient in {:?}", coefficients)));
        }
        if b == 0.0 {
            return Err(RasterError::MalformedGeotransform("pixel width is zero".to_string()));
        }
        if f == 0.0 {
            return Err(RasterError::MalformedGeotransform("pixel height is zero".to_string()));
        }

        Ok(Geotransform {
            origin_x: a,
            origin_y: d,
            pixel_width: b,
            pixel_height: f,
            rotation_x: c,
            rotation_y: e,
        })
    }

    /// Construct from a GDAL-ordered coefficient array
    pub fn from_array(coefficients: &[f64; 6]) -> RasterResult<Self> {
        let [a, b, c, d, e, f] = *coefficients;
        Self::from_affine_tuple(a, b, c, d, e, f)
    }

    /// The GDAL-ordered coefficient array
    pub fn to_tuple(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.rotation_x,
            self.origin_y,
            self.rotation_y,
            self.pixel_height,
        ]
    }

    /// Convert a world coordinate to the nearest pixel index `(col, row)`
    ///
    /// The row term is scaled by the pixel *width*, not the height. Rasters
    /// in this crate are treated as having square pixels and this keeps the
    /// mapping identical to the one existing datasets were clipped with.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (i64, i64) {
        let col = ((x - self.origin_x) / self.pixel_width).round();
        let row = ((self.origin_y - y) / self.pixel_width).round();
        (col as i64, row as i64)
    }

    /// Convert a pixel index `(col, row)` to the world coordinate of its upper-left corner
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        let x = col * self.pixel_width + self.origin_x;
        let y = row * self.pixel_height + self.origin_y;
        (x, y)
    }

    /// Geotransform of a sub-window starting at pixel `(x_offset, y_offset)`
    pub fn subset(&self, x_offset: usize, y_offset: usize) -> Geotransform {
        let (origin_x, origin_y) = self.pixel_to_world(x_offset as f64, y_offset as f64);
        Geotransform {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// Geotransform of a grid `factor` times finer, sharing the same origin
    pub fn scale(&self, factor: f64) -> Geotransform {
        Geotransform {
            pixel_width: self.pixel_width / factor,
            pixel_height: self.pixel_height / factor,
            ..*self
        }
    }

    /// Whether both rotation terms are zero
    pub fn is_north_up(&self) -> bool {
        self.rotation_x == 0.0 && self.rotation_y == 0.0
    }
}

impl fmt::Display for Geotransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "origin=({}, {}) pixel=({}, {}) rotation=({}, {})",
               self.origin_x, self.origin_y,
               self.pixel_width, self.pixel_height,
               self.rotation_x, self.rotation_y)
    }
}

/// Convert a world coordinate to a pixel index using `geotransform`
pub fn world_to_pixel(x: f64, y: f64, geotransform: &Geotransform) -> (i64, i64) {
    geotransform.world_to_pixel(x, y)
}

/// Convert a pixel index to a world coordinate using `geotransform`
pub fn pixel_to_world(col: f64, row: f64, geotransform: &Geotransform) -> (f64, f64) {
    geotransform.pixel_to_world(col, row)
}
