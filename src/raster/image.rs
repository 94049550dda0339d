//! Georeferenced multi-band raster image
//!
//! A `RasterImage` owns a `(rows, cols, bands)` pixel buffer together with the
//! geotransform of its upper-left pixel and the projection of its grid. Every
//! operation derives a new image; buffers are never shared between images.

use std::fmt;
use std::ops::{Bound, RangeBounds};

use log::{debug, info};
use ndarray::{s, Array2, Array3, ArrayView2, Axis, Zip};

use super::clip::PolygonClipper;
use super::dataset::RasterDriver;
use super::pixel_type::{DataType, PixelType};
use crate::coordinate::{authority_code_of, BoundingBox, GeoPolygon, Geotransform};
use crate::errors::{RasterError, RasterResult};
use crate::processing::filters;
use crate::tiff::GeoTiffDriver;
use crate::utils::progress::ProgressTracker;

/// A pixel buffer bound to a geotransform and a coordinate reference system
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: Array3<f64>,
    geotransform: Geotransform,
    projection: String,
    data_type: DataType,
}

impl RasterImage {
    /// Create an image from a `(rows, cols, bands)` buffer
    pub fn new(pixels: Array3<f64>, geotransform: Geotransform, projection: impl Into<String>) -> Self {
        RasterImage {
            pixels,
            geotransform,
            projection: projection.into(),
            data_type: DataType::Float64,
        }
    }

    /// Create a single-band image from a `(rows, cols)` buffer
    pub fn from_band(band: Array2<f64>, geotransform: Geotransform, projection: impl Into<String>) -> Self {
        Self::new(band.insert_axis(Axis(2)), geotransform, projection)
    }

    /// Record the storage type the pixels came from
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn band_count(&self) -> usize {
        self.pixels.dim().2
    }

    /// `(rows, cols, bands)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.pixels.dim()
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn pixels(&self) -> &Array3<f64> {
        &self.pixels
    }

    pub(super) fn pixels_mut(&mut self) -> &mut Array3<f64> {
        &mut self.pixels
    }

    pub fn geotransform(&self) -> &Geotransform {
        &self.geotransform
    }

    /// Projection WKT
    pub fn projection(&self) -> &str {
        &self.projection
    }

    /// EPSG code of the projection, if it carries an authority
    pub fn epsg(&self) -> Option<u32> {
        authority_code_of(&self.projection)
    }

    /// World-coordinate footprint of the pixel grid
    pub fn bounds(&self) -> BoundingBox {
        let (x0, y0) = self.geotransform.pixel_to_world(0.0, 0.0);
        let (x1, y1) = self.geotransform.pixel_to_world(self.width() as f64, self.height() as f64);
        let mut bbox = BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
        bbox.epsg = self.epsg();
        bbox
    }

    /// Copy of a row/column window with its geotransform moved to the window origin
    ///
    /// Ranges are clamped to the image; an unbounded start means 0. All bands
    /// are kept.
    pub fn slice<R, C>(&self, rows: R, cols: C) -> RasterImage
    where
        R: RangeBounds<usize>,
        C: RangeBounds<usize>,
    {
        let (row_start, row_end) = resolve_range(&rows, self.height());
        let (col_start, col_end) = resolve_range(&cols, self.width());

        let pixels = self.pixels.slice(s![row_start..row_end, col_start..col_end, ..]).to_owned();

        RasterImage {
            pixels,
            geotransform: self.geotransform.subset(col_start, row_start),
            projection: self.projection.clone(),
            data_type: self.data_type,
        }
    }

    /// Band `n`, counting from 1
    pub fn band(&self, n: usize) -> RasterResult<ArrayView2<'_, f64>> {
        self.check_band(n)?;
        Ok(self.pixels.index_axis(Axis(2), n - 1))
    }

    /// Mask everything outside `polygon` (given in this image's pixel space)
    ///
    /// Returns the polygon's bounding window with masked pixels set to `mask_value`.
    pub fn clip_with_polygon(&self, polygon: &GeoPolygon, mask_value: f64) -> RasterResult<RasterImage> {
        PolygonClipper::new().clip(self, polygon, mask_value)
    }

    /// Nearest-neighbour upsample of the spatial axes by an integer factor
    pub fn upsample(&self, factor: usize) -> RasterResult<RasterImage> {
        if factor == 0 {
            return Err(RasterError::InvalidArgument("upsample factor must be at least 1".to_string()));
        }

        let (rows, cols, bands) = self.shape();
        let mut pixels = Array3::<f64>::zeros((rows * factor, cols * factor, bands));
        for (b, band) in self.pixels.axis_iter(Axis(2)).enumerate() {
            let zoomed = filters::zoom_nearest(&band, factor);
            pixels.index_axis_mut(Axis(2), b).assign(&zoomed);
        }

        debug!("Upsampled {}x{} to {}x{}", cols, rows, cols * factor, rows * factor);

        Ok(RasterImage {
            pixels,
            geotransform: self.geotransform.scale(factor as f64),
            projection: self.projection.clone(),
            data_type: self.data_type,
        })
    }

    /// Apply a pixel-buffer transform, keeping georeferencing
    pub fn apply<F>(&self, transform: F) -> RasterImage
    where
        F: FnOnce(&Array3<f64>) -> Array3<f64>,
    {
        RasterImage {
            pixels: transform(&self.pixels),
            geotransform: self.geotransform,
            projection: self.projection.clone(),
            data_type: self.data_type,
        }
    }

    /// Rescale all values linearly to [0, 1] using the global min and max
    ///
    /// NaN pixels are ignored when finding the range. A constant image divides
    /// by zero and yields NaN.
    pub fn normalise(&self) -> RasterImage {
        let (min, max) = self.pixels.iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        let range = max - min;
        self.apply(|pixels| pixels.mapv(|v| (v - min) / range))
            .with_data_type(DataType::Float64)
    }

    /// Append the normalised difference `(b1 - b2) / (b1 + b2)` as a new band
    ///
    /// Band numbers count from 1.
    pub fn add_index(&self, band_1: usize, band_2: usize) -> RasterResult<RasterImage> {
        if self.band_count() < 2 {
            return Err(RasterError::InsufficientBands(self.band_count()));
        }

        let first = self.band(band_1)?;
        let second = self.band(band_2)?;

        let index = Zip::from(&first)
            .and(&second)
            .map_collect(|&a, &b| (a - b) / (a + b));

        let pixels = ndarray::concatenate(Axis(2), &[self.pixels.view(), index.insert_axis(Axis(2)).view()])
            .map_err(|e| RasterError::ShapeMismatch(e.to_string()))?;

        info!("Added index of bands {} and {} as band {}", band_1, band_2, pixels.dim().2);

        Ok(RasterImage {
            pixels,
            geotransform: self.geotransform,
            projection: self.projection.clone(),
            data_type: DataType::Float64,
        })
    }

    /// Concatenate the bands of same-sized images
    ///
    /// The result takes the geotransform and projection of the first image.
    pub fn stack(images: &[RasterImage]) -> RasterResult<RasterImage> {
        if images.len() < 2 {
            return Err(RasterError::InsufficientInput { required: 2, supplied: images.len() });
        }

        let first = &images[0];
        let (rows, cols, _) = first.shape();
        for (i, image) in images.iter().enumerate().skip(1) {
            if image.height() != rows || image.width() != cols {
                return Err(RasterError::ShapeMismatch(format!(
                    "image {} is {}x{}, expected {}x{}", i, image.width(), image.height(), cols, rows)));
            }
        }

        let total_bands: usize = images.iter().map(|image| image.band_count()).sum();
        let mut pixels = Array3::<f64>::zeros((rows, cols, total_bands));

        let progress = ProgressTracker::new(images.len() as u64, "Stacking bands");
        let mut next_band = 0;
        for image in images {
            let bands = image.band_count();
            pixels.slice_mut(s![.., .., next_band..next_band + bands]).assign(&image.pixels);
            next_band += bands;
            progress.increment(1);
        }
        progress.finish();

        let data_type = if images.iter().all(|image| image.data_type == first.data_type) {
            first.data_type
        } else {
            DataType::Float64
        };

        Ok(RasterImage {
            pixels,
            geotransform: first.geotransform,
            projection: first.projection.clone(),
            data_type,
        })
    }

    /// Save as a GeoTIFF
    pub fn save(&self, path: &str, pixel_type: PixelType) -> RasterResult<()> {
        self.save_with(&GeoTiffDriver::new(), path, pixel_type)
    }

    /// Save through a specific raster driver
    pub fn save_with<D: RasterDriver>(&self, driver: &D, path: &str, pixel_type: PixelType) -> RasterResult<()> {
        info!("Saving {} to {} as {}", self, path, pixel_type);

        let bands: Vec<Array2<f64>> = self.pixels.axis_iter(Axis(2))
            .map(|band| band.to_owned())
            .collect();

        driver.create_and_write(path, pixel_type, &self.geotransform.to_tuple(), &self.projection, &bands)
    }

    fn check_band(&self, n: usize) -> RasterResult<()> {
        if n == 0 || n > self.band_count() {
            return Err(RasterError::BandIndex { band: n, band_count: self.band_count() });
        }
        Ok(())
    }
}

impl fmt::Display for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image - Shape: {}x{}x{} | EPSG: ", self.width(), self.height(), self.band_count())?;
        match self.epsg() {
            Some(code) => write!(f, "{}", code),
            None => write!(f, "unknown"),
        }
    }
}

/// Resolve a range against a dimension of length `len`, clamping both ends
fn resolve_range<R: RangeBounds<usize>>(range: &R, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };

    let start = start.min(len);
    (start, end.clamp(start, len))
}
