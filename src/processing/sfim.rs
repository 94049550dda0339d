//! Smoothing Filter-based Intensity Modulation (SFIM) pansharpening
//!
//! Each low-resolution band is resized onto the panchromatic grid and
//! multiplied by the detail ratio `pan / gaussian(pan)`.

use log::info;
use ndarray::{Array3, Axis, Zip};

use super::filters::{gaussian_filter, resize_bilinear};
use crate::errors::{RasterError, RasterResult};
use crate::raster::{DataType, RasterImage};
use crate::utils::progress::ProgressTracker;

/// Default smoothing width of the panchromatic low-pass filter, in pixels
pub const DEFAULT_SIGMA: f64 = 5.0;

/// SFIM fusion with a configurable smoothing width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sfim {
    sigma: f64,
}

impl Default for Sfim {
    fn default() -> Self {
        Sfim { sigma: DEFAULT_SIGMA }
    }
}

impl Sfim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sigma(sigma: f64) -> Self {
        Sfim { sigma }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Fuse a multi-band low-resolution image with a panchromatic band
    ///
    /// Every band of `low_resolution` is resampled to the pan grid. Where
    /// the smoothed pan is zero the result is NaN or infinite.
    ///
    /// # Returns
    /// A float64 image on the pan grid with one band per low-resolution band
    pub fn fuse(&self, low_resolution: &RasterImage, pan: &RasterImage) -> RasterResult<RasterImage> {
        if !(self.sigma > 0.0) {
            return Err(RasterError::InvalidArgument(format!("smoothing sigma must be positive, got {}", self.sigma)));
        }
        if pan.band_count() != 1 {
            return Err(RasterError::ShapeMismatch(format!(
                "panchromatic image must have one band, found {}", pan.band_count())));
        }
        if low_resolution.width() == 0 || low_resolution.height() == 0 {
            return Err(RasterError::ShapeMismatch("low resolution image is empty".to_string()));
        }

        let pan_band = pan.band(1)?;
        let smoothed = gaussian_filter(&pan_band, self.sigma);
        let (rows, cols) = pan_band.dim();
        let bands = low_resolution.band_count();

        info!("Fusing {} onto {}x{} pan grid (sigma {})", low_resolution, cols, rows, self.sigma);

        let mut fused = Array3::<f64>::zeros((rows, cols, bands));
        let progress = ProgressTracker::new(bands as u64, "Fusing images");
        for (b, band) in low_resolution.pixels().axis_iter(Axis(2)).enumerate() {
            let resized = resize_bilinear(&band, rows, cols);
            let out = Zip::from(&resized)
                .and(&pan_band)
                .and(&smoothed)
                .map_collect(|&low, &p, &s| (low * p) / s);
            fused.index_axis_mut(Axis(2), b).assign(&out);
            progress.increment(1);
        }
        progress.finish();

        Ok(RasterImage::new(fused, *pan.geotransform(), pan.projection()).with_data_type(DataType::Float64))
    }
}

/// Fuse with the default smoothing width
pub fn fuse(low_resolution: &RasterImage, pan: &RasterImage) -> RasterResult<RasterImage> {
    Sfim::default().fuse(low_resolution, pan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Geotransform;
    use ndarray::Array2;

    fn low(value: f64, bands: usize) -> RasterImage {
        let gt = Geotransform::new(0.0, 40.0, 4.0, -4.0).unwrap();
        RasterImage::new(Array3::from_elem((10, 10, bands), value), gt, "LOW")
    }

    fn pan(value: f64) -> RasterImage {
        let gt = Geotransform::new(0.0, 40.0, 1.0, -1.0).unwrap();
        RasterImage::from_band(Array2::from_elem((40, 40), value), gt, "PAN")
    }

    #[test]
    fn test_constant_inputs_pass_through() {
        let fused = fuse(&low(10.0, 1), &pan(5.0)).unwrap();
        assert_eq!(fused.shape(), (40, 40, 1));
        assert!(fused.pixels().iter().all(|v| (v - 10.0).abs() < 1e-9));
    }

    #[test]
    fn test_every_band_is_fused_on_pan_grid() {
        let fused = Sfim::with_sigma(2.0).fuse(&low(3.0, 4), &pan(7.0)).unwrap();
        assert_eq!(fused.shape(), (40, 40, 4));
        assert_eq!(fused.geotransform(), pan(7.0).geotransform());
        assert_eq!(fused.projection(), "PAN");
        assert_eq!(fused.data_type(), DataType::Float64);
        assert!(fused.pixels().iter().all(|v| (v - 3.0).abs() < 1e-9));
    }

    #[test]
    fn test_pan_detail_modulates_output() {
        let mut pan_pixels = Array2::from_elem((40, 40), 5.0);
        pan_pixels[[20, 20]] = 50.0;
        let pan = RasterImage::from_band(pan_pixels, *pan(0.0).geotransform(), "PAN");

        let fused = fuse(&low(10.0, 1), &pan).unwrap();
        assert!(fused.pixels()[[20, 20, 0]] > 10.0);
        assert!(fused.pixels()[[0, 0, 0]] < 10.0 + 1e-9);
    }

    #[test]
    fn test_zero_pan_gives_nan() {
        let fused = fuse(&low(10.0, 1), &pan(0.0)).unwrap();
        assert!(fused.pixels().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_multiband_pan_is_rejected() {
        assert!(matches!(fuse(&low(1.0, 1), &low(1.0, 2)), Err(RasterError::ShapeMismatch(_))));
        assert!(Sfim::with_sigma(0.0).fuse(&low(1.0, 1), &pan(1.0)).is_err());
    }
}
