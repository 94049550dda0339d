//! GeoTIFF raster driver
//!
//! Opens GeoTIFF datasets for the loader and writes images as strip
//! organised, little-endian GeoTIFFs.

use log::{debug, info};
use ndarray::Array2;

use crate::compression::CompressionFactory;
use crate::coordinate::authority_code_of;
use crate::errors::{RasterError, RasterResult};
use crate::raster::{PixelType, RasterDriver};
use crate::tiff::builder::GeoTiffBuilder;
use crate::tiff::constants::{compression, photometric, planar_config, tags};
use crate::tiff::dataset::GeoTiffDataset;
use crate::tiff::geo_keys::{GeoKeyDirectory, ModelTags};
use crate::utils::progress::ProgressTracker;

/// Target size of one uncompressed strip
const STRIP_TARGET_BYTES: usize = 64 * 1024;

/// Reads and writes GeoTIFF files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoTiffDriver {
    compression: u16,
}

impl Default for GeoTiffDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl GeoTiffDriver {
    /// Driver writing uncompressed files
    pub fn new() -> Self {
        GeoTiffDriver { compression: compression::NONE }
    }

    /// Driver writing with the named compression (`none`, `deflate`, `zstd`)
    pub fn with_compression(name: &str) -> RasterResult<Self> {
        let handler = CompressionFactory::get_handler_by_name(name)?;
        Ok(GeoTiffDriver { compression: handler.code() })
    }

    /// TIFF Compression tag value used when writing
    pub fn compression(&self) -> u16 {
        self.compression
    }
}

impl RasterDriver for GeoTiffDriver {
    type Dataset = GeoTiffDataset;

    fn open(&self, path: &str) -> RasterResult<Self::Dataset> {
        GeoTiffDataset::open(path).map_err(|e| RasterError::DatasetOpen {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn create_and_write(
        &self,
        path: &str,
        pixel_type: PixelType,
        geotransform: &[f64; 6],
        projection_wkt: &str,
        bands: &[Array2<f64>],
    ) -> RasterResult<()> {
        let first = bands.first()
            .ok_or_else(|| RasterError::ShapeMismatch("no bands to write".to_string()))?;
        let (rows, cols) = first.dim();
        if rows == 0 || cols == 0 {
            return Err(RasterError::ShapeMismatch(format!("cannot write an empty {}x{} band", cols, rows)));
        }
        if let Some((i, band)) = bands.iter().enumerate().find(|(_, band)| band.dim() != (rows, cols)) {
            return Err(RasterError::ShapeMismatch(format!(
                "band {} is {}x{}, expected {}x{}", i + 1, band.ncols(), band.nrows(), cols, rows)));
        }

        let band_count = bands.len();
        let sample_bytes = pixel_type.data_type().size_in_bytes();
        let row_bytes = cols * band_count * sample_bytes;
        let rows_per_strip = (STRIP_TARGET_BYTES / row_bytes).clamp(1, rows);
        let handler = CompressionFactory::create_handler(self.compression)?;

        debug!("Writing {}x{}x{} {} in strips of {} rows, {} compression",
               cols, rows, band_count, pixel_type, rows_per_strip, handler.name());

        let mut builder = GeoTiffBuilder::new();
        let strip_count = rows.div_ceil(rows_per_strip);
        let progress = ProgressTracker::new(strip_count as u64, "Writing strips");
        for strip_start in (0..rows).step_by(rows_per_strip) {
            let strip_end = (strip_start + rows_per_strip).min(rows);
            let mut strip = Vec::with_capacity((strip_end - strip_start) * row_bytes);
            for r in strip_start..strip_end {
                for c in 0..cols {
                    for band in bands {
                        pixel_type.encode_le(band[[r, c]], &mut strip);
                    }
                }
            }
            builder.add_strip(handler.compress(&strip)?);
            progress.increment(1);
        }
        progress.finish();

        builder
            .set_long(tags::IMAGE_WIDTH, vec![cols as u32])
            .set_long(tags::IMAGE_LENGTH, vec![rows as u32])
            .set_short(tags::BITS_PER_SAMPLE, vec![pixel_type.bits_per_sample(); band_count])
            .set_short(tags::COMPRESSION, vec![self.compression])
            .set_short(tags::PHOTOMETRIC_INTERPRETATION, vec![photometric::BLACK_IS_ZERO])
            .set_short(tags::SAMPLES_PER_PIXEL, vec![band_count as u16])
            .set_long(tags::ROWS_PER_STRIP, vec![rows_per_strip as u32])
            .set_short(tags::PLANAR_CONFIGURATION, vec![planar_config::CHUNKY])
            .set_short(tags::SAMPLE_FORMAT, vec![pixel_type.sample_format(); band_count])
            .set_ascii(tags::SOFTWARE, concat!("remotesensing ", env!("CARGO_PKG_VERSION")));

        match ModelTags::from_geotransform(geotransform) {
            ModelTags::ScaleTiepoint { pixel_scale, tiepoint } => {
                builder
                    .set_double(tags::MODEL_PIXEL_SCALE_TAG, pixel_scale.to_vec())
                    .set_double(tags::MODEL_TIEPOINT_TAG, tiepoint.to_vec());
            },
            ModelTags::Transformation(matrix) => {
                builder.set_double(tags::MODEL_TRANSFORMATION_TAG, matrix.to_vec());
            },
        }

        let epsg = authority_code_of(projection_wkt);
        builder.set_short(tags::GEO_KEY_DIRECTORY_TAG, GeoKeyDirectory::for_epsg(epsg).to_shorts());

        builder.write(path)?;
        info!("Wrote {} band(s) of {}x{} to {}", band_count, cols, rows, path);
        Ok(())
    }
}
