//! GeoTIFF georeferencing
//!
//! Parses and builds the GeoKey directory and converts between the GeoTIFF
//! model tags (pixel scale, tiepoint, transformation) and GDAL-ordered
//! geotransform coefficients.

use log::{debug, warn};

use crate::coordinate::CoordinateSystemFactory;
use crate::errors::{RasterError, RasterResult};
use crate::tiff::constants::{geo_keys, model_type, raster_type};

/// One GeoKey of the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    /// 0 when the value is stored in `value_offset`, otherwise the tag holding it
    pub tiff_tag_location: u16,
    pub count: u16,
    pub value_offset: u16,
}

impl GeoKeyEntry {
    /// A key whose short value is stored inline
    pub fn short(key_id: u16, value: u16) -> Self {
        GeoKeyEntry { key_id, tiff_tag_location: 0, count: 1, value_offset: value }
    }
}

/// The GeoKeyDirectoryTag contents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoKeyDirectory {
    pub entries: Vec<GeoKeyEntry>,
}

impl GeoKeyDirectory {
    /// Parse the directory from the tag's SHORT values
    ///
    /// The first four shorts are the header (version, revision, minor
    /// revision, key count) followed by four shorts per key.
    pub fn parse(shorts: &[u16]) -> RasterResult<Self> {
        if shorts.len() < 4 {
            return Err(RasterError::GenericError("Invalid GeoKey directory header".to_string()));
        }

        let key_count = shorts[3] as usize;
        let available = (shorts.len() - 4) / 4;
        if key_count > available {
            warn!("GeoKey directory declares {} keys but holds {}", key_count, available);
        }

        let entries: Vec<GeoKeyEntry> = shorts[4..].chunks_exact(4)
            .take(key_count)
            .map(|key| GeoKeyEntry {
                key_id: key[0],
                tiff_tag_location: key[1],
                count: key[2],
                value_offset: key[3],
            })
            .collect();

        debug!("GeoKey directory version {} with {} keys", shorts[0], entries.len());
        Ok(GeoKeyDirectory { entries })
    }

    /// Keys describing a raster in `epsg`, area-registered
    ///
    /// Codes that do not fit a GeoKey short are left out with a warning.
    pub fn for_epsg(epsg: Option<u32>) -> Self {
        let mut directory = GeoKeyDirectory::default();

        match epsg.map(|code| (code, u16::try_from(code))) {
            Some((code, Ok(short))) => {
                let is_geographic = CoordinateSystemFactory::from_epsg(code).is_geographic();
                let (model, key) = if is_geographic {
                    (model_type::GEOGRAPHIC, geo_keys::GEOGRAPHIC_TYPE)
                } else {
                    (model_type::PROJECTED, geo_keys::PROJECTED_CS_TYPE)
                };
                directory.entries.push(GeoKeyEntry::short(geo_keys::GT_MODEL_TYPE, model));
                directory.entries.push(GeoKeyEntry::short(geo_keys::GT_RASTER_TYPE, raster_type::PIXEL_IS_AREA));
                directory.entries.push(GeoKeyEntry::short(key, short));
            },
            Some((code, Err(_))) => {
                warn!("EPSG:{} cannot be stored as a GeoKey, writing raster without CRS", code);
                directory.entries.push(GeoKeyEntry::short(geo_keys::GT_RASTER_TYPE, raster_type::PIXEL_IS_AREA));
            },
            None => {
                directory.entries.push(GeoKeyEntry::short(geo_keys::GT_RASTER_TYPE, raster_type::PIXEL_IS_AREA));
            },
        }

        directory
    }

    /// Serialise as GeoKeyDirectoryTag SHORT values, keys in ascending order
    pub fn to_shorts(&self) -> Vec<u16> {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|entry| entry.key_id);

        let mut shorts = vec![1, 1, 0, entries.len() as u16];
        for entry in entries {
            shorts.extend_from_slice(&[entry.key_id, entry.tiff_tag_location, entry.count, entry.value_offset]);
        }
        shorts
    }

    /// Inline short value of a key
    pub fn get_short(&self, key_id: u16) -> Option<u16> {
        self.entries.iter()
            .find(|entry| entry.key_id == key_id && entry.tiff_tag_location == 0)
            .map(|entry| entry.value_offset)
    }

    /// EPSG code from ProjectedCSTypeGeoKey, else GeographicTypeGeoKey
    pub fn epsg(&self) -> Option<u32> {
        [geo_keys::PROJECTED_CS_TYPE, geo_keys::GEOGRAPHIC_TYPE].iter()
            .filter_map(|&key| self.get_short(key))
            .find(|&code| code != 0 && code != geo_keys::USER_DEFINED)
            .map(u32::from)
    }

    /// GTRasterTypeGeoKey, PixelIsArea when absent
    pub fn raster_type(&self) -> u16 {
        self.get_short(geo_keys::GT_RASTER_TYPE).unwrap_or(raster_type::PIXEL_IS_AREA)
    }
}

/// Geotransform from GeoTIFF model tags
///
/// ModelTransformation wins over scale plus tiepoint. Rasters registered as
/// PixelIsPoint are shifted half a pixel so the origin is the corner of
/// pixel (0, 0). Without any model tag the identity grid is returned.
pub fn geotransform_from_tags(
    pixel_scale: Option<&[f64]>,
    tiepoint: Option<&[f64]>,
    transformation: Option<&[f64]>,
    raster: u16,
) -> RasterResult<[f64; 6]> {
    let mut gt = match (transformation, pixel_scale, tiepoint) {
        (Some(m), _, _) if m.len() >= 16 => [m[3], m[0], m[1], m[7], m[4], m[5]],
        (Some(m), _, _) => {
            return Err(RasterError::GenericError(format!("ModelTransformationTag has {} values, expected 16", m.len())));
        },
        (None, Some(scale), Some(tie)) if scale.len() >= 2 && tie.len() >= 6 => {
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            [x - i * scale[0], scale[0], 0.0, y + j * scale[1], 0.0, -scale[1]]
        },
        (None, None, None) => {
            warn!("No georeferencing tags, using pixel coordinates");
            return Ok([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        },
        _ => return Err(RasterError::GenericError("Incomplete ModelPixelScale/ModelTiepoint tags".to_string())),
    };

    if raster == raster_type::PIXEL_IS_POINT {
        gt[0] -= 0.5 * gt[1] + 0.5 * gt[2];
        gt[3] -= 0.5 * gt[4] + 0.5 * gt[5];
    }

    Ok(gt)
}

/// Model tags for a geotransform
#[derive(Debug, Clone, PartialEq)]
pub enum ModelTags {
    /// ModelPixelScaleTag and ModelTiepointTag for north-up grids
    ScaleTiepoint { pixel_scale: [f64; 3], tiepoint: [f64; 6] },
    /// ModelTransformationTag for rotated grids
    Transformation([f64; 16]),
}

impl ModelTags {
    pub fn from_geotransform(gt: &[f64; 6]) -> Self {
        if gt[2] == 0.0 && gt[4] == 0.0 {
            ModelTags::ScaleTiepoint {
                pixel_scale: [gt[1], -gt[5], 0.0],
                tiepoint: [0.0, 0.0, 0.0, gt[0], gt[3], 0.0],
            }
        } else {
            ModelTags::Transformation([
                gt[1], gt[2], 0.0, gt[0],
                gt[4], gt[5], 0.0, gt[3],
                0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ])
        }
    }
}
