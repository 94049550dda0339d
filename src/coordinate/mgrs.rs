//! Military Grid Reference System tile identification
//!
//! Gives the grid zone designator and 100 km square of a polygon's
//! centroid, which is how most optical scene archives name their tiles.

use super::polygon::GeoPolygon;
use super::transform::CoordinateTransformer;
use crate::errors::{RasterError, RasterResult};

const LATITUDE_BANDS: &[u8] = b"CDEFGHJKLMNPQRSTUVWX";
const ROW_LETTERS: &[u8] = b"ABCDEFGHJKLMNPQRSTUV";
const COLUMN_SETS: [&[u8]; 3] = [b"ABCDEFGH", b"JKLMNPQR", b"STUVWXYZ"];

/// Grid zone and 100 km square of a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MgrsInfo {
    /// Two-digit UTM zone, e.g. "31"
    pub utm_zone: String,
    /// Latitude band letter, e.g. "N"
    pub latitude_band: String,
    /// Two-letter 100 km square identifier, e.g. "AA"
    pub square: String,
}

impl MgrsInfo {
    /// Tuple form `(zone, band, square)`
    pub fn as_tuple(&self) -> (&str, &str, &str) {
        (&self.utm_zone, &self.latitude_band, &self.square)
    }
}

/// UTM zone number for a longitude/latitude, honouring the Norway and Svalbard exceptions
pub fn utm_zone(lon: f64, lat: f64) -> u8 {
    let lon = if lon >= 180.0 { lon - 360.0 } else { lon };
    let mut zone = (((lon + 180.0) / 6.0).floor() as i32 + 1).clamp(1, 60);

    if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lon) {
        zone = 32;
    }

    if (72.0..84.0).contains(&lat) {
        zone = match lon {
            l if (0.0..9.0).contains(&l) => 31,
            l if (9.0..21.0).contains(&l) => 33,
            l if (21.0..33.0).contains(&l) => 35,
            l if (33.0..42.0).contains(&l) => 37,
            _ => zone,
        };
    }

    zone as u8
}

/// Latitude band letter; MGRS covers 80°S to 84°N
pub fn latitude_band(lat: f64) -> RasterResult<char> {
    if !(-80.0..=84.0).contains(&lat) {
        return Err(RasterError::InvalidArgument(
            format!("Latitude {} is outside the MGRS range", lat)));
    }
    // Band X stretches to 84°N
    let index = (((lat + 80.0) / 8.0).floor() as usize).min(LATITUDE_BANDS.len() - 1);
    Ok(LATITUDE_BANDS[index] as char)
}

/// MGRS description of a WGS84 longitude/latitude
pub fn mgrs_info_for(lon: f64, lat: f64) -> RasterResult<MgrsInfo> {
    let band = latitude_band(lat)?;
    let zone = utm_zone(lon, lat);
    let (easting, northing) = CoordinateTransformer::new().wgs84_to_utm(lon, lat, zone, lat >= 0.0);

    let set = match zone % 6 {
        0 => 6,
        s => s,
    } as usize;

    let columns = COLUMN_SETS[(set - 1) % 3];
    let column_index = ((easting / 100_000.0).floor() as i64 - 1).clamp(0, columns.len() as i64 - 1) as usize;

    // Even sets start their row lettering at F
    let row_offset = if set % 2 == 0 { 5 } else { 0 };
    let row_index = ((northing / 100_000.0).floor() as i64 + row_offset).rem_euclid(ROW_LETTERS.len() as i64) as usize;

    Ok(MgrsInfo {
        utm_zone: format!("{:02}", zone),
        latitude_band: band.to_string(),
        square: format!("{}{}", columns[column_index] as char, ROW_LETTERS[row_index] as char),
    })
}

/// MGRS zone, band and square containing the centroid of a WGS84 polygon
pub fn get_mgrs_info(polygon: &GeoPolygon) -> RasterResult<MgrsInfo> {
    if let Some(epsg) = polygon.epsg() {
        if epsg != 4326 {
            return Err(RasterError::InvalidArgument(
                format!("MGRS lookup expects EPSG:4326 coordinates, got EPSG:{}", epsg)));
        }
    }

    let center = polygon.centroid()
        .ok_or_else(|| RasterError::EmptyExtent("polygon has no centroid".to_string()))?;

    mgrs_info_for(center.x(), center.y())
}
