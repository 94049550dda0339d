//! Coordinate Reference System handling
//!
//! Identifies the handful of systems the transformer understands and reads
//! EPSG authority codes out of WKT projection strings.

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{RasterError, RasterResult};

lazy_static! {
    // Matches WKT1 `AUTHORITY["EPSG","32631"]` and WKT2 `ID["EPSG",32631]`
    static ref AUTHORITY_PATTERN: Regex =
        Regex::new(r#"(?i)(?:AUTHORITY|ID)\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#)
            .expect("authority pattern is valid");
    static ref EPSG_STRING_PATTERN: Regex =
        Regex::new(r"^(?i)\s*EPSG\s*:\s*(\d+)\s*$").expect("EPSG pattern is valid");
}

const WGS84_GEOGCS: &str = concat!(
    r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],"#,
    r#"AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],"#,
    r#"UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]]"#
);

/// Identifier for common coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    WebMercator,
    /// UTM Zone (EPSG:326xx for northern hemisphere, 327xx for southern)
    UTM(u8, bool),
    /// Other EPSG code
    Other(u32),
}

impl CoordinateSystem {
    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, is_northern) => {
                if *is_northern {
                    32600 + *zone as u32
                } else {
                    32700 + *zone as u32
                }
            },
            CoordinateSystem::Other(code) => *code,
        }
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM(zone, is_northern) => {
                let hemisphere = if *is_northern { 'N' } else { 'S' };
                format!("UTM Zone {}{} (EPSG:{})", zone, hemisphere, self.epsg_code())
            },
            CoordinateSystem::Other(code) => format!("EPSG:{}", code),
        }
    }

    /// Whether coordinates are longitude/latitude in degrees
    ///
    /// EPSG reserves 4000-4999 for geographic 2D systems.
    pub fn is_geographic(&self) -> bool {
        match self {
            CoordinateSystem::WGS84 => true,
            CoordinateSystem::Other(code) => (4000..5000).contains(code),
            _ => false,
        }
    }

    /// A WKT1 description carrying a root `AUTHORITY["EPSG", ...]` node
    pub fn to_wkt(&self) -> String {
        let code = self.epsg_code();
        match self {
            CoordinateSystem::WGS84 => WGS84_GEOGCS.to_string(),
            CoordinateSystem::WebMercator => format!(
                concat!(
                    r#"PROJCS["WGS 84 / Pseudo-Mercator",{},PROJECTION["Mercator_1SP"],"#,
                    r#"PARAMETER["central_meridian",0],PARAMETER["scale_factor",1],"#,
                    r#"PARAMETER["false_easting",0],PARAMETER["false_northing",0],"#,
                    r#"UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],"#,
                    r#"AUTHORITY["EPSG","{}"]]"#
                ),
                WGS84_GEOGCS, code),
            CoordinateSystem::UTM(zone, is_northern) => format!(
                concat!(
                    r#"PROJCS["WGS 84 / UTM zone {}{}",{},PROJECTION["Transverse_Mercator"],"#,
                    r#"PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",{}],"#,
                    r#"PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],"#,
                    r#"PARAMETER["false_northing",{}],UNIT["metre",1,AUTHORITY["EPSG","9001"]],"#,
                    r#"AXIS["Easting",EAST],AXIS["Northing",NORTH],AUTHORITY["EPSG","{}"]]"#
                ),
                zone, if *is_northern { 'N' } else { 'S' }, WGS84_GEOGCS,
                utm_central_meridian(*zone), if *is_northern { 0 } else { 10_000_000 }, code),
            CoordinateSystem::Other(_) if self.is_geographic() => {
                format!(r#"GEOGCS["EPSG:{}",AUTHORITY["EPSG","{}"]]"#, code, code)
            },
            CoordinateSystem::Other(_) => {
                format!(r#"PROJCS["EPSG:{}",AUTHORITY["EPSG","{}"]]"#, code, code)
            },
        }
    }
}

/// Central meridian in degrees of a UTM zone
pub fn utm_central_meridian(zone: u8) -> i32 {
    (zone as i32 - 1) * 6 - 180 + 3
}

/// Read the EPSG code of a projection string
///
/// Accepts WKT (the root authority is the last one in the text) or a bare
/// `EPSG:n` reference. Returns `None` when no authority is present.
pub fn authority_code_of(wkt: &str) -> Option<u32> {
    if let Some(captures) = EPSG_STRING_PATTERN.captures(wkt) {
        return captures.get(1).and_then(|m| m.as_str().parse().ok());
    }

    AUTHORITY_PATTERN.captures_iter(wkt)
        .last()
        .and_then(|captures| captures.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Factory for creating coordinate systems
pub struct CoordinateSystemFactory;

impl CoordinateSystemFactory {
    /// Create a coordinate system from an EPSG code
    pub fn from_epsg(epsg: u32) -> CoordinateSystem {
        match epsg {
            4326 => CoordinateSystem::WGS84,
            3857 | 900913 => CoordinateSystem::WebMercator,
            32601..=32660 => CoordinateSystem::UTM((epsg - 32600) as u8, true),
            32701..=32760 => CoordinateSystem::UTM((epsg - 32700) as u8, false),
            _ => CoordinateSystem::Other(epsg),
        }
    }

    /// Parse a coordinate system from a string ("EPSG:4326", "4326" or WKT)
    pub fn from_string(crs_str: &str) -> RasterResult<CoordinateSystem> {
        let trimmed = crs_str.trim();

        if let Ok(epsg) = trimmed.parse::<u32>() {
            return Ok(Self::from_epsg(epsg));
        }

        authority_code_of(trimmed)
            .map(Self::from_epsg)
            .ok_or_else(|| RasterError::InvalidArgument(format!("Unsupported CRS format: {}", trimmed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_takes_root_code() {
        let wkt = CoordinateSystem::UTM(31, true).to_wkt();
        assert_eq!(authority_code_of(&wkt), Some(32631));
        assert_eq!(authority_code_of(WGS84_GEOGCS), Some(4326));
    }

    #[test]
    fn test_authority_variants() {
        assert_eq!(authority_code_of("EPSG:27700"), Some(27700));
        assert_eq!(authority_code_of(r#"PROJCRS["x",ID["EPSG",3035]]"#), Some(3035));
        assert_eq!(authority_code_of(r#"LOCAL_CS["arbitrary"]"#), None);
        assert_eq!(authority_code_of(""), None);
    }

    #[test]
    fn test_factory() {
        assert_eq!(CoordinateSystemFactory::from_epsg(32733), CoordinateSystem::UTM(33, false));
        assert_eq!(CoordinateSystemFactory::from_string("epsg:3857").unwrap(), CoordinateSystem::WebMercator);
        assert_eq!(CoordinateSystemFactory::from_string("4326").unwrap(), CoordinateSystem::WGS84);
        assert!(CoordinateSystemFactory::from_string("mercator").is_err());
    }

    #[test]
    fn test_other_codes_round_trip_through_wkt() {
        let geographic = CoordinateSystem::Other(4258);
        assert!(geographic.is_geographic());
        assert_eq!(authority_code_of(&geographic.to_wkt()), Some(4258));

        let projected = CoordinateSystem::Other(27700);
        assert!(!projected.is_geographic());
        assert_eq!(authority_code_of(&projected.to_wkt()), Some(27700));
    }

    #[test]
    fn test_central_meridian() {
        assert_eq!(utm_central_meridian(31), 3);
        assert_eq!(utm_central_meridian(1), -177);
    }
}
