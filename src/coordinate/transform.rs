//! Coordinate transformation functionality
//!
//! Supports WGS84 geographic, Web Mercator and WGS84 UTM zones. Any pair of
//! these is converted by pivoting through WGS84 longitude/latitude.

use std::f64::consts::PI;

use log::trace;

use super::crs::{utm_central_meridian, CoordinateSystem, CoordinateSystemFactory};
use super::polygon::GeoPolygon;
use crate::errors::{RasterError, RasterResult};

/// WGS84 semi-major axis in meters
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// UTM scale factor on the central meridian
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Transformer for converting between coordinate systems
#[derive(Debug, Default, Clone, Copy)]
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Earth radius in meters used by spherical Web Mercator
    const EARTH_RADIUS: f64 = WGS84_A;

    pub fn new() -> Self {
        CoordinateTransformer
    }

    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(&self, lon: f64, lat: f64) -> (f64, f64) {
        // Web Mercator is undefined at the poles
        let lat = lat.clamp(-85.05, 85.05);

        let x = lon * Self::EARTH_RADIUS * PI / 180.0;
        let y = f64::ln(f64::tan((90.0 + lat) * PI / 360.0)) * Self::EARTH_RADIUS;

        (x, y)
    }

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = x * 180.0 / (Self::EARTH_RADIUS * PI);
        let lat = 180.0 / PI * (2.0 * f64::atan(f64::exp(y / Self::EARTH_RADIUS)) - PI / 2.0);

        (lon, lat)
    }

    /// Project WGS84 longitude/latitude into a UTM zone (transverse Mercator series)
    pub fn wgs84_to_utm(&self, lon: f64, lat: f64, zone: u8, is_northern: bool) -> (f64, f64) {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let lambda0 = (utm_central_meridian(zone) as f64).to_radians();

        let sin_phi = phi.sin();
        let cos_phi = phi.cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lon.to_radians() - lambda0);
        let m = meridian_arc(phi, e2);

        let easting = UTM_K0 * n * (a
            + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + UTM_FALSE_EASTING;

        let mut northing = UTM_K0 * (m + n * tan_phi * (a * a / 2.0
            + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
            + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

        if !is_northern {
            northing += UTM_FALSE_NORTHING_SOUTH;
        }

        (easting, northing)
    }

    /// Convert UTM easting/northing back to WGS84 longitude/latitude
    pub fn utm_to_wgs84(&self, easting: f64, northing: f64, zone: u8, is_northern: bool) -> (f64, f64) {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let y = if is_northern { northing } else { northing - UTM_FALSE_NORTHING_SOUTH };
        let m = y / UTM_K0;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let sin_phi1 = phi1.sin();
        let cos_phi1 = phi1.cos();
        let tan_phi1 = phi1.tan();

        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let n1 = WGS84_A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = (easting - UTM_FALSE_EASTING) / (n1 * UTM_K0);

        let phi = phi1 - (n1 * tan_phi1 / r1) * (d * d / 2.0
            - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
            + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1) * d.powi(6) / 720.0);

        let lambda = (d
            - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5) / 120.0)
            / cos_phi1;

        (utm_central_meridian(zone) as f64 + lambda.to_degrees(), phi.to_degrees())
    }

    /// Transform a coordinate between coordinate systems
    pub fn transform_point(&self, x: f64, y: f64, from_crs: &CoordinateSystem, to_crs: &CoordinateSystem) -> RasterResult<(f64, f64)> {
        if from_crs == to_crs {
            return Ok((x, y));
        }

        let unsupported = || RasterError::UnsupportedTransformation {
            from: from_crs.epsg_code(),
            to: to_crs.epsg_code(),
        };

        let (lon, lat) = match from_crs {
            CoordinateSystem::WGS84 => (x, y),
            CoordinateSystem::WebMercator => self.web_mercator_to_wgs84(x, y),
            CoordinateSystem::UTM(zone, north) => self.utm_to_wgs84(x, y, *zone, *north),
            CoordinateSystem::Other(_) => return Err(unsupported()),
        };

        let result = match to_crs {
            CoordinateSystem::WGS84 => (lon, lat),
            CoordinateSystem::WebMercator => self.wgs84_to_web_mercator(lon, lat),
            CoordinateSystem::UTM(zone, north) => self.wgs84_to_utm(lon, lat, *zone, *north),
            CoordinateSystem::Other(_) => return Err(unsupported()),
        };

        trace!("Transformed ({}, {}) from {} to ({}, {}) in {}",
               x, y, from_crs.description(), result.0, result.1, to_crs.description());
        Ok(result)
    }

    /// Transform a coordinate between two EPSG codes
    pub fn transform_coordinate(&self, x: f64, y: f64, from_epsg: u32, to_epsg: u32) -> RasterResult<(f64, f64)> {
        let from_crs = CoordinateSystemFactory::from_epsg(from_epsg);
        let to_crs = CoordinateSystemFactory::from_epsg(to_epsg);
        self.transform_point(x, y, &from_crs, &to_crs)
    }

    /// Reproject every vertex of a polygon whose coordinates are in `from_epsg`
    ///
    /// The polygon's own EPSG tag is ignored in favour of `from_epsg`.
    pub fn transform_polygon(&self, polygon: &GeoPolygon, from_epsg: u32, to_epsg: u32) -> RasterResult<GeoPolygon> {
        GeoPolygon::new(polygon.polygon().clone(), Some(from_epsg)).transform_to(to_epsg, self)
    }
}

/// Distance along the meridian from the equator to latitude `phi`
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

/// Transform a coordinate between two EPSG codes
pub fn transform_coordinate(x: f64, y: f64, from_epsg: u32, to_epsg: u32) -> RasterResult<(f64, f64)> {
    CoordinateTransformer::new().transform_coordinate(x, y, from_epsg, to_epsg)
}
