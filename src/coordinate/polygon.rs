//! Extent polygons with an attached coordinate reference system
//!
//! A `GeoPolygon` is a (possibly multi-part) polygon used to select a region
//! of a raster. It lives either in world coordinates (with an EPSG code) or in
//! the pixel space of a particular geotransform.

use geo::{Area, BoundingRect, Centroid, MapCoords};
use geo_types::{coord, Coord, LineString, MultiPolygon, Point, Polygon};
use log::debug;

use super::bbox::BoundingBox;
use super::crs::CoordinateSystemFactory;
use super::geotransform::Geotransform;
use super::transform::CoordinateTransformer;
use crate::errors::{RasterError, RasterResult};

/// A multi-part polygon and the EPSG code of its coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct GeoPolygon {
    polygon: MultiPolygon<f64>,
    epsg: Option<u32>,
}

impl GeoPolygon {
    /// Wrap a multi-polygon
    pub fn new(polygon: MultiPolygon<f64>, epsg: Option<u32>) -> Self {
        GeoPolygon { polygon, epsg }
    }

    /// Wrap a single polygon
    pub fn from_polygon(polygon: Polygon<f64>, epsg: Option<u32>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]), epsg)
    }

    /// Build a polygon from an exterior ring given as `(x, y)` pairs
    pub fn from_exterior(coords: &[(f64, f64)], epsg: Option<u32>) -> Self {
        let ring: LineString<f64> = coords.iter().map(|&(x, y)| coord! { x: x, y: y }).collect();
        Self::from_polygon(Polygon::new(ring, vec![]), epsg)
    }

    /// Rectangle covering a bounding box, keeping its EPSG code
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Self::from_exterior(&[
            (bbox.min_x, bbox.min_y),
            (bbox.max_x, bbox.min_y),
            (bbox.max_x, bbox.max_y),
            (bbox.min_x, bbox.max_y),
            (bbox.min_x, bbox.min_y),
        ], bbox.epsg)
    }

    /// The underlying geometry
    pub fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }

    /// Polygon parts
    pub fn parts(&self) -> impl Iterator<Item = &Polygon<f64>> {
        self.polygon.0.iter()
    }

    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// `(min_x, min_y, max_x, max_y)` bounds, `None` for an empty polygon
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.polygon.bounding_rect().map(|rect| {
            let mut bbox = BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y);
            bbox.epsg = self.epsg;
            bbox
        })
    }

    /// Area centroid, `None` for an empty polygon
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.polygon.centroid()
    }

    /// Unsigned area in squared coordinate units
    pub fn area(&self) -> f64 {
        self.polygon.unsigned_area()
    }

    pub fn is_empty(&self) -> bool {
        self.polygon.0.iter().all(|part| part.exterior().0.is_empty())
    }

    /// Convert world coordinates to the pixel space of `geotransform`
    ///
    /// Vertices snap to the nearest pixel index, like every other world to
    /// pixel conversion in this crate.
    pub fn to_pixel(&self, geotransform: &Geotransform) -> GeoPolygon {
        let polygon = self.polygon.map_coords(|c: Coord<f64>| {
            let (col, row) = geotransform.world_to_pixel(c.x, c.y);
            coord! { x: col as f64, y: row as f64 }
        });
        GeoPolygon::new(polygon, None)
    }

    /// Reproject the polygon into `to_epsg`
    ///
    /// Fails when the polygon has no EPSG code or the transformer does not
    /// support the pair.
    pub fn transform_to(&self, to_epsg: u32, transformer: &CoordinateTransformer) -> RasterResult<GeoPolygon> {
        let from_epsg = self.epsg.ok_or_else(|| RasterError::InvalidArgument(
            "Cannot reproject a polygon without a coordinate system".to_string()))?;

        if from_epsg == to_epsg {
            return Ok(self.clone());
        }

        debug!("Reprojecting extent polygon from EPSG:{} to EPSG:{}", from_epsg, to_epsg);
        let from_crs = CoordinateSystemFactory::from_epsg(from_epsg);
        let to_crs = CoordinateSystemFactory::from_epsg(to_epsg);

        let transform_ring = |ring: &LineString<f64>| -> RasterResult<LineString<f64>> {
            ring.coords()
                .map(|c| transformer.transform_point(c.x, c.y, &from_crs, &to_crs)
                    .map(|(x, y)| coord! { x: x, y: y }))
                .collect::<RasterResult<Vec<_>>>()
                .map(LineString::new)
        };

        let mut parts = Vec::with_capacity(self.polygon.0.len());
        for part in self.parts() {
            let exterior = transform_ring(part.exterior())?;
            let interiors = part.interiors().iter()
                .map(&transform_ring)
                .collect::<RasterResult<Vec<_>>>()?;
            parts.push(Polygon::new(exterior, interiors));
        }

        Ok(GeoPolygon::new(MultiPolygon::new(parts), Some(to_epsg)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> GeoPolygon {
        GeoPolygon::from_bbox(&BoundingBox::new_with_crs(100.0, 200.0, 140.0, 240.0, 32631))
    }

    #[test]
    fn test_bounds_centroid_area() {
        let polygon = square();
        let bounds = polygon.bounds().unwrap();
        assert_eq!((bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y), (100.0, 200.0, 140.0, 240.0));
        assert_eq!(bounds.epsg, Some(32631));

        let centroid = polygon.centroid().unwrap();
        assert!((centroid.x() - 120.0).abs() < 1e-9);
        assert!((centroid.y() - 220.0).abs() < 1e-9);
        assert!((polygon.area() - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_pixel() {
        let gt = Geotransform::new(100.0, 240.0, 10.0, -10.0).unwrap();
        let pixel = square().to_pixel(&gt);
        let bounds = pixel.bounds().unwrap();
        assert_eq!((bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y), (0.0, 0.0, 4.0, 4.0));
        assert_eq!(pixel.epsg(), None);
    }

    #[test]
    fn test_empty_polygon() {
        let empty = GeoPolygon::new(MultiPolygon::new(vec![]), None);
        assert!(empty.is_empty());
        assert!(empty.bounds().is_none());
        assert!(empty.centroid().is_none());
    }

    #[test]
    fn test_transform_to_requires_crs() {
        let polygon = GeoPolygon::from_exterior(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)], None);
        assert!(polygon.transform_to(4326, &CoordinateTransformer::new()).is_err());
    }

    #[test]
    fn test_transform_to_utm() {
        let polygon = GeoPolygon::from_exterior(
            &[(2.9, -0.1), (3.1, -0.1), (3.1, 0.1), (2.9, 0.1), (2.9, -0.1)], Some(4326));
        let utm = polygon.transform_to(32631, &CoordinateTransformer::new()).unwrap();
        assert_eq!(utm.epsg(), Some(32631));
        let centroid = utm.centroid().unwrap();
        assert!((centroid.x() - 500_000.0).abs() < 1.0);
    }
}
