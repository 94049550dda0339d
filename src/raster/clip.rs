//! Polygon clipping of raster images
//!
//! The polygon is rasterized onto the image's pixel grid with an even-odd
//! scanline fill evaluated at pixel centres. The mask is 1 outside the
//! polygon and 0 inside; the image is cut down to the polygon's bounding
//! window and masked pixels receive the mask value.

use geo_types::LineString;
use log::{debug, warn};
use ndarray::{s, Array2, Axis, Zip};

use super::image::RasterImage;
use crate::coordinate::{BoundingBox, GeoPolygon};
use crate::errors::{RasterError, RasterResult};

/// Mask value for pixels outside the polygon
pub const OUTSIDE: u8 = 1;
/// Mask value for pixels inside the polygon
pub const INSIDE: u8 = 0;

/// Rectangular pixel window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelWindow {
    /// Smallest window covering pixel-space bounds, intersected with a `width` x `height` grid
    ///
    /// Bounds are widened to whole pixels with floor/ceil. Fails with
    /// `EmptyExtent` when nothing of the grid is covered.
    pub fn covering(bounds: &BoundingBox, width: usize, height: usize) -> RasterResult<Self> {
        let x0 = bounds.min_x.floor().max(0.0);
        let y0 = bounds.min_y.floor().max(0.0);
        let x1 = bounds.max_x.ceil().min(width as f64);
        let y1 = bounds.max_y.ceil().min(height as f64);

        if !(x1 > x0 && y1 > y0) {
            return Err(RasterError::EmptyExtent(format!(
                "pixel bounds {} do not overlap the {}x{} grid", bounds, width, height)));
        }

        Ok(PixelWindow {
            x: x0 as usize,
            y: y0 as usize,
            width: (x1 - x0) as usize,
            height: (y1 - y0) as usize,
        })
    }
}

/// Clips images to polygons given in the image's pixel space
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonClipper {
    subtract_holes: bool,
}

impl PolygonClipper {
    /// A clipper that fills polygon exteriors only
    pub fn new() -> Self {
        PolygonClipper { subtract_holes: false }
    }

    /// Also carve interior rings out of the fill
    ///
    /// Off by default, in which case pixels inside a hole are kept.
    pub fn with_hole_subtraction(mut self, subtract_holes: bool) -> Self {
        self.subtract_holes = subtract_holes;
        self
    }

    /// Rasterize the polygon over a `rows` x `cols` grid
    ///
    /// # Returns
    /// A mask with `INSIDE` where the pixel centre lies inside any part and
    /// `OUTSIDE` elsewhere
    pub fn rasterize_mask(&self, polygon: &GeoPolygon, rows: usize, cols: usize) -> Array2<u8> {
        let mut mask = Array2::from_elem((rows, cols), OUTSIDE);

        for part in polygon.parts() {
            fill_ring(&mut mask, part.exterior(), INSIDE);

            if self.subtract_holes {
                for hole in part.interiors() {
                    fill_ring(&mut mask, hole, OUTSIDE);
                }
            } else if !part.interiors().is_empty() {
                debug!("Ignoring {} interior ring(s) while rasterizing", part.interiors().len());
            }
        }

        mask
    }

    /// Clip `image` to `polygon`, masking outside pixels with `mask_value`
    ///
    /// # Arguments
    /// * `image` - the image to clip
    /// * `polygon` - the extent in the image's pixel coordinates
    /// * `mask_value` - value written to every band of masked pixels
    ///
    /// # Returns
    /// The bounding window of the polygon with its geotransform offset
    /// accordingly, or `EmptyExtent` for a polygon without area or outside
    /// the image
    pub fn clip(&self, image: &RasterImage, polygon: &GeoPolygon, mask_value: f64) -> RasterResult<RasterImage> {
        let bounds = polygon.bounds()
            .ok_or_else(|| RasterError::EmptyExtent("polygon has no vertices".to_string()))?;

        if polygon.area() <= 0.0 {
            return Err(RasterError::EmptyExtent(format!("polygon with bounds {} has zero area", bounds)));
        }

        let window = PixelWindow::covering(&bounds, image.width(), image.height())?;
        debug!("Clipping {} to window {:?}", image, window);

        let mask = self.rasterize_mask(polygon, image.height(), image.width());
        let mask = mask.slice(s![window.y..window.y + window.height, window.x..window.x + window.width]);

        // slice() hands back an owned copy, so masking cannot reach the source
        let mut subset = image.slice(window.y..window.y + window.height, window.x..window.x + window.width);

        let mut masked = 0usize;
        for mut band in subset.pixels_mut().axis_iter_mut(Axis(2)) {
            Zip::from(&mut band).and(&mask).for_each(|pixel, &m| {
                if m != INSIDE {
                    *pixel = mask_value;
                    masked += 1;
                }
            });
        }

        if masked == window.width * window.height * subset.band_count() {
            warn!("Every pixel of the clipped window was masked");
        }

        Ok(subset)
    }
}

/// Even-odd fill of one ring, sampling pixel centres
fn fill_ring(mask: &mut Array2<u8>, ring: &LineString<f64>, value: u8) {
    let (rows, cols) = mask.dim();
    let points = &ring.0;
    if points.len() < 3 {
        return;
    }

    let mut crossings: Vec<f64> = Vec::new();
    for row in 0..rows {
        let yc = row as f64 + 0.5;

        crossings.clear();
        for edge in ring.lines() {
            let (p, q) = (edge.start, edge.end);
            if (p.y > yc) != (q.y > yc) {
                crossings.push(p.x + (yc - p.y) * (q.x - p.x) / (q.y - p.y));
            }
        }
        // Unclosed rings still need their implicit closing edge
        if let (Some(first), Some(last)) = (points.first(), points.last()) {
            if first != last && (last.y > yc) != (first.y > yc) {
                crossings.push(last.x + (yc - last.y) * (first.x - last.x) / (first.y - last.y));
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            // Columns whose centre c + 0.5 lies in [span[0], span[1])
            let start = (span[0] - 0.5).ceil().max(0.0);
            let end = (span[1] - 0.5).ceil().min(cols as f64);
            if end <= start {
                continue;
            }
            mask.slice_mut(s![row, start as usize..end as usize]).fill(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::Geotransform;
    use geo_types::{coord, MultiPolygon, Polygon};
    use ndarray::Array3;

    fn image(rows: usize, cols: usize) -> RasterImage {
        let pixels = Array3::from_shape_fn((rows, cols, 2), |(r, c, b)| (1 + r * cols + c + b * 1000) as f64);
        RasterImage::new(pixels, Geotransform::new(0.0, 100.0, 1.0, -1.0).unwrap(), "EPSG:32631")
    }

    fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> GeoPolygon {
        GeoPolygon::from_bbox(&BoundingBox::new(x0, y0, x1, y1))
    }

    #[test]
    fn test_full_extent_polygon_keeps_every_pixel() {
        let source = image(4, 5);
        let clipped = source.clip_with_polygon(&rectangle(0.0, 0.0, 5.0, 4.0), f64::NAN).unwrap();
        assert_eq!(clipped, source);
    }

    #[test]
    fn test_window_and_mask() {
        let source = image(10, 10);
        // Triangle with vertices on pixel corners
        let triangle = GeoPolygon::from_exterior(&[(2.0, 2.0), (8.0, 2.0), (2.0, 8.0), (2.0, 2.0)], None);
        let clipped = source.clip_with_polygon(&triangle, -1.0).unwrap();

        assert_eq!(clipped.shape(), (6, 6, 2));
        assert_eq!(clipped.geotransform(), &source.geotransform().subset(2, 2));
        // Upper-left corner inside, lower-right corner outside
        assert_eq!(clipped.pixels()[[0, 0, 0]], source.pixels()[[2, 2, 0]]);
        assert_eq!(clipped.pixels()[[5, 5, 0]], -1.0);
        assert_eq!(clipped.pixels()[[5, 5, 1]], -1.0);
        // Source untouched
        assert_eq!(source.pixels()[[7, 7, 0]], 78.0);
    }

    #[test]
    fn test_zero_area_polygon_is_empty_extent() {
        let line = GeoPolygon::from_exterior(&[(1.0, 1.0), (3.0, 3.0), (1.0, 1.0)], None);
        assert!(matches!(image(4, 4).clip_with_polygon(&line, 0.0), Err(RasterError::EmptyExtent(_))));

        let empty = GeoPolygon::new(MultiPolygon::new(vec![]), None);
        assert!(matches!(image(4, 4).clip_with_polygon(&empty, 0.0), Err(RasterError::EmptyExtent(_))));
    }

    #[test]
    fn test_polygon_outside_image_is_empty_extent() {
        let outside = rectangle(20.0, 20.0, 30.0, 30.0);
        assert!(matches!(image(4, 4).clip_with_polygon(&outside, 0.0), Err(RasterError::EmptyExtent(_))));
    }

    #[test]
    fn test_multipart_polygon_fills_each_exterior() {
        let parts = MultiPolygon::new(vec![
            Polygon::new(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0), (0.0, 0.0)].into(), vec![]),
            Polygon::new(vec![(4.0, 4.0), (6.0, 4.0), (6.0, 6.0), (4.0, 6.0), (4.0, 4.0)].into(), vec![]),
        ]);
        let mask = PolygonClipper::new().rasterize_mask(&GeoPolygon::new(parts, None), 6, 6);

        assert_eq!(mask[[1, 1]], INSIDE);
        assert_eq!(mask[[5, 5]], INSIDE);
        assert_eq!(mask[[3, 3]], OUTSIDE);
        assert_eq!(mask.iter().filter(|&&m| m == INSIDE).count(), 8);
    }

    #[test]
    fn test_holes_are_kept_unless_subtraction_enabled() {
        let exterior: LineString<f64> = vec![(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0), (0.0, 0.0)].into();
        let hole = LineString::new(vec![
            coord! { x: 2.0, y: 2.0 }, coord! { x: 4.0, y: 2.0 },
            coord! { x: 4.0, y: 4.0 }, coord! { x: 2.0, y: 4.0 }, coord! { x: 2.0, y: 2.0 },
        ]);
        let polygon = GeoPolygon::from_polygon(Polygon::new(exterior, vec![hole]), None);

        let default_mask = PolygonClipper::new().rasterize_mask(&polygon, 6, 6);
        assert_eq!(default_mask[[3, 3]], INSIDE);

        let carved = PolygonClipper::new().with_hole_subtraction(true).rasterize_mask(&polygon, 6, 6);
        assert_eq!(carved[[3, 3]], OUTSIDE);
        assert_eq!(carved[[0, 0]], INSIDE);
        assert_eq!(carved.iter().filter(|&&m| m == OUTSIDE).count(), 4);
    }

    #[test]
    fn test_window_is_clamped_to_grid() {
        let window = PixelWindow::covering(&BoundingBox::new(-3.2, 1.5, 4.1, 20.0), 10, 10).unwrap();
        assert_eq!(window, PixelWindow { x: 0, y: 1, width: 5, height: 9 });
    }
}
