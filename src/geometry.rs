//! Tile geometry.
//!
//! A `w x h` text box rotated by `r` about its center has an axis-aligned
//! bounding box that decomposes into two pairs of right triangles: one pair
//! with hypotenuse `w`, one with hypotenuse `h`, both sharing the angle `r`.
//! For a hypotenuse `c`:
//!
//! ```text
//! opposite(c, r) = |sin r| * c
//! adjacent(c, r) = |cos r| * c
//!
//! tile_width  = opposite(h, r) + adjacent(w, r)
//! tile_height = opposite(w, r) + adjacent(h, r)
//! ```
//!
//! The text is anchored at the tile center: translate to the center, rotate,
//! then paint center-aligned with a middle baseline. With absolute sine and
//! cosine the result is symmetric in `r` and periodic in 180 degrees, and
//! stays valid for any angle.
//!
//! # Example
//!
//! ```
//! use tilemark::geometry::compute_tile;
//! use tilemark::probe::TextMetrics;
//!
//! let tile = compute_tile(TextMetrics::new(100.0, 20.0), 90.0);
//! assert!((tile.tile_width - 20.0).abs() < 1e-9);
//! assert!((tile.tile_height - 100.0).abs() < 1e-9);
//! assert_eq!(tile.raster_size(), (20, 100));
//! ```

use crate::probe::TextMetrics;
use crate::surface::Point;
use serde::Serialize;
use std::f64::consts::PI;

/// Raster tile holding one copy of the rotated text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TileGeometry {
    pub tile_width: f64,
    pub tile_height: f64,
    /// Point in tile space the text is anchored and rotated about
    pub origin: Point,
    pub rotation_radians: f64,
}

impl TileGeometry {
    /// Integer raster size; rounds up so the raster never clips the tile.
    pub fn raster_size(&self) -> (u32, u32) {
        (to_pixels(self.tile_width), to_pixels(self.tile_height))
    }

    /// Corners of the text box after rotation, in tile space.
    pub fn text_corners(&self, metrics: TextMetrics) -> [Point; 4] {
        let (w, h) = (sanitize_length(metrics.width), sanitize_length(metrics.height));
        let (sin, cos) = self.rotation_radians.sin_cos();
        [(-w, -h), (w, -h), (w, h), (-w, h)].map(|(dx, dy)| {
            let (dx, dy) = (dx / 2.0, dy / 2.0);
            Point::new(
                self.origin.x + dx * cos - dy * sin,
                self.origin.y + dx * sin + dy * cos,
            )
        })
    }
}

pub fn degree_to_radian(degree: f64) -> f64 {
    degree * PI / 180.0
}

/// Side opposite the angle in a right triangle with the given hypotenuse.
pub fn opposite(hypotenuse: f64, radian: f64) -> f64 {
    radian.sin().abs() * hypotenuse
}

/// Side adjacent to the angle in a right triangle with the given hypotenuse.
pub fn adjacent(hypotenuse: f64, radian: f64) -> f64 {
    radian.cos().abs() * hypotenuse
}

/// Compute the minimal tile that holds the text rotated by `degree`.
///
/// Total over all inputs: a non-finite angle is treated as 0 and non-finite
/// or negative text dimensions as 0, so the result is always finite and
/// non-negative.
pub fn compute_tile(metrics: TextMetrics, degree: f64) -> TileGeometry {
    let degree = if degree.is_finite() {
        degree
    } else {
        tracing::warn!(degree = degree, "Non-finite rotation, drawing unrotated");
        0.0
    };
    let text_width = sanitize_length(metrics.width);
    let text_height = sanitize_length(metrics.height);

    // Reduce first so huge angles keep their precision
    let radian = degree_to_radian(degree % 360.0);
    let big = (opposite(text_width, radian), adjacent(text_width, radian));
    let small = (opposite(text_height, radian), adjacent(text_height, radian));

    let tile_width = small.0 + big.1;
    let tile_height = big.0 + small.1;

    let geometry = TileGeometry {
        tile_width,
        tile_height,
        origin: Point::new(tile_width / 2.0, tile_height / 2.0),
        rotation_radians: radian,
    };
    tracing::debug!(
        text_width = text_width,
        text_height = text_height,
        degree = degree,
        tile_width = geometry.tile_width,
        tile_height = geometry.tile_height,
        "Computed tile geometry"
    );
    geometry
}

fn sanitize_length(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

fn to_pixels(v: f64) -> u32 {
    // Shave float noise so an exact 20.000000000000004 stays 20
    let v = (v * 1e6).round() / 1e6;
    v.ceil().clamp(0.0, u32::MAX as f64) as u32
}
