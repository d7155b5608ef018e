//! Raster drawing surfaces.
//!
//! [`RasterSurface`] is the subset of a 2D canvas the watermark pipeline
//! needs: font metrics, an affine transform, filled text and export to an
//! embeddable data URI. [`GlyphCanvas`] implements it on the CPU.

pub mod glyph_canvas;
pub mod transform;

pub use glyph_canvas::GlyphCanvas;
pub use transform::{Point, Transform};

use crate::color::Color;
use crate::error::Result;

/// Horizontal anchor of `fill_text` relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// Text starts at x (left-to-right text)
    #[default]
    Start,
    Center,
    End,
}

/// Vertical anchor of `fill_text` relative to its y coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    /// y is the alphabetic baseline
    #[default]
    Alphabetic,
    Top,
    /// y is the middle of the em box
    Middle,
    Bottom,
}

/// A 2D raster surface with canvas semantics.
///
/// `resize` clears the pixels and resets all drawing state (font, fill
/// style, alignment, transform) to the defaults, as assigning a canvas
/// width does.
pub trait RasterSurface {
    /// Set the current font from a CSS `font` shorthand.
    ///
    /// Values that do not parse are ignored and the previous font is kept.
    fn set_font(&mut self, font: &str) -> Result<()>;

    /// Advance width of `text` in the current font, in CSS pixels.
    fn measure_text(&mut self, text: &str) -> Result<f64>;

    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn set_fill_style(&mut self, color: Color);

    fn set_text_align(&mut self, align: TextAlign);

    fn set_text_baseline(&mut self, baseline: TextBaseline);

    fn translate(&mut self, x: f64, y: f64);

    /// Rotate the current transform by `radians` (positive = clockwise).
    fn rotate(&mut self, radians: f64);

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<()>;

    /// Export the surface as a self-contained `data:` URI.
    ///
    /// A surface with zero width or height exports `data:,`.
    fn to_data_url(&self) -> Result<String>;
}
