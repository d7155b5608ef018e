//! CSS color parsing for the watermark fill style.
//!
//! Accepts everything `csscolorparser` does: hex, `rgb()`/`rgba()`,
//! `hsl()`/`hsla()`, `hwb()` and the CSS named colors.
//!
//! # Example
//!
//! ```
//! use tilemark::color::Color;
//!
//! let c = Color::parse("hsla(0, 0%, 0%, 0.05)").unwrap();
//! assert_eq!((c.r, c.g, c.b), (0, 0, 0));
//! assert!((c.a - 0.05).abs() < 1e-6);
//! ```

use crate::error::{Result, WatermarkError};

/// RGBA color with straight (non-premultiplied) alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Opaque black, the canvas default fill style.
    pub fn black() -> Self {
        Self::new(0, 0, 0, 1.0)
    }

    /// Parse a CSS color string.
    pub fn parse(input: &str) -> Result<Self> {
        let parsed = csscolorparser::parse(input.trim())
            .map_err(|e| WatermarkError::Render(format!("Unsupported color '{}': {}", input, e)))?;

        let [r, g, b, a] = parsed.to_array();
        Ok(Self::new(channel(r), channel(g), channel(b), a))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
