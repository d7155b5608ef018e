// Test utilities: a deterministic raster surface that records every call

use tilemark::color::Color;
use tilemark::font::{FontBook, FontSpec};
use tilemark::surface::{RasterSurface, TextAlign, TextBaseline};
use tilemark::{Result, WatermarkError};

/// Width of one character as a fraction of the font size (monospace model).
pub const CHAR_WIDTH_EM: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    SetFont(String),
    Measure(String),
    Resize(u32, u32),
    FillStyle(Color),
    Align(TextAlign),
    Baseline(TextBaseline),
    Translate(f64, f64),
    Rotate(f64),
    FillText(String, f64, f64),
}

/// Surface with monospace metrics; exports `data:image/fake;w=..;h=..`.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub calls: Vec<SurfaceCall>,
    pub font_px: f64,
    pub width: u32,
    pub height: u32,
    pub fail_fill_text: bool,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            font_px: 10.0,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_fill_text: true,
            ..Self::new()
        }
    }

    /// Calls recorded since the last resize.
    pub fn paint_calls(&self) -> &[SurfaceCall] {
        let start = self
            .calls
            .iter()
            .rposition(|c| matches!(c, SurfaceCall::Resize(..)))
            .unwrap_or(0);
        &self.calls[start..]
    }
}

impl RasterSurface for RecordingSurface {
    fn set_font(&mut self, font: &str) -> Result<()> {
        if let Ok(spec) = FontSpec::parse(font) {
            self.font_px = spec.size_px;
        }
        self.calls.push(SurfaceCall::SetFont(font.to_string()));
        Ok(())
    }

    fn measure_text(&mut self, text: &str) -> Result<f64> {
        self.calls.push(SurfaceCall::Measure(text.to_string()));
        Ok(text.chars().count() as f64 * self.font_px * CHAR_WIDTH_EM)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.width = width;
        self.height = height;
        self.font_px = 10.0;
        self.calls.push(SurfaceCall::Resize(width, height));
        Ok(())
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_fill_style(&mut self, color: Color) {
        self.calls.push(SurfaceCall::FillStyle(color));
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.calls.push(SurfaceCall::Align(align));
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.calls.push(SurfaceCall::Baseline(baseline));
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.calls.push(SurfaceCall::Translate(x, y));
    }

    fn rotate(&mut self, radians: f64) {
        self.calls.push(SurfaceCall::Rotate(radians));
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<()> {
        if self.fail_fill_text {
            return Err(WatermarkError::Render("surface lost".to_string()));
        }
        self.calls.push(SurfaceCall::FillText(text.to_string(), x, y));
        Ok(())
    }

    fn to_data_url(&self) -> Result<String> {
        if self.width == 0 || self.height == 0 {
            return Ok("data:,".to_string());
        }
        Ok(format!("data:image/fake;w={};h={}", self.width, self.height))
    }
}

/// A font book that can actually load a font, or `None` on font-less machines.
pub fn system_fonts() -> Option<FontBook> {
    let book = FontBook::system();
    let spec = FontSpec::parse("12px sans-serif").ok()?;
    match book.resolve(&spec) {
        Ok(_) => Some(book),
        Err(e) => {
            eprintln!("skipping: {}", e);
            None
        }
    }
}
