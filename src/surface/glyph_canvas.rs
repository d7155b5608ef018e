//! CPU raster surface for watermark tiles.
//!
//! Text is rasterized with `ab_glyph` into an axis-aligned coverage mask in
//! text space, then resampled through the inverse of the current transform
//! onto the RGBA target. Bilinear sampling keeps rotated glyph edges smooth.
//!
//! # Example
//!
//! ```no_run
//! use tilemark::color::Color;
//! use tilemark::font::FontBook;
//! use tilemark::surface::{GlyphCanvas, RasterSurface, TextAlign, TextBaseline};
//!
//! # fn main() -> tilemark::Result<()> {
//! let mut canvas = GlyphCanvas::new(FontBook::system());
//! canvas.resize(200, 80)?;
//! canvas.set_font("16px sans-serif")?;
//! canvas.set_fill_style(Color::parse("rgba(0,0,0,0.5)")?);
//! canvas.set_text_align(TextAlign::Center);
//! canvas.set_text_baseline(TextBaseline::Middle);
//! canvas.translate(100.0, 40.0);
//! canvas.rotate(-0.4);
//! canvas.fill_text("CONFIDENTIAL", 0.0, 0.0)?;
//! let uri = canvas.to_data_url()?;
//! assert!(uri.starts_with("data:image/png;base64,"));
//! # Ok(())
//! # }
//! ```

use super::transform::{Point, Transform};
use super::{RasterSurface, TextAlign, TextBaseline};
use crate::color::Color;
use crate::error::{Result, WatermarkError};
use crate::font::{css_px_scale, FontBook, FontSpec};
use ab_glyph::{Font, FontArc, GlyphId, PxScale, ScaleFont};
use base64::Engine;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Largest raster edge accepted by `resize`.
pub const MAX_DIMENSION: u32 = 16_384;

#[derive(Debug, Clone)]
struct DrawState {
    font: FontSpec,
    loaded: Option<FontArc>,
    fill: Color,
    align: TextAlign,
    baseline: TextBaseline,
    transform: Transform,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            font: FontSpec::default(),
            loaded: None,
            fill: Color::black(),
            align: TextAlign::Start,
            baseline: TextBaseline::Alphabetic,
            transform: Transform::identity(),
        }
    }
}

/// Anti-aliased text coverage in text space.
struct CoverageMask {
    width: u32,
    height: u32,
    /// Text-space position of the mask's top-left corner
    origin: Point,
    data: Vec<f32>,
}

impl CoverageMask {
    fn new(width: u32, height: u32, origin: Point) -> Self {
        Self {
            width,
            height,
            origin,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    fn add(&mut self, x: i32, y: i32, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = y as usize * self.width as usize + x as usize;
        self.data[i] = (self.data[i] + coverage).min(1.0);
    }

    fn get(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Bilinear sample at a text-space point.
    fn sample(&self, p: Point) -> f32 {
        // Mask pixel centers sit at +0.5
        let sx = p.x - self.origin.x - 0.5;
        let sy = p.y - self.origin.y - 0.5;
        let x0 = sx.floor();
        let y0 = sy.floor();
        let fx = (sx - x0) as f32;
        let fy = (sy - y0) as f32;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let v00 = self.get(x0, y0);
        let v10 = self.get(x0 + 1, y0);
        let v01 = self.get(x0, y0 + 1);
        let v11 = self.get(x0 + 1, y0 + 1);

        v00 * (1.0 - fx) * (1.0 - fy) + v10 * fx * (1.0 - fy) + v01 * (1.0 - fx) * fy + v11 * fx * fy
    }
}

/// A [`RasterSurface`] backed by an in-memory RGBA image.
pub struct GlyphCanvas {
    fonts: FontBook,
    image: RgbaImage,
    state: DrawState,
}

impl std::fmt::Debug for GlyphCanvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphCanvas")
            .field("dimensions", &(self.image.width(), self.image.height()))
            .field("font", &self.state.font.to_string())
            .field("fill", &self.state.fill)
            .finish()
    }
}

impl GlyphCanvas {
    /// Create a 300x150 canvas, the default size of an HTML canvas.
    pub fn new(fonts: FontBook) -> Self {
        Self {
            fonts,
            image: RgbaImage::new(300, 150),
            state: DrawState::default(),
        }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Current font as a CSS shorthand.
    pub fn font(&self) -> String {
        self.state.font.to_string()
    }

    /// Encode the surface as PNG.
    pub fn png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(|e| WatermarkError::Encode(e.to_string()))?;
        Ok(buffer.into_inner())
    }

    fn current_font(&mut self) -> Result<FontArc> {
        if let Some(font) = &self.state.loaded {
            return Ok(font.clone());
        }
        let font = self.fonts.resolve(&self.state.font)?;
        self.state.loaded = Some(font.clone());
        Ok(font)
    }

    fn rasterize_text(&self, font: &FontArc, scale: PxScale, text: &str, x: f64, y: f64) -> CoverageMask {
        let scaled = font.as_scaled(scale);
        let width = advance_width(font, scale, text);
        let ascent = scaled.ascent() as f64;
        let descent = scaled.descent() as f64;

        let left = match self.state.align {
            TextAlign::Start => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::End => x - width,
        };
        let baseline = match self.state.baseline {
            TextBaseline::Alphabetic => y,
            TextBaseline::Top => y + ascent,
            TextBaseline::Middle => y + (ascent + descent) / 2.0,
            TextBaseline::Bottom => y + descent,
        };

        // One pixel of slack on every side for anti-aliasing overhang
        let origin = Point::new(left.floor() - 1.0, (baseline - ascent).floor() - 1.0);
        let mask_w = (width.ceil() as u32).saturating_add(3);
        let mask_h = ((ascent - descent).ceil() as u32).saturating_add(3);
        let mut mask = CoverageMask::new(mask_w, mask_h, origin);

        let mut cursor = (left - origin.x) as f32;
        let baseline_y = (baseline - origin.y) as f32;
        let mut prev: Option<GlyphId> = None;
        for c in text.chars() {
            let glyph_id = scaled.glyph_id(c);
            if let Some(p) = prev {
                cursor += scaled.kern(p, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(scale, ab_glyph::point(cursor, baseline_y));
            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let mx = gx as i32 + bounds.min.x as i32;
                    let my = gy as i32 + bounds.min.y as i32;
                    mask.add(mx, my, coverage);
                });
            }
            cursor += scaled.h_advance(glyph_id);
            prev = Some(glyph_id);
        }
        mask
    }

    fn composite(&mut self, mask: &CoverageMask) -> Result<()> {
        let transform = self.state.transform;
        let inverse = match transform.invert() {
            Some(inv) => inv,
            // A degenerate transform draws nothing
            None => return Ok(()),
        };

        // Device-space bounds of the transformed mask
        let corners = [
            Point::new(mask.origin.x, mask.origin.y),
            Point::new(mask.origin.x + mask.width as f64, mask.origin.y),
            Point::new(mask.origin.x, mask.origin.y + mask.height as f64),
            Point::new(
                mask.origin.x + mask.width as f64,
                mask.origin.y + mask.height as f64,
            ),
        ]
        .map(|p| transform.apply(p));
        let min_x = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let min_y = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_y = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
            return Err(WatermarkError::Render(
                "Non-finite transform while painting text".to_string(),
            ));
        }

        let x_start = min_x.floor().max(0.0) as u32;
        let y_start = min_y.floor().max(0.0) as u32;
        let x_end = (max_x.ceil().max(0.0) as u32).min(self.image.width());
        let y_end = (max_y.ceil().max(0.0) as u32).min(self.image.height());

        let fill = self.state.fill;
        for py in y_start..y_end {
            for px in x_start..x_end {
                let text_point = inverse.apply(Point::new(px as f64 + 0.5, py as f64 + 0.5));
                let coverage = mask.sample(text_point);
                if coverage <= 0.0 {
                    continue;
                }
                let alpha = (coverage * fill.a).clamp(0.0, 1.0);
                if alpha * 255.0 < 0.5 {
                    continue;
                }
                let existing = *self.image.get_pixel(px, py);
                self.image.put_pixel(px, py, source_over(existing, fill, alpha));
            }
        }
        Ok(())
    }
}

impl RasterSurface for GlyphCanvas {
    fn set_font(&mut self, font: &str) -> Result<()> {
        match FontSpec::parse(font) {
            Ok(spec) => {
                if spec != self.state.font {
                    self.state.font = spec;
                    self.state.loaded = None;
                }
            }
            Err(e) => tracing::warn!(font = font, error = %e, "Ignoring unparseable font"),
        }
        Ok(())
    }

    fn measure_text(&mut self, text: &str) -> Result<f64> {
        let font = self.current_font()?;
        let scale = css_px_scale(&font, self.state.font.size_px);
        Ok(advance_width(&font, scale, text))
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(WatermarkError::Render(format!(
                "Canvas size {}x{} exceeds the {}px limit",
                width, height, MAX_DIMENSION
            )));
        }
        self.image = RgbaImage::new(width, height);
        self.state = DrawState::default();
        Ok(())
    }

    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn set_fill_style(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.state.align = align;
    }

    fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.baseline = baseline;
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.state.transform = self.state.transform.translate(x, y);
    }

    fn rotate(&mut self, radians: f64) {
        self.state.transform = self.state.transform.rotate(radians);
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64) -> Result<()> {
        if text.is_empty() || self.image.width() == 0 || self.image.height() == 0 {
            return Ok(());
        }
        let font = self.current_font()?;
        let scale = css_px_scale(&font, self.state.font.size_px);
        let mask = self.rasterize_text(&font, scale, text, x, y);
        self.composite(&mask)
    }

    fn to_data_url(&self) -> Result<String> {
        if self.image.width() == 0 || self.image.height() == 0 {
            return Ok("data:,".to_string());
        }
        let png = self.png_bytes()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

/// Advance width of `text` including kerning.
fn advance_width(font: &FontArc, scale: PxScale, text: &str) -> f64 {
    let scaled = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev: Option<GlyphId> = None;
    for c in text.chars() {
        let glyph_id = scaled.glyph_id(c);
        if let Some(p) = prev {
            width += scaled.kern(p, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev = Some(glyph_id);
    }
    width as f64
}

/// Paint `color` at `alpha` (coverage times fill alpha) over `dst`.
fn source_over(dst: Rgba<u8>, color: Color, alpha: f32) -> Rgba<u8> {
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    if out_alpha <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    // Straight alpha in, straight alpha out
    let mix = |src: u8, dst: u8| -> u8 {
        let premultiplied = src as f32 * alpha + dst as f32 * dst_alpha * (1.0 - alpha);
        (premultiplied / out_alpha).round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(color.r, dst[0]),
        mix(color.g, dst[1]),
        mix(color.b, dst[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
