//! Font handling for watermark text.
//!
//! - [`FontSpec`] parses the CSS `font` shorthand used by the watermark
//!   options (`"12px -apple-system, ..., sans-serif"`).
//! - [`FontBook`] turns a `FontSpec` into a loaded `ab_glyph` font by
//!   searching the system font directories.
//! - [`LineMetrics`] answers the "normal" line height of a font, which is what
//!   a layout engine reports as the height of a single-line inline box.

pub mod book;

pub use book::{css_px_scale, system_font_dirs, FontBook};

use crate::error::{Result, WatermarkError};
use std::fmt;

/// CSS pixels per point.
const PX_PER_PT: f64 = 96.0 / 72.0;

/// Root font size used to resolve `em`, `rem` and `%` sizes.
const ROOT_FONT_SIZE_PX: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

/// A parsed CSS `font` shorthand.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub style: FontStyle,
    pub small_caps: bool,
    /// Numeric weight, 400 = normal, 700 = bold
    pub weight: u16,
    /// Em size in CSS pixels
    pub size_px: f64,
    /// Explicit line height in CSS pixels; `None` means `normal`
    pub line_height_px: Option<f64>,
    /// Family list in priority order, quotes removed
    pub families: Vec<String>,
}

impl Default for FontSpec {
    /// `10px sans-serif`, the initial font of a 2D canvas.
    fn default() -> Self {
        Self {
            style: FontStyle::Normal,
            small_caps: false,
            weight: 400,
            size_px: 10.0,
            line_height_px: None,
            families: vec!["sans-serif".to_string()],
        }
    }
}

impl FontSpec {
    /// Parse a CSS `font` shorthand.
    ///
    /// The grammar is `[style] [variant] [weight] size[/line-height] family[, family]*`.
    /// Both size and at least one family are required.
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || WatermarkError::Font(format!("Invalid font shorthand '{}'", input));
        let mut spec = FontSpec {
            families: Vec::new(),
            ..FontSpec::default()
        };

        let mut rest = input.trim();
        let mut size = None;
        while !rest.is_empty() {
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let token = &rest[..end];
            let lower = token.to_ascii_lowercase();

            if let Some((px, line_height)) = parse_size_token(&lower) {
                size = Some(px);
                spec.line_height_px = line_height;
                rest = rest[end..].trim_start();
                break;
            }

            match lower.as_str() {
                "normal" => {}
                "italic" => spec.style = FontStyle::Italic,
                "oblique" => spec.style = FontStyle::Oblique,
                "small-caps" => spec.small_caps = true,
                "bold" | "bolder" => spec.weight = 700,
                "lighter" => spec.weight = 300,
                _ => match lower.parse::<u16>() {
                    Ok(w) if (1..=1000).contains(&w) => spec.weight = w,
                    _ => return Err(invalid()),
                },
            }
            rest = rest[end..].trim_start();
        }

        spec.size_px = size.ok_or_else(invalid)?;
        spec.families = parse_family_list(rest);
        if spec.families.is_empty() {
            return Err(invalid());
        }
        Ok(spec)
    }

    /// True for weights rendered with a bold face (600 and above).
    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }

    pub fn is_italic(&self) -> bool {
        self.style != FontStyle::Normal
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            FontStyle::Normal => {}
            FontStyle::Italic => write!(f, "italic ")?,
            FontStyle::Oblique => write!(f, "oblique ")?,
        }
        if self.small_caps {
            write!(f, "small-caps ")?;
        }
        if self.weight != 400 {
            write!(f, "{} ", self.weight)?;
        }
        write!(f, "{}px", self.size_px)?;
        if let Some(lh) = self.line_height_px {
            write!(f, "/{}px", lh)?;
        }
        let families: Vec<String> = self
            .families
            .iter()
            .map(|family| {
                if family.contains(' ') {
                    format!("\"{}\"", family)
                } else {
                    family.clone()
                }
            })
            .collect();
        write!(f, " {}", families.join(","))
    }
}

/// Parse `12px`, `9pt`, `1.5em/2`, `medium`, ... into (size_px, line_height_px).
fn parse_size_token(token: &str) -> Option<(f64, Option<f64>)> {
    let (size, line_height) = match token.split_once('/') {
        Some((s, lh)) => (s, Some(lh)),
        None => (token, None),
    };
    let size_px = parse_length(size, ROOT_FONT_SIZE_PX).or_else(|| keyword_size(size))?;
    let line_height_px = match line_height {
        None | Some("normal") => None,
        Some(lh) => match lh.parse::<f64>() {
            // Unitless multiplier of the font size
            Ok(m) if m.is_finite() && m >= 0.0 => Some(m * size_px),
            _ => Some(parse_length(lh, size_px)?),
        },
    };
    Some((size_px, line_height_px))
}

/// Parse a CSS length; relative units resolve against `em_px`.
fn parse_length(s: &str, em_px: f64) -> Option<f64> {
    let units: [(&str, f64); 5] = [
        ("px", 1.0),
        ("pt", PX_PER_PT),
        ("rem", ROOT_FONT_SIZE_PX),
        ("em", em_px),
        ("%", em_px / 100.0),
    ];
    units.iter().find_map(|(suffix, factor)| {
        let value = s.strip_suffix(suffix)?.parse::<f64>().ok()?;
        (value.is_finite() && value >= 0.0).then_some(value * factor)
    })
}

fn keyword_size(s: &str) -> Option<f64> {
    Some(match s {
        "xx-small" => 9.0,
        "x-small" => 10.0,
        "small" => 13.0,
        "medium" => 16.0,
        "large" => 18.0,
        "x-large" => 24.0,
        "xx-large" => 32.0,
        _ => return None,
    })
}

fn parse_family_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Line height of a single line of text, as a layout engine computes it.
pub trait LineMetrics {
    /// Height of a `line-height: normal` line box for `font`, in CSS pixels.
    fn normal_line_height(&self, font: &FontSpec) -> Result<f64>;
}

/// Approximates the normal line height as a fixed multiple of the font size.
///
/// Useful when no font files are available; 1.15 is close to what browsers
/// report for common sans-serif faces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioLineMetrics(pub f64);

impl Default for RatioLineMetrics {
    fn default() -> Self {
        Self(1.15)
    }
}

impl LineMetrics for RatioLineMetrics {
    fn normal_line_height(&self, font: &FontSpec) -> Result<f64> {
        Ok(font.size_px * self.0)
    }
}
