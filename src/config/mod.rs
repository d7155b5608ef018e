// Configuration module
//
// Watermark options as supplied by a caller (every field optional) and the
// resolved, immutable configuration the render pipeline consumes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dom::NodeId;
use crate::error::{Result, WatermarkError};

/// Default watermark text; the padding spaces set the gap between repeats.
pub const DEFAULT_TEXT: &str = "          水印          ";

/// Default font: 12px system UI stack with CJK fallbacks.
pub const DEFAULT_FONT: &str = r#"12px -apple-system,BlinkMacSystemFont,"Apple Color Emoji","Segoe UI Emoji","Segoe UI Symbol","Segoe UI","PingFang SC","Hiragino Sans GB","Microsoft YaHei","Helvetica Neue",Helvetica,Arial,sans-serif"#;

/// Default fill: black at 5% opacity.
pub const DEFAULT_FILL_STYLE: &str = "rgba(0,0,0,0.05)";

/// Default rotation in degrees (negative = counter-clockwise).
pub const DEFAULT_DEGREE: f64 = -22.0;

/// Default stacking order of the overlay.
pub const DEFAULT_Z_INDEX: i32 = 9999;

/// Caller-supplied watermark options.
///
/// Field names accept both snake_case and the camelCase spelling of the
/// browser API (`fillStyle`, `zIndex`).
///
/// ```yaml
/// text: "  CONFIDENTIAL  "
/// font: "bold 14px sans-serif"
/// fillStyle: "rgba(200, 0, 0, 0.08)"
/// degree: -30
/// zIndex: 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkOptions {
    /// Watermark text; spaces widen the tile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// CSS `font` shorthand
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    /// CSS color of the text
    #[serde(default, alias = "fillStyle", skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,

    /// Rotation in degrees, clockwise positive
    #[serde(default, alias = "rotation", skip_serializing_if = "Option::is_none")]
    pub degree: Option<f64>,

    /// Overlay `z-index`
    #[serde(default, alias = "zIndex", skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,

    /// Mount point; a document handle, so never read from a file
    #[serde(skip)]
    pub dom: Option<NodeId>,
}

impl WatermarkOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn fill_style(mut self, fill_style: impl Into<String>) -> Self {
        self.fill_style = Some(fill_style.into());
        self
    }

    pub fn degree(mut self, degree: f64) -> Self {
        self.degree = Some(degree);
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn dom(mut self, dom: NodeId) -> Self {
        self.dom = Some(dom);
        self
    }

    /// Layer `overrides` on top of `self`; fields set in `overrides` win.
    pub fn merge(self, overrides: WatermarkOptions) -> Self {
        Self {
            text: overrides.text.or(self.text),
            font: overrides.font.or(self.font),
            fill_style: overrides.fill_style.or(self.fill_style),
            degree: overrides.degree.or(self.degree),
            z_index: overrides.z_index.or(self.z_index),
            dom: overrides.dom.or(self.dom),
        }
    }

    /// Parse YAML options, replacing `${VAR_NAME}` with environment values.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| WatermarkError::Config(e.to_string()))?;

        // First, check that all referenced environment variables exist
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            std::env::var(var_name).map_err(|_| {
                WatermarkError::Config(format!(
                    "Environment variable '{}' is referenced but not set",
                    var_name
                ))
            })?;
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        // An empty document means "all defaults"
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&substituted).map_err(|e| WatermarkError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WatermarkError::Config(format!(
                "Failed to read options file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml_with_env(&yaml)
    }
}

/// Fully resolved watermark configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatermarkConfig {
    pub text: String,
    pub font: String,
    pub fill_style: String,
    pub degree: f64,
    pub z_index: i32,
    #[serde(skip)]
    pub target: NodeId,
}

impl From<&WatermarkConfig> for WatermarkOptions {
    fn from(config: &WatermarkConfig) -> Self {
        Self {
            text: Some(config.text.clone()),
            font: Some(config.font.clone()),
            fill_style: Some(config.fill_style.clone()),
            degree: Some(config.degree),
            z_index: Some(config.z_index),
            dom: Some(config.target),
        }
    }
}

/// Merge caller options with the defaults.
///
/// Pure: `options` is never modified. Empty strings count as unset; numeric
/// fields are kept as given, including `0` and out-of-range values.
/// `default_container` becomes the target when the caller names none,
/// usually `Document::body()`.
pub fn resolve(options: &WatermarkOptions, default_container: NodeId) -> WatermarkConfig {
    fn non_empty(value: &Option<String>, default: &str) -> String {
        match value.as_deref() {
            Some(v) if !v.is_empty() => v.to_string(),
            _ => default.to_string(),
        }
    }

    WatermarkConfig {
        text: non_empty(&options.text, DEFAULT_TEXT),
        font: non_empty(&options.font, DEFAULT_FONT),
        fill_style: non_empty(&options.fill_style, DEFAULT_FILL_STYLE),
        degree: options.degree.unwrap_or(DEFAULT_DEGREE),
        z_index: options.z_index.unwrap_or(DEFAULT_Z_INDEX),
        target: options.dom.unwrap_or(default_container),
    }
}
