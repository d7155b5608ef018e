//! Font discovery and loading.
//!
//! A [`FontBook`] maps the family list of a [`FontSpec`] to a loaded
//! [`FontArc`]. Resolution order for every family in the list:
//!
//! 1. Fonts registered explicitly with [`FontBook::register_file`]
//! 2. Well-known file names for the family (generic families such as
//!    `sans-serif` or `system-ui` map to common system fonts)
//! 3. File names synthesized from the family name
//!
//! If no family matches, the generic `sans-serif` candidates are tried and
//! finally any parseable font file found in the search directories.
//! Results (including misses) are cached per family, weight and style.

use super::{FontSpec, LineMetrics};
use crate::error::{Result, WatermarkError};
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use walkdir::WalkDir;

/// Environment variable holding extra font directories (path-list syntax).
pub const FONT_DIR_ENV: &str = "TILEMARK_FONT_DIR";

/// Maximum directory depth scanned below each font directory.
const MAX_SCAN_DEPTH: usize = 6;

const FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

/// Shared, cloneable font resolver.
#[derive(Clone)]
pub struct FontBook {
    inner: Arc<Inner>,
}

struct Inner {
    dirs: Vec<PathBuf>,
    /// Lower-cased file name -> path, built lazily on first lookup
    index: OnceLock<HashMap<String, PathBuf>>,
    registered: Mutex<HashMap<String, FontArc>>,
    cache: Mutex<HashMap<String, Option<FontArc>>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("dirs", &self.inner.dirs)
            .field("registered", &self.inner.registered.lock().len())
            .field("cached", &self.inner.cache.lock().len())
            .finish()
    }
}

impl FontBook {
    /// Create a book searching only the given directories.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                dirs,
                index: OnceLock::new(),
                registered: Mutex::new(HashMap::new()),
                cache: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Create a book searching the platform font directories, `$TILEMARK_FONT_DIR`
    /// and `extra_dirs`.
    pub fn system_with_dirs(extra_dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut dirs = system_font_dirs();
        dirs.extend(extra_dirs);
        Self::new(dirs)
    }

    pub fn system() -> Self {
        Self::system_with_dirs(std::iter::empty())
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.inner.dirs
    }

    /// Register a font file under a family name.
    ///
    /// Registered fonts take precedence over anything found on disk and match
    /// every weight and style of the family.
    pub fn register_file(&self, family: &str, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            WatermarkError::Font(format!("Failed to parse '{}': {}", path.display(), e))
        })?;
        self.register_font(family, font);
        Ok(())
    }

    /// Register an already-loaded font under a family name.
    pub fn register_font(&self, family: &str, font: FontArc) {
        self.inner
            .registered
            .lock()
            .insert(normalize_family(family), font);
        // Misses cached before the registration are stale now
        self.inner.cache.lock().retain(|_, hit| hit.is_some());
    }

    /// Resolve the first loadable family of `spec`.
    pub fn resolve(&self, spec: &FontSpec) -> Result<FontArc> {
        for family in &spec.families {
            if let Some(font) = self.resolve_family(family, spec.is_bold(), spec.is_italic()) {
                return Ok(font);
            }
        }

        if let Some(font) = self.resolve_family("sans-serif", spec.is_bold(), spec.is_italic()) {
            tracing::debug!(font = %spec, "No listed family available, using sans-serif fallback");
            return Ok(font);
        }

        self.any_font().ok_or_else(|| {
            WatermarkError::Font(format!(
                "No usable font found for '{}' (searched {} directories)",
                spec,
                self.inner.dirs.len()
            ))
        })
    }

    fn resolve_family(&self, family: &str, bold: bool, italic: bool) -> Option<FontArc> {
        let family_key = normalize_family(family);
        if let Some(font) = self.inner.registered.lock().get(&family_key) {
            return Some(font.clone());
        }

        let key = format!("{}|{}|{}", family_key, bold, italic);
        if let Some(entry) = self.inner.cache.lock().get(&key) {
            return entry.clone();
        }

        let loaded = font_file_candidates(family, bold, italic)
            .iter()
            .find_map(|name| self.load_indexed(name));
        if loaded.is_some() {
            tracing::debug!(family = family, bold = bold, italic = italic, "Resolved font family");
        }
        self.inner.cache.lock().insert(key, loaded.clone());
        loaded
    }

    fn any_font(&self) -> Option<FontArc> {
        let key = "*".to_string();
        if let Some(entry) = self.inner.cache.lock().get(&key) {
            return entry.clone();
        }
        let mut names: Vec<&String> = self.index().keys().collect();
        names.sort();
        let loaded = names.into_iter().find_map(|name| self.load_indexed(name));
        if loaded.is_some() {
            tracing::warn!("Falling back to the first usable font file");
        }
        self.inner.cache.lock().insert(key, loaded.clone());
        loaded
    }

    fn load_indexed(&self, file_name: &str) -> Option<FontArc> {
        let path = self.index().get(&file_name.to_ascii_lowercase())?;
        let bytes = std::fs::read(path).ok()?;
        match FontArc::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping unparseable font file");
                None
            }
        }
    }

    fn index(&self) -> &HashMap<String, PathBuf> {
        self.inner
            .index
            .get_or_init(|| build_index(&self.inner.dirs))
    }
}

impl LineMetrics for FontBook {
    fn normal_line_height(&self, spec: &FontSpec) -> Result<f64> {
        let font = self.resolve(spec)?;
        let scaled = font.as_scaled(css_px_scale(&font, spec.size_px));
        let height = scaled.ascent() - scaled.descent() + scaled.line_gap();
        Ok(height as f64)
    }
}

/// Convert a CSS em size in pixels to the `ab_glyph` scale for `font`.
///
/// `PxScale` is the ascent-to-descent height, not the em size, so the em size
/// has to be stretched by `height / units_per_em`.
pub fn css_px_scale(font: &FontArc, size_px: f64) -> PxScale {
    let size = size_px as f32;
    match font.units_per_em() {
        Some(upem) if upem > 0.0 => PxScale::from(size * font.height_unscaled() / upem),
        _ => PxScale::from(size),
    }
}

fn build_index(dirs: &[PathBuf]) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    for dir in dirs {
        let entries = WalkDir::new(dir)
            .follow_links(true)
            .max_depth(MAX_SCAN_DEPTH)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file());
        for entry in entries {
            let is_font = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FONT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if !is_font {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
            index.entry(name).or_insert_with(|| entry.path().to_path_buf());
        }
    }
    tracing::debug!(files = index.len(), dirs = dirs.len(), "Indexed font directories");
    index
}

/// Platform font directories plus `$TILEMARK_FONT_DIR`.
pub fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    if let Ok(extra) = std::env::var(FONT_DIR_ENV) {
        dirs.extend(std::env::split_paths(&extra).filter(|p| !p.as_os_str().is_empty()));
    }

    dirs
}

fn normalize_family(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// File names to try for a family, best match first.
fn font_file_candidates(family: &str, bold: bool, italic: bool) -> Vec<String> {
    let known: &[(&str, &str, &str, &str)] = match normalize_family(family).as_str() {
        "sansserif" | "systemui" | "uisansserif" | "applesystem" | "blinkmacsystemfont"
        | "segoeui" => &[
            ("segoeui.ttf", "segoeuib.ttf", "segoeuii.ttf", "segoeuiz.ttf"),
            ("SFNS.ttf", "SFNS.ttf", "SFNSItalic.ttf", "SFNSItalic.ttf"),
            ("DejaVuSans.ttf", "DejaVuSans-Bold.ttf", "DejaVuSans-Oblique.ttf", "DejaVuSans-BoldOblique.ttf"),
            ("NotoSans-Regular.ttf", "NotoSans-Bold.ttf", "NotoSans-Italic.ttf", "NotoSans-BoldItalic.ttf"),
            ("LiberationSans-Regular.ttf", "LiberationSans-Bold.ttf", "LiberationSans-Italic.ttf", "LiberationSans-BoldItalic.ttf"),
            ("arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"),
        ],
        "arial" | "helvetica" | "helveticaneue" => &[
            ("arial.ttf", "arialbd.ttf", "ariali.ttf", "arialbi.ttf"),
            ("Helvetica.ttc", "Helvetica.ttc", "Helvetica.ttc", "Helvetica.ttc"),
            ("HelveticaNeue.ttc", "HelveticaNeue.ttc", "HelveticaNeue.ttc", "HelveticaNeue.ttc"),
            ("LiberationSans-Regular.ttf", "LiberationSans-Bold.ttf", "LiberationSans-Italic.ttf", "LiberationSans-BoldItalic.ttf"),
        ],
        "serif" | "timesnewroman" | "times" => &[
            ("times.ttf", "timesbd.ttf", "timesi.ttf", "timesbi.ttf"),
            ("DejaVuSerif.ttf", "DejaVuSerif-Bold.ttf", "DejaVuSerif-Italic.ttf", "DejaVuSerif-BoldItalic.ttf"),
            ("LiberationSerif-Regular.ttf", "LiberationSerif-Bold.ttf", "LiberationSerif-Italic.ttf", "LiberationSerif-BoldItalic.ttf"),
            ("NotoSerif-Regular.ttf", "NotoSerif-Bold.ttf", "NotoSerif-Italic.ttf", "NotoSerif-BoldItalic.ttf"),
        ],
        "monospace" | "couriernew" | "courier" => &[
            ("cour.ttf", "courbd.ttf", "couri.ttf", "courbi.ttf"),
            ("DejaVuSansMono.ttf", "DejaVuSansMono-Bold.ttf", "DejaVuSansMono-Oblique.ttf", "DejaVuSansMono-BoldOblique.ttf"),
            ("LiberationMono-Regular.ttf", "LiberationMono-Bold.ttf", "LiberationMono-Italic.ttf", "LiberationMono-BoldItalic.ttf"),
        ],
        "pingfangsc" | "hiraginosansgb" | "microsoftyahei" => &[
            ("msyh.ttc", "msyhbd.ttc", "msyh.ttc", "msyhbd.ttc"),
            ("PingFang.ttc", "PingFang.ttc", "PingFang.ttc", "PingFang.ttc"),
            ("NotoSansCJK-Regular.ttc", "NotoSansCJK-Bold.ttc", "NotoSansCJK-Regular.ttc", "NotoSansCJK-Bold.ttc"),
            ("NotoSansSC-Regular.otf", "NotoSansSC-Bold.otf", "NotoSansSC-Regular.otf", "NotoSansSC-Bold.otf"),
            ("wqy-microhei.ttc", "wqy-microhei.ttc", "wqy-microhei.ttc", "wqy-microhei.ttc"),
        ],
        _ => &[],
    };

    let mut out: Vec<String> = known
        .iter()
        .map(|(regular, b, i, bi)| {
            let name = match (bold, italic) {
                (false, false) => regular,
                (true, false) => b,
                (false, true) => i,
                (true, true) => bi,
            };
            name.to_string()
        })
        .collect();

    // Synthesized names, e.g. "Open Sans" -> OpenSans-Bold.ttf, OpenSans.ttf
    let compact: String = family.chars().filter(|c| !c.is_whitespace()).collect();
    if !compact.is_empty() && !compact.starts_with('-') {
        let suffix = match (bold, italic) {
            (false, false) => "Regular",
            (true, false) => "Bold",
            (false, true) => "Italic",
            (true, true) => "BoldItalic",
        };
        for ext in ["ttf", "otf"] {
            out.push(format!("{}-{}.{}", compact, suffix, ext));
            out.push(format!("{}.{}", compact, ext));
        }
    }

    // Fall back to the regular face when the styled one is missing
    if bold || italic {
        for name in font_file_candidates(family, false, false) {
            if !out.contains(&name) {
                out.push(name);
            }
        }
    }
    out
}
