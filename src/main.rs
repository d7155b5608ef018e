use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tilemark::dom::MemoryDocument;
use tilemark::font::FontBook;
use tilemark::logging::{init_subscriber, LogFormat};
use tilemark::surface::GlyphCanvas;
use tilemark::{Watermark, WatermarkOptions};

/// Tilemark - render a rotated text watermark tile and the overlay that repeats it
#[derive(Parser, Debug)]
#[command(name = "tilemark")]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML options file (text, font, fillStyle, degree, zIndex)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watermark text; surrounding spaces widen the tile
    #[arg(short, long)]
    text: Option<String>,

    /// CSS font shorthand, e.g. "bold 14px sans-serif"
    #[arg(short, long)]
    font: Option<String>,

    /// CSS color of the text, e.g. "rgba(0,0,0,0.05)"
    #[arg(long)]
    fill_style: Option<String>,

    /// Rotation in degrees, clockwise positive
    #[arg(short, long, allow_hyphen_values = true)]
    degree: Option<f64>,

    /// Stacking order of the overlay
    #[arg(short, long, allow_hyphen_values = true)]
    z_index: Option<i32>,

    /// Extra directory to search for font files (repeatable)
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Write the tile as a PNG file
    #[arg(long)]
    png: Option<PathBuf>,

    /// Write an HTML page with the mounted overlay
    #[arg(long)]
    html: Option<PathBuf>,

    /// Log output format: pretty or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,
}

impl Args {
    fn options(&self) -> anyhow::Result<WatermarkOptions> {
        let base = match &self.config {
            Some(path) => WatermarkOptions::from_file(path)
                .with_context(|| format!("Failed to load options from {}", path.display()))?,
            None => WatermarkOptions::default(),
        };
        let overrides = WatermarkOptions {
            text: self.text.clone(),
            font: self.font.clone(),
            fill_style: self.fill_style.clone(),
            degree: self.degree,
            z_index: self.z_index,
            dom: None,
        };
        Ok(base.merge(overrides))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_subscriber(args.log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let options = args.options()?;

    let fonts = FontBook::system_with_dirs(args.font_dirs.iter().cloned());
    tracing::debug!(dirs = ?fonts.dirs(), "Font search path");
    let mut document = MemoryDocument::with_line_metrics(fonts.clone());
    let watermark = Watermark::create(GlyphCanvas::new(fonts), &mut document, &options)
        .context("Failed to render watermark")?;

    let (Some(config), Some(tile)) = (watermark.config(), watermark.last_tile()) else {
        anyhow::bail!("Watermark rendered without a tile");
    };

    if let Some(path) = &args.png {
        let png = watermark.surface().png_bytes()?;
        std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote watermark tile");
    }

    if let Some(path) = &args.html {
        std::fs::write(path, document.to_html())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote watermark page");
    }

    let report = serde_json::json!({
        "config": config,
        "tile": tile,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
