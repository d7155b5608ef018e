//! Tile painting.
//!
//! Sizes the surface to the tile, paints the text centered on the tile origin
//! with the configured rotation, and exports the raster as a data URI.

use crate::color::Color;
use crate::config::WatermarkConfig;
use crate::error::Result;
use crate::geometry::TileGeometry;
use crate::probe::TextMetrics;
use crate::surface::{RasterSurface, TextAlign, TextBaseline};
use serde::Serialize;

/// Output of one render: the measured text, the tile and its image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedTile {
    pub metrics: TextMetrics,
    pub geometry: TileGeometry,
    pub raster_width: u32,
    pub raster_height: u32,
    /// `data:image/png;base64,...`, or `data:,` for an empty tile
    #[serde(skip)]
    pub data_url: String,
}

/// Paint the watermark tile and return it with its data URI.
pub fn paint_tile<S: RasterSurface + ?Sized>(
    surface: &mut S,
    config: &WatermarkConfig,
    metrics: TextMetrics,
    geometry: TileGeometry,
) -> Result<RenderedTile> {
    let (raster_width, raster_height) = geometry.raster_size();

    // Resizing resets all drawing state, so style after it
    surface.resize(raster_width, raster_height)?;
    surface.set_font(&config.font)?;
    match Color::parse(&config.fill_style) {
        Ok(color) => surface.set_fill_style(color),
        // Like a canvas, an unparseable fill style keeps the default
        Err(e) => tracing::warn!(fill_style = %config.fill_style, error = %e, "Ignoring fill style"),
    }
    surface.set_text_baseline(TextBaseline::Middle);
    surface.set_text_align(TextAlign::Center);

    surface.translate(geometry.origin.x, geometry.origin.y);
    surface.rotate(geometry.rotation_radians);
    surface.fill_text(&config.text, 0.0, 0.0)?;

    let data_url = surface.to_data_url()?;
    Ok(RenderedTile {
        metrics,
        geometry,
        raster_width,
        raster_height,
        data_url,
    })
}
