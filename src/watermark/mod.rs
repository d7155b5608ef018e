//! Watermark overlays.
//!
//! A [`Watermark`] owns one raster surface and at most one overlay element.
//! Every [`Watermark::render`] runs the whole pipeline synchronously:
//!
//! 1. resolve options against the defaults
//! 2. replace the previous overlay with a fresh one
//! 3. measure the text (surface width, probe-node height)
//! 4. compute the tile geometry
//! 5. paint the tile and mount the overlay with the tile as its background
//!
//! # Example
//!
//! ```no_run
//! use tilemark::dom::MemoryDocument;
//! use tilemark::font::FontBook;
//! use tilemark::surface::GlyphCanvas;
//! use tilemark::{Watermark, WatermarkOptions};
//!
//! # fn main() -> tilemark::Result<()> {
//! let fonts = FontBook::system();
//! let mut document = MemoryDocument::with_line_metrics(fonts.clone());
//! let options = WatermarkOptions::new().text("   CONFIDENTIAL   ").degree(-30.0);
//!
//! let mut watermark = Watermark::create(GlyphCanvas::new(fonts), &mut document, &options)?;
//! watermark.render(&mut document, &options.clone().z_index(10))?;
//! watermark.destroy(&mut document)?;
//! # Ok(())
//! # }
//! ```

pub mod overlay;
pub mod renderer;

pub use overlay::{create_overlay, set_background, OVERLAY_STYLES};
pub use renderer::{paint_tile, RenderedTile};

use crate::config::{resolve, WatermarkConfig, WatermarkOptions};
use crate::dom::{Document, NodeId};
use crate::error::{Result, WatermarkError};
use crate::geometry::compute_tile;
use crate::probe::measure_text;
use crate::surface::RasterSurface;

/// Lifecycle of a [`Watermark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkState {
    Unrendered,
    Rendered,
    /// Terminal; reached through `destroy`
    Disposed,
}

/// A text watermark mounted as a tiled overlay.
#[derive(Debug)]
pub struct Watermark<S: RasterSurface> {
    surface: S,
    state: WatermarkState,
    overlay: Option<NodeId>,
    config: Option<WatermarkConfig>,
    tile: Option<RenderedTile>,
}

impl<S: RasterSurface> Watermark<S> {
    /// Create an unrendered watermark drawing with `surface`.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            state: WatermarkState::Unrendered,
            overlay: None,
            config: None,
            tile: None,
        }
    }

    /// Create a watermark and render it immediately.
    pub fn create<D: Document + ?Sized>(
        surface: S,
        document: &mut D,
        options: &WatermarkOptions,
    ) -> Result<Self> {
        let mut watermark = Self::new(surface);
        watermark.render(document, options)?;
        Ok(watermark)
    }

    /// Render with `options` and (re)mount the overlay.
    ///
    /// The previous overlay, if any, is detached before the new one is
    /// created, so at most one overlay of this watermark is attached at any
    /// time. Errors from the surface or the document are returned unchanged;
    /// after a failure past that point the watermark is `Unrendered` with no
    /// overlay, config or tile.
    pub fn render<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        options: &WatermarkOptions,
    ) -> Result<&RenderedTile> {
        if self.state == WatermarkState::Disposed {
            return Err(WatermarkError::Disposed);
        }

        let config = resolve(options, document.body());

        if let Some(previous) = self.overlay {
            document.remove_node(previous)?;
        }
        // Nothing is mounted until the new overlay is appended
        self.overlay = None;
        self.config = None;
        self.tile = None;
        self.state = WatermarkState::Unrendered;

        let (overlay, tile) = self.mount_overlay(document, &config)?;

        tracing::info!(
            overlay = %overlay,
            target = %config.target,
            tile_width = tile.raster_width,
            tile_height = tile.raster_height,
            degree = config.degree,
            z_index = config.z_index,
            "Mounted watermark overlay"
        );

        self.state = WatermarkState::Rendered;
        self.overlay = Some(overlay);
        self.config = Some(config);
        Ok(self.tile.insert(tile))
    }

    /// Create, paint and append a new overlay; on failure it is released.
    fn mount_overlay<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        config: &WatermarkConfig,
    ) -> Result<(NodeId, RenderedTile)> {
        let overlay = create_overlay(document, config.z_index)?;
        match self.paint_overlay(document, config, overlay) {
            Ok(tile) => Ok((overlay, tile)),
            Err(e) => {
                if let Err(cleanup) = document.remove_node(overlay) {
                    tracing::warn!(overlay = %overlay, error = %cleanup, "Failed to release overlay");
                }
                Err(e)
            }
        }
    }

    fn paint_overlay<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        config: &WatermarkConfig,
        overlay: NodeId,
    ) -> Result<RenderedTile> {
        let metrics = measure_text(&mut self.surface, document, &config.text, &config.font)?;
        let geometry = compute_tile(metrics, config.degree);
        let tile = paint_tile(&mut self.surface, config, metrics, geometry)?;

        set_background(document, overlay, &tile.data_url)?;
        document.append_child(config.target, overlay)?;
        Ok(tile)
    }

    /// Detach the overlay and move to the terminal `Disposed` state.
    ///
    /// Calling `destroy` again is a no-op.
    pub fn destroy<D: Document + ?Sized>(&mut self, document: &mut D) -> Result<()> {
        if let Some(overlay) = self.overlay.take() {
            document.remove_node(overlay)?;
            tracing::info!(overlay = %overlay, "Removed watermark overlay");
        }
        self.state = WatermarkState::Disposed;
        Ok(())
    }

    pub fn state(&self) -> WatermarkState {
        self.state
    }

    /// Overlay node mounted by the last successful render.
    pub fn overlay(&self) -> Option<NodeId> {
        self.overlay
    }

    /// Configuration of the last successful render.
    pub fn config(&self) -> Option<&WatermarkConfig> {
        self.config.as_ref()
    }

    /// Tile of the last successful render.
    pub fn last_tile(&self) -> Option<&RenderedTile> {
        self.tile.as_ref()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}
