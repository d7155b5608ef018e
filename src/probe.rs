//! Text metrics probe.
//!
//! Width comes from the raster surface's own font metrics, so it matches what
//! the tile will paint (padding spaces included). Height comes from the
//! document: a hidden, absolutely positioned `span` with the same font and
//! text is mounted on the body, its rendered height read back, and the span
//! removed again. The span is owned by a guard that removes it on every exit
//! path, so a failing height query never leaves a probe behind.

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::surface::RasterSurface;
use serde::Serialize;

/// Rendered size of the watermark text, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
}

impl TextMetrics {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// A probe node mounted on the document; removed when dropped.
struct ProbeNode<'a, D: Document + ?Sized> {
    document: &'a mut D,
    node: NodeId,
}

impl<'a, D: Document + ?Sized> ProbeNode<'a, D> {
    fn mount(document: &'a mut D, text: &str, font: &str) -> Result<Self> {
        let node = document.create_element("span")?;
        document.set_style(node, "font", font)?;
        document.set_style(node, "position", "absolute")?;
        document.set_style(node, "visibility", "hidden")?;
        let text_node = document.create_text_node(text)?;
        document.append_child(node, text_node)?;

        let body = document.body();
        document.append_child(body, node)?;
        Ok(Self { document, node })
    }

    fn height(&self) -> Result<f64> {
        self.document.computed_height(self.node)
    }
}

impl<D: Document + ?Sized> Drop for ProbeNode<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.document.remove_node(self.node) {
            tracing::warn!(node = %self.node, error = %e, "Failed to remove text probe");
        }
    }
}

/// Measure the height of `text` in `font` with a transient probe node.
///
/// The rendered height is truncated to whole pixels.
pub fn measure_text_height<D: Document + ?Sized>(
    document: &mut D,
    text: &str,
    font: &str,
) -> Result<f64> {
    let probe = ProbeNode::mount(document, text, font)?;
    let height = probe.height()?;
    Ok(if height.is_finite() { height.trunc() } else { 0.0 })
}

/// Measure width and height of `text` rendered in `font`.
pub fn measure_text<S, D>(surface: &mut S, document: &mut D, text: &str, font: &str) -> Result<TextMetrics>
where
    S: RasterSurface + ?Sized,
    D: Document + ?Sized,
{
    surface.set_font(font)?;
    let width = surface.measure_text(text)?;
    let height = measure_text_height(document, text, font)?;

    let metrics = TextMetrics::new(width, height);
    tracing::debug!(width = metrics.width, height = metrics.height, font = font, "Measured watermark text");
    Ok(metrics)
}
