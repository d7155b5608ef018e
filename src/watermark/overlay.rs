//! Overlay element carrying the tiled watermark.

use crate::dom::{Document, NodeId};
use crate::error::Result;

/// Fixed styles of every overlay: full viewport, click-through, repeating.
pub const OVERLAY_STYLES: [(&str, &str); 7] = [
    ("position", "fixed"),
    ("top", "0"),
    ("right", "0"),
    ("bottom", "0"),
    ("left", "0"),
    ("pointer-events", "none"),
    ("background-repeat", "repeat"),
];

/// Create a detached overlay `div` at the given stacking order.
pub fn create_overlay<D: Document + ?Sized>(document: &mut D, z_index: i32) -> Result<NodeId> {
    let overlay = document.create_element("div")?;
    for (property, value) in OVERLAY_STYLES {
        document.set_style(overlay, property, value)?;
    }
    document.set_style(overlay, "z-index", &z_index.to_string())?;
    Ok(overlay)
}

/// Use `data_url` as the repeating background image of `overlay`.
pub fn set_background<D: Document + ?Sized>(
    document: &mut D,
    overlay: NodeId,
    data_url: &str,
) -> Result<()> {
    document.set_style(overlay, "background-image", &format!("url({})", data_url))
}
