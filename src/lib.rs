// Tilemark: tiled text watermark overlays
//
// Pipeline per render: config (resolve options) -> probe (measure text)
// -> geometry (tile size) -> watermark (paint + mount).

pub mod color;
pub mod config;
pub mod dom;
pub mod error;
pub mod font;
pub mod geometry;
pub mod logging;
pub mod probe;
pub mod surface;
pub mod watermark;

pub use config::{resolve, WatermarkConfig, WatermarkOptions};
pub use error::{Result, WatermarkError};
pub use geometry::{compute_tile, TileGeometry};
pub use probe::TextMetrics;
pub use watermark::{RenderedTile, Watermark, WatermarkState};
