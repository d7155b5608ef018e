// Error types module

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WatermarkError>;

/// Errors raised while resolving, measuring, painting or mounting a watermark.
///
/// Geometry is total and never produces an error. Everything else comes from
/// a collaborator (font files, the raster surface, the document) and is
/// propagated to the caller of `Watermark::render` unchanged.
#[derive(Error, Debug)]
pub enum WatermarkError {
    /// No usable font could be loaded for a font specification
    #[error("Font error: {0}")]
    Font(String),

    /// The raster surface failed to paint
    #[error("Failed to render watermark tile: {0}")]
    Render(String),

    /// The painted tile could not be exported as an image
    #[error("Failed to encode watermark tile: {0}")]
    Encode(String),

    /// A document operation failed (unknown node, detached node, ...)
    #[error("Document error: {0}")]
    Dom(String),

    /// Options could not be loaded (invalid YAML, missing env vars, ...)
    #[error("Watermark configuration error: {0}")]
    Config(String),

    /// `render` was called after `destroy`
    #[error("Watermark has been destroyed")]
    Disposed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
