use thiserror::Error;

use crate::format::Size;

/// Errors raised by the rendering core.
#[derive(Error, Debug)]
pub enum Error {
    /// The operation is not defined for this kind of image.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// A bounded accessor was called with coordinates outside the image.
    #[error("texel ({x}, {y}) is outside a {}x{} image", size.width, size.height)]
    OutOfBounds { x: u32, y: u32, size: Size },

    /// Image data does not match its declared size.
    #[error("image buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    /// Resampling needs at least one source texel.
    #[error("cannot resample an empty {}x{} image", .0.width, .0.height)]
    EmptySource(Size),

    /// The frame source could not produce a frame.
    #[error("frame source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
