pub mod buffer;
pub mod display;
pub mod driver;
pub mod error;
pub mod flush;
pub mod format;
pub mod pixel;
pub mod render;
pub mod resize;
pub mod source;

pub use error::{Error, Result};
