use std::path::PathBuf;

use thiserror::Error;

/// Errors from the fallible parts of the core: configuration, frame
/// buffers, and color parsing. Quantization and geometry never fail.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A sample buffer does not match its declared grid size.
    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("invalid hex color {0:?}, expected #rrggbb")]
    InvalidHex(String),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
