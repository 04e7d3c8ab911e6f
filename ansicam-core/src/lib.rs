pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod palette;
pub mod pixel;
pub mod quantize;

pub use error::CoreError;
pub use geometry::{compute_crop, GridSize, Rect};
pub use grid::{compute_delta, quantize_frame, CellGrid, DeltaCell, FrameDiff};
pub use palette::{Palette, XTERM};
pub use pixel::{PixelLayout, Rgb};
pub use quantize::{ColorMode, QuantizeOptions, Quantizer};
