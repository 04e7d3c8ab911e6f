use anyhow::Context;
use ansicam_core::config::ResizeFilter;
use ansicam_core::geometry::{compute_crop, GridSize, Rect};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};

use crate::capture::VideoFrame;

/// Crops each frame to the grid's on-screen aspect and resamples it to one
/// RGB24 sample per cell.
pub struct FrameResizer {
    resizer: Resizer,
    alg: ResizeAlg,
    grid: GridSize,
    crop: Rect,
    /// (source width, source height, grid, cell aspect bits) the crop was computed for.
    key: Option<(u32, u32, GridSize, u64)>,
}

impl FrameResizer {
    pub fn new(filter: ResizeFilter) -> Self {
        let alg = match filter {
            ResizeFilter::Nearest => ResizeAlg::Nearest,
            ResizeFilter::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
            ResizeFilter::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
        };
        Self {
            resizer: Resizer::new(),
            alg,
            grid: GridSize::new(1, 1),
            crop: Rect::default(),
            key: None,
        }
    }

    /// Recompute the crop if the source, grid or cell aspect changed.
    /// Returns true when it did.
    pub fn configure(&mut self, source_width: u32, source_height: u32, grid: GridSize, cell_aspect: f64) -> bool {
        let key = (source_width, source_height, grid, cell_aspect.to_bits());
        if self.key == Some(key) {
            return false;
        }
        self.crop = compute_crop(source_width, source_height, grid, cell_aspect);
        self.grid = grid;
        self.key = Some(key);
        log::info!(
            "source {source_width}x{source_height} -> grid {}x{}, crop {}x{} at ({}, {})",
            grid.cols,
            grid.rows,
            self.crop.width,
            self.crop.height,
            self.crop.x,
            self.crop.y
        );
        true
    }

    #[cfg(test)]
    pub fn crop(&self) -> Rect {
        self.crop
    }

    /// Crop and resample `frame` to the configured grid. Returns RGB24 data.
    pub fn resize(&mut self, frame: VideoFrame) -> anyhow::Result<Vec<u8>> {
        let target_width = u32::from(self.grid.cols);
        let target_height = u32::from(self.grid.rows);
        if self.crop == Rect::full(frame.width, frame.height)
            && frame.width == target_width
            && frame.height == target_height
        {
            return Ok(frame.data);
        }

        let src_image = Image::from_vec_u8(frame.width, frame.height, frame.data, PixelType::U8x3)
            .context("failed to create source image")?;
        let mut dst_image = Image::new(target_width, target_height, PixelType::U8x3);

        let options = ResizeOptions::new().resize_alg(self.alg).crop(
            f64::from(self.crop.x),
            f64::from(self.crop.y),
            f64::from(self.crop.width),
            f64::from(self.crop.height),
        );
        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .context("resize failed")?;

        Ok(dst_image.into_vec())
    }
}
