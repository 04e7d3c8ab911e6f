use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::quantize::{
    ColorMode, QuantizeOptions, DEFAULT_GREY_LEVELS, DEFAULT_SATURATION_THRESHOLD, MIN_GREY_LEVELS,
};

/// Viewer configuration, loadable from TOML. Every key is optional.
///
/// ```
/// use ansicam_core::config::Config;
/// let config = Config::from_toml_str("[render]\nmirror = false\n").unwrap();
/// assert!(!config.render.mirror);
/// assert_eq!(config.render.saturation_threshold, 64);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub capture: CaptureConfig,
    pub render: RenderConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Camera device, file path or URL handed to ffmpeg.
    pub input: String,
    /// ffmpeg input format (`v4l2`, `avfoundation`, `dshow`...). Guessed when unset.
    pub format: Option<String>,
    /// Requested capture size. Only applied to camera devices.
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            input: default_input().to_string(),
            format: None,
            width: 800,
            height: 600,
            fps: 30,
        }
    }
}

fn default_input() -> &'static str {
    if cfg!(target_os = "macos") {
        "0"
    } else {
        "/dev/video0"
    }
}

/// Input formats that name a capture device rather than a container.
pub const DEVICE_FORMATS: &[&str] = &["v4l2", "video4linux2", "avfoundation", "dshow"];

impl CaptureConfig {
    /// The ffmpeg input format to use, if any.
    pub fn input_format(&self) -> Option<&str> {
        if let Some(format) = self.format.as_deref() {
            return Some(format);
        }
        if self.input.starts_with("/dev/video") {
            Some("v4l2")
        } else if cfg!(target_os = "macos") && !self.input.is_empty() && self.input.bytes().all(|c| c.is_ascii_digit()) {
            Some("avfoundation")
        } else {
            None
        }
    }

    pub fn is_device(&self) -> bool {
        self.input_format().is_some_and(|f| DEVICE_FORMATS.contains(&f))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    #[default]
    Lanczos3,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub saturation_threshold: u8,
    /// Grey-ramp levels used in grey mode, 2..=26.
    pub grey_levels: u8,
    /// Width:height of one terminal character cell.
    pub cell_aspect: f64,
    pub mirror: bool,
    pub mode: ColorMode,
    /// Draw each cell two columns wide.
    pub wide: bool,
    /// Draw brightness glyphs in the cell color instead of colored blanks.
    pub ascii: bool,
    pub filter: ResizeFilter,
    pub snapshot_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
            grey_levels: DEFAULT_GREY_LEVELS,
            cell_aspect: 0.5,
            mirror: true,
            mode: ColorMode::Color,
            wide: false,
            ascii: false,
            filter: ResizeFilter::Lanczos3,
            snapshot_dir: PathBuf::from("."),
        }
    }
}

impl RenderConfig {
    pub fn quantize_options(&self) -> QuantizeOptions {
        QuantizeOptions {
            saturation_threshold: self.saturation_threshold,
            grey_levels: self.grey_levels,
            mode: self.mode,
        }
    }

    /// Aspect of one grid cell as drawn, accounting for wide cells.
    pub fn drawn_cell_aspect(&self) -> f64 {
        if self.wide {
            self.cell_aspect * 2.0
        } else {
            self.cell_aspect
        }
    }
}

impl Config {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded config from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the geometry and capture code cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        let capture = &self.capture;
        if capture.input.is_empty() {
            return Err(CoreError::Config("capture.input is empty".into()));
        }
        if capture.width == 0 || capture.height == 0 {
            return Err(CoreError::InvalidDimensions {
                width: capture.width,
                height: capture.height,
            });
        }
        if capture.fps == 0 {
            return Err(CoreError::Config("capture.fps must be positive".into()));
        }

        let render = &self.render;
        if !(render.cell_aspect.is_finite() && render.cell_aspect > 0.0) {
            return Err(CoreError::Config(format!(
                "render.cell_aspect must be a positive number, got {}",
                render.cell_aspect
            )));
        }
        if !(MIN_GREY_LEVELS..=DEFAULT_GREY_LEVELS).contains(&render.grey_levels) {
            return Err(CoreError::Config(format!(
                "render.grey_levels must be within {MIN_GREY_LEVELS}..={DEFAULT_GREY_LEVELS}, got {}",
                render.grey_levels
            )));
        }
        Ok(())
    }
}
