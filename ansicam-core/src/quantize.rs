//! Pixel to palette-index mapping.
//!
//! Near-grey pixels go to the 26-step grey ramp, which resolves brightness
//! far more finely than the six cube stops. Everything else snaps to the
//! color cube one axis at a time.

use serde::{Deserialize, Serialize};

use crate::palette::{Palette, GREY_RAMP_LEN};
use crate::pixel::Rgb;

/// Pixels at or below this saturation render through the grey ramp.
pub const DEFAULT_SATURATION_THRESHOLD: u8 = 64;
pub const DEFAULT_GREY_LEVELS: u8 = GREY_RAMP_LEN as u8;
pub const MIN_GREY_LEVELS: u8 = 2;

/// Perceptual brightness with ITU-R BT.709 weights, truncated.
///
/// Weights are scaled to integers so whole-number results are exact.
pub fn luma(px: Rgb) -> u8 {
    let y = 2126 * u32::from(px.r) + 7152 * u32::from(px.g) + 722 * u32::from(px.b);
    (y / 10_000) as u8
}

/// `(max - min) * 255 / max`; pure black counts as unsaturated.
pub fn saturation(px: Rgb) -> u8 {
    let max = px.max_channel();
    if max == 0 {
        return 0;
    }
    let spread = u16::from(max - px.min_channel());
    (spread * 255 / u16::from(max)) as u8
}

/// Map an 8-bit grey onto `levels` evenly spaced entries of the grey ramp.
///
/// `levels` is clamped to `2..=26`. A coarser level count still spans the
/// whole ramp from black to white rather than stopping partway.
pub fn quantize_grey(palette: &Palette, luma8: u8, levels: u8) -> u8 {
    let levels = levels.clamp(MIN_GREY_LEVELS, DEFAULT_GREY_LEVELS);
    let scaled = match levels {
        16 => luma8 >> 4,
        8 => luma8 >> 5,
        4 => luma8 >> 6,
        2 => luma8 >> 7,
        _ => (u16::from(luma8) * u16::from(levels) / 256) as u8,
    };

    let ramp = palette.grey_ramp();
    if levels == DEFAULT_GREY_LEVELS {
        return ramp[usize::from(scaled)];
    }
    let idx = usize::from(scaled) * (ramp.len() - 1) / usize::from(levels - 1);
    ramp[idx]
}

/// Cube coordinate of one channel: the number of axis midpoints at or
/// below it, i.e. the nearer of the two bracketing stops. A value exactly
/// on a midpoint takes the higher stop.
pub fn cube_coordinate(palette: &Palette, channel: u8) -> u8 {
    let doubled = 2 * u16::from(channel);
    palette.midpoint_sums().partition_point(|&m| m <= doubled) as u8
}

/// Map a pixel to the grey ramp or the color cube.
///
/// Each axis is snapped independently, which is not a true nearest-color
/// search in 3D but never leaves the cube.
pub fn quantize_color(palette: &Palette, px: Rgb, saturation_threshold: u8) -> u8 {
    if saturation(px) <= saturation_threshold {
        return quantize_grey(palette, luma(px), DEFAULT_GREY_LEVELS);
    }
    Palette::cube_index(
        cube_coordinate(palette, px.r),
        cube_coordinate(palette, px.g),
        cube_coordinate(palette, px.b),
    )
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Saturated pixels use the cube, the rest the grey ramp.
    #[default]
    Color,
    /// Every pixel goes through the grey ramp.
    Grey,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuantizeOptions {
    pub saturation_threshold: u8,
    /// Used in [`ColorMode::Grey`] only; the color path always uses the full ramp.
    pub grey_levels: u8,
    pub mode: ColorMode,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            saturation_threshold: DEFAULT_SATURATION_THRESHOLD,
            grey_levels: DEFAULT_GREY_LEVELS,
            mode: ColorMode::Color,
        }
    }
}

/// A palette paired with the current tunables.
#[derive(Clone, Copy, Debug)]
pub struct Quantizer<'p> {
    palette: &'p Palette,
    options: QuantizeOptions,
}

impl<'p> Quantizer<'p> {
    pub fn new(palette: &'p Palette, options: QuantizeOptions) -> Self {
        Self { palette, options }
    }

    pub fn options(&self) -> QuantizeOptions {
        self.options
    }

    #[inline]
    pub fn quantize(&self, px: Rgb) -> u8 {
        match self.options.mode {
            ColorMode::Color => quantize_color(self.palette, px, self.options.saturation_threshold),
            ColorMode::Grey => quantize_grey(self.palette, luma(px), self.options.grey_levels),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::{CUBE_BASE, CUBE_LEVELS, XTERM};

    #[test]
    fn luma_extremes() {
        assert_eq!(luma(Rgb::new(0, 0, 0)), 0);
        assert_eq!(luma(Rgb::new(255, 255, 255)), 255);
        // green dominates
        assert!(luma(Rgb::new(0, 255, 0)) > luma(Rgb::new(255, 0, 0)));
        assert_eq!(luma(Rgb::new(0, 0, 255)), 18);
    }

    #[test]
    fn whole_number_luma_is_not_truncated_down() {
        // 0.7152 * 28 + 0.0722 * 152 = 31 exactly
        assert_eq!(luma(Rgb::new(0, 28, 152)), 31);
        assert_eq!(luma(Rgb::new(0, 136, 24)), 99);
        assert_eq!(luma(Rgb::new(1, 110, 57)), 83);
    }

    #[test]
    fn saturation_values() {
        assert_eq!(saturation(Rgb::new(0, 0, 0)), 0);
        assert_eq!(saturation(Rgb::new(90, 90, 90)), 0);
        assert_eq!(saturation(Rgb::new(255, 0, 0)), 255);
        assert_eq!(saturation(Rgb::new(200, 100, 100)), 127);
    }

    #[test]
    fn grey_full_ramp_endpoints() {
        assert_eq!(quantize_grey(&XTERM, 0, 26), 16);
        assert_eq!(quantize_grey(&XTERM, 9, 26), 16);
        assert_eq!(quantize_grey(&XTERM, 10, 26), 232);
        assert_eq!(quantize_grey(&XTERM, 255, 26), 231);
    }

    #[test]
    fn grey_shift_matches_division() {
        let ramp = XTERM.grey_ramp();
        for levels in [2u8, 4, 8, 16] {
            for l in 0..=255u8 {
                let scaled = usize::from(l) * usize::from(levels) / 256;
                let expected = ramp[scaled * 25 / usize::from(levels - 1)];
                assert_eq!(quantize_grey(&XTERM, l, levels), expected, "luma {l}, levels {levels}");
            }
        }
        assert_eq!(quantize_grey(&XTERM, 200, 16), 251);
    }

    #[test]
    fn grey_levels_are_clamped() {
        for l in [0u8, 77, 128, 255] {
            assert_eq!(quantize_grey(&XTERM, l, 0), quantize_grey(&XTERM, l, 2));
            assert_eq!(quantize_grey(&XTERM, l, 200), quantize_grey(&XTERM, l, 26));
        }
    }

    #[test]
    fn coarse_ramp_spans_black_to_white() {
        assert_eq!(quantize_grey(&XTERM, 0, 2), 16);
        assert_eq!(quantize_grey(&XTERM, 255, 2), 231);
        assert_eq!(quantize_grey(&XTERM, 255, 10), 231);
    }

    #[test]
    fn midpoint_ties_take_higher_stop() {
        assert_eq!(cube_coordinate(&XTERM, 47), 0);
        assert_eq!(cube_coordinate(&XTERM, 48), 1);
        assert_eq!(cube_coordinate(&XTERM, 114), 1);
        assert_eq!(cube_coordinate(&XTERM, 115), 2);
        assert_eq!(cube_coordinate(&XTERM, 235), 5);
        for (i, &stop) in CUBE_LEVELS.iter().enumerate() {
            assert_eq!(usize::from(cube_coordinate(&XTERM, stop)), i);
        }
    }

    #[test]
    fn cube_coordinate_picks_nearest_stop() {
        for channel in 0..=255u8 {
            let v = i32::from(channel);
            let nearest = (0..CUBE_LEVELS.len())
                .rev()
                .min_by_key(|&i| (v - i32::from(CUBE_LEVELS[i])).abs())
                .unwrap();
            assert_eq!(usize::from(cube_coordinate(&XTERM, channel)), nearest, "channel {channel}");
        }
        assert_eq!(quantize_color(&XTERM, Rgb::new(47, 0, 200), DEFAULT_SATURATION_THRESHOLD), 20);
    }

    #[test]
    fn pure_red_is_cube_red() {
        let idx = quantize_color(&XTERM, Rgb::new(255, 0, 0), DEFAULT_SATURATION_THRESHOLD);
        assert_eq!(idx, 16 + 5 * 36);
    }

    #[test]
    fn cube_colors_quantize_to_themselves() {
        for idx in CUBE_BASE..=231 {
            let px = XTERM.rgb(idx);
            if px.r == px.g && px.g == px.b {
                continue;
            }
            assert_eq!(quantize_color(&XTERM, px, 0), idx, "{px}");
        }
    }

    #[test]
    fn greys_always_use_ramp() {
        let ramp = XTERM.grey_ramp();
        for v in 0..=255u8 {
            let idx = quantize_color(&XTERM, Rgb::new(v, v, v), 0);
            assert!(ramp.contains(&idx), "grey {v} mapped to {idx}");
        }
    }

    #[test]
    fn results_stay_in_palette_sections() {
        let ramp = XTERM.grey_ramp();
        for r in (0..=255u8).step_by(15) {
            for g in (0..=255u8).step_by(15) {
                for b in (0..=255u8).step_by(15) {
                    let px = Rgb::new(r, g, b);
                    let idx = quantize_color(&XTERM, px, DEFAULT_SATURATION_THRESHOLD);
                    if saturation(px) > DEFAULT_SATURATION_THRESHOLD {
                        assert!((16..=231).contains(&idx), "{px} -> {idx}");
                    } else {
                        assert!(ramp.contains(&idx), "{px} -> {idx}");
                    }
                }
            }
        }
    }

    #[test]
    fn threshold_moves_boundary() {
        // saturation 127
        let px = Rgb::new(200, 100, 100);
        assert!((16..=231).contains(&quantize_color(&XTERM, px, 64)));
        assert!(XTERM.grey_ramp().contains(&quantize_color(&XTERM, px, 127)));
    }

    #[test]
    fn grey_mode_ignores_hue() {
        let q = Quantizer::new(
            &XTERM,
            QuantizeOptions { mode: ColorMode::Grey, grey_levels: 4, ..Default::default() },
        );
        let red = q.quantize(Rgb::new(255, 0, 0));
        assert_eq!(red, quantize_grey(&XTERM, luma(Rgb::new(255, 0, 0)), 4));
        assert!(XTERM.grey_ramp().contains(&red));
    }
}
