use crate::pixel::Rgb;

/// First index of the 6×6×6 color cube (also cube black).
pub const CUBE_BASE: u8 = 16;
/// Last index of the color cube (cube white).
pub const CUBE_WHITE: u8 = 231;
/// First index of the 24-step grey ramp.
pub const GREY_BASE: u8 = 232;

/// Intensity stops shared by the three cube axes.
pub const CUBE_LEVELS: [u8; 6] = [0x00, 0x5f, 0x87, 0xaf, 0xd7, 0xff];

/// Black, the 24 ramp greys, white.
pub const GREY_RAMP_LEN: usize = 26;

/// xterm defaults for the 16 basic colors. Terminals are free to redefine these.
const BASIC_COLORS: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(205, 0, 0),
    Rgb::new(0, 205, 0),
    Rgb::new(205, 205, 0),
    Rgb::new(0, 0, 238),
    Rgb::new(205, 0, 205),
    Rgb::new(0, 205, 205),
    Rgb::new(229, 229, 229),
    Rgb::new(127, 127, 127),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(92, 92, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

/// Lookup tables for the xterm 256-color palette.
///
/// Built once and only ever read afterwards, so a single instance can be
/// shared by reference across threads. Use [`XTERM`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    /// Sum of each adjacent pair of [`CUBE_LEVELS`], i.e. twice the midpoint.
    /// Doubled so the odd-sum first pair keeps its half step.
    midpoint_sums: [u16; 5],
    /// Palette indices ordered dark to light.
    grey_ramp: [u8; GREY_RAMP_LEN],
}

/// The standard palette tables.
pub static XTERM: Palette = Palette::new();

impl Palette {
    pub const fn new() -> Self {
        let mut midpoint_sums = [0u16; 5];
        let mut i = 0;
        while i < midpoint_sums.len() {
            midpoint_sums[i] = CUBE_LEVELS[i] as u16 + CUBE_LEVELS[i + 1] as u16;
            i += 1;
        }

        let mut grey_ramp = [0u8; GREY_RAMP_LEN];
        grey_ramp[0] = CUBE_BASE;
        let mut i = 0;
        while i < 24 {
            grey_ramp[i + 1] = GREY_BASE + i as u8;
            i += 1;
        }
        grey_ramp[GREY_RAMP_LEN - 1] = CUBE_WHITE;

        Self { midpoint_sums, grey_ramp }
    }

    pub fn midpoint_sums(&self) -> &[u16; 5] {
        &self.midpoint_sums
    }

    pub fn grey_ramp(&self) -> &[u8; GREY_RAMP_LEN] {
        &self.grey_ramp
    }

    /// Palette index of the cube cell at per-axis coordinates in `0..6`.
    pub fn cube_index(r: u8, g: u8, b: u8) -> u8 {
        debug_assert!(r < 6 && g < 6 && b < 6, "cube coordinate out of range");
        CUBE_BASE + r * 36 + g * 6 + b
    }

    /// Nominal RGB value the default xterm palette assigns to `index`.
    pub fn rgb(&self, index: u8) -> Rgb {
        match index {
            0..=15 => BASIC_COLORS[usize::from(index)],
            CUBE_BASE..=CUBE_WHITE => {
                let n = usize::from(index - CUBE_BASE);
                Rgb::new(CUBE_LEVELS[n / 36], CUBE_LEVELS[(n / 6) % 6], CUBE_LEVELS[n % 6])
            }
            GREY_BASE..=u8::MAX => {
                let v = 8 + 10 * (index - GREY_BASE);
                Rgb::new(v, v, v)
            }
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
