use std::fmt::Write as _;
use std::io::Write as _;

use clap::Parser;

use ansicam_core::palette::{Palette, CUBE_BASE, XTERM};
use ansicam_core::pixel::Rgb;
use ansicam_core::quantize::{luma, quantize_color, saturation, DEFAULT_SATURATION_THRESHOLD};

#[derive(Parser)]
#[command(name = "ansicam-palette", version, about = "Look up hex colors in the xterm 256-color palette")]
struct Cli {
    /// Colors as RRGGBB or #RRGGBB
    colors: Vec<String>,

    /// Print the whole palette
    #[arg(short, long)]
    chart: bool,

    /// Pixels at or below this saturation (0-255) map to the grey ramp
    #[arg(short, long, default_value_t = DEFAULT_SATURATION_THRESHOLD)]
    threshold: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if !cli.chart && cli.colors.is_empty() {
        anyhow::bail!("nothing to do: pass one or more hex colors, or --chart");
    }

    let mut out = String::new();
    if cli.chart {
        chart(&XTERM, &mut out);
    }
    for hex in &cli.colors {
        let px = Rgb::from_hex(hex)?;
        log::debug!("{hex} parsed as {px}");
        describe(&XTERM, px, cli.threshold, &mut out);
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(out.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// One line per color: input, its luma and saturation, and the matched
/// palette entry with a swatch.
fn describe(palette: &Palette, px: Rgb, threshold: u8, out: &mut String) {
    let index = quantize_color(palette, px, threshold);
    let nominal = palette.rgb(index);
    let _ = writeln!(
        out,
        "{px}  luma {:>3}  sat {:>3}  -> {index:>3} {nominal} {}",
        luma(px),
        saturation(px),
        swatch(palette, index, &format!("{index:^5}")),
    );
}

/// Basic colors, the cube as six rows of 36, then the grey ramp.
fn chart(palette: &Palette, out: &mut String) {
    out.push_str("basic\n");
    for index in 0..16u8 {
        out.push_str(&swatch(palette, index, &format!("{index:^5}")));
    }
    out.push('\n');

    out.push_str("cube\n");
    for r in 0..6u8 {
        for g in 0..6u8 {
            for b in 0..6u8 {
                let index = Palette::cube_index(r, g, b);
                out.push_str(&swatch(palette, index, &format!("{:^4}", index - CUBE_BASE)));
            }
        }
        out.push('\n');
    }

    out.push_str("grey\n");
    for &index in palette.grey_ramp() {
        out.push_str(&swatch(palette, index, &format!("{index:^5}")));
    }
    out.push('\n');
}

/// `label` on a background of `index`, in black or white for contrast.
fn swatch(palette: &Palette, index: u8, label: &str) -> String {
    let fg = if luma(palette.rgb(index)) > 127 { 16 } else { 231 };
    format!("\x1b[38;5;{fg}m\x1b[48;5;{index}m{label}\x1b[0m")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_escapes(s: &str) -> String {
        let mut plain = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                chars.by_ref().find(|&c| c == 'm');
            } else {
                plain.push(c);
            }
        }
        plain
    }

    #[test]
    fn describes_saturated_color() {
        let mut out = String::new();
        describe(&XTERM, Rgb::new(255, 0, 0), DEFAULT_SATURATION_THRESHOLD, &mut out);
        let plain = strip_escapes(&out);
        assert!(plain.starts_with("#ff0000"), "{plain}");
        assert!(plain.contains("sat 255"), "{plain}");
        assert!(plain.contains("-> 196 #ff0000"), "{plain}");
    }

    #[test]
    fn threshold_moves_color_to_grey() {
        let px = Rgb::new(200, 160, 160);
        let mut low = String::new();
        let mut high = String::new();
        describe(&XTERM, px, 0, &mut low);
        describe(&XTERM, px, 255, &mut high);
        assert!(strip_escapes(&low).contains("-> 181"), "{low}");
        let high = strip_escapes(&high);
        let index: u8 = high.split("-> ").nth(1).unwrap()[..3].trim().parse().unwrap();
        assert!(XTERM.grey_ramp().contains(&index), "{high}");
    }

    #[test]
    fn chart_has_all_sections() {
        let mut out = String::new();
        chart(&XTERM, &mut out);
        assert_eq!(out.matches("\x1b[48;5;").count(), 16 + 216 + 26);
        // the grey ramp ends on the cube's black and white
        for index in 0..=255u8 {
            let shown = out.matches(&format!("\x1b[48;5;{index}m")).count();
            let expected = if index == 16 || index == 231 { 2 } else { 1 };
            assert_eq!(shown, expected, "index {index}");
        }
        let plain = strip_escapes(&out);
        let lines: Vec<_> = plain.lines().collect();
        assert_eq!(lines.len(), 1 + 1 + 1 + 6 + 1 + 1);
        assert_eq!(lines[3].len(), 36 * 4);
    }

    #[test]
    fn swatch_text_contrasts_with_background() {
        assert!(swatch(&XTERM, 231, "x").starts_with("\x1b[38;5;16m"));
        assert!(swatch(&XTERM, 16, "x").starts_with("\x1b[38;5;231m"));
    }
}
