use ansicam_core::grid::{CellGrid, DeltaCell};
use ansicam_core::palette::XTERM;
use ansicam_core::quantize::luma;

/// Brightness ramp for glyph mode, sparse to dense (Paul Bourke).
const GLYPH_RAMP: &[u8] = b" .:-=+*#%@";

/// How a single grid cell is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellStyle {
    /// Two terminal columns per cell.
    pub wide: bool,
    /// Foreground glyph picked by brightness instead of a colored blank.
    pub ascii: bool,
}

impl CellStyle {
    pub fn columns(self) -> u16 {
        if self.wide {
            2
        } else {
            1
        }
    }
}

/// Line ending between rows.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum LineBreak {
    /// Raw-mode terminal; colors carry over to the next row.
    Terminal,
    /// Plain text file; each row is reset so `cat` does not bleed color.
    File,
}

/// Render a full grid to an ANSI byte buffer, starting from the top-left
/// corner. A color escape is only emitted when the index changes.
pub fn render_full(grid: &CellGrid, style: CellStyle, buf: &mut Vec<u8>) {
    buf.clear();
    buf.extend_from_slice(b"\x1b[H");
    write_rows(grid, style, LineBreak::Terminal, buf);
    buf.extend_from_slice(b"\x1b[0m");
}

/// Render only the changed cells.
pub fn render_delta(deltas: &[DeltaCell], style: CellStyle, buf: &mut Vec<u8>) {
    buf.clear();

    for d in deltas {
        // 1-indexed
        write_cursor_pos(buf, d.row + 1, d.col * style.columns() + 1);
        write_color(buf, d.index, style);
        write_glyph(buf, d.index, style);
    }
    if !deltas.is_empty() {
        buf.extend_from_slice(b"\x1b[0m");
    }
}

/// Append every row of `grid` to `buf`.
pub fn write_rows(grid: &CellGrid, style: CellStyle, line_break: LineBreak, buf: &mut Vec<u8>) {
    let mut prev: Option<u8> = None;

    for (row, cells) in grid.rows().enumerate() {
        if row > 0 {
            match line_break {
                LineBreak::Terminal => buf.extend_from_slice(b"\r\n"),
                LineBreak::File => {
                    buf.extend_from_slice(b"\x1b[0m\n");
                    prev = None;
                }
            }
        }
        for &index in cells {
            if prev != Some(index) {
                write_color(buf, index, style);
                prev = Some(index);
            }
            write_glyph(buf, index, style);
        }
    }
}

fn write_color(buf: &mut Vec<u8>, index: u8, style: CellStyle) {
    if style.ascii {
        buf.extend_from_slice(b"\x1b[38;5;");
    } else {
        buf.extend_from_slice(b"\x1b[48;5;");
    }
    write_u8(buf, index);
    buf.push(b'm');
}

fn write_glyph(buf: &mut Vec<u8>, index: u8, style: CellStyle) {
    let glyph = if style.ascii { glyph_for(index) } else { b' ' };
    buf.push(glyph);
    if style.wide {
        buf.push(glyph);
    }
}

/// Ramp character for the brightness of a palette entry.
pub fn glyph_for(index: u8) -> u8 {
    let level = usize::from(luma(XTERM.rgb(index)));
    GLYPH_RAMP[level * GLYPH_RAMP.len() / 256]
}

fn write_cursor_pos(buf: &mut Vec<u8>, row: u16, col: u16) {
    buf.extend_from_slice(b"\x1b[");
    write_u16(buf, row);
    buf.push(b';');
    write_u16(buf, col);
    buf.push(b'H');
}

/// Fast integer-to-ASCII for u8 values (0-255), no allocation.
fn write_u8(buf: &mut Vec<u8>, v: u8) {
    if v >= 100 {
        buf.push(b'0' + v / 100);
        buf.push(b'0' + (v / 10) % 10);
        buf.push(b'0' + v % 10);
    } else if v >= 10 {
        buf.push(b'0' + v / 10);
        buf.push(b'0' + v % 10);
    } else {
        buf.push(b'0' + v);
    }
}

fn write_u16(buf: &mut Vec<u8>, v: u16) {
    if v >= 256 {
        let mut digits = [0u8; 5];
        let mut n = v;
        let mut len = 0;
        while n > 0 {
            digits[len] = b'0' + (n % 10) as u8;
            n /= 10;
            len += 1;
        }
        buf.extend(digits[..len].iter().rev());
    } else {
        write_u8(buf, v as u8);
    }
}
