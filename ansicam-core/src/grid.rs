use crate::error::CoreError;
use crate::geometry::{mirror_column, GridSize};
use crate::pixel::PixelLayout;
use crate::quantize::Quantizer;

/// One rendered frame: a palette index per terminal cell, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellGrid {
    size: GridSize,
    cells: Vec<u8>,
}

impl CellGrid {
    pub fn filled(size: GridSize, index: u8) -> Self {
        Self { size, cells: vec![index; size.cell_count()] }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn get(&self, col: u16, row: u16) -> u8 {
        self.cells[usize::from(row) * usize::from(self.size.cols) + usize::from(col)]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks_exact(usize::from(self.size.cols))
    }
}

/// Quantize a frame already cropped and resampled to exactly one sample per cell.
///
/// With `mirror` set, output column `c` takes sample column `cols - 1 - c`.
pub fn quantize_frame(
    samples: &[u8],
    layout: PixelLayout,
    size: GridSize,
    quantizer: &Quantizer<'_>,
    mirror: bool,
) -> Result<CellGrid, CoreError> {
    let expected = size.cell_count() * PixelLayout::BYTES;
    if samples.len() != expected || expected == 0 {
        return Err(CoreError::BufferSize { expected, actual: samples.len() });
    }

    let stride = usize::from(size.cols) * PixelLayout::BYTES;
    let mut cells = Vec::with_capacity(size.cell_count());

    for row in samples.chunks_exact(stride) {
        for col in 0..size.cols {
            let src = if mirror { mirror_column(col, size.cols) } else { col };
            let off = usize::from(src) * PixelLayout::BYTES;
            cells.push(quantizer.quantize(layout.read(&row[off..off + PixelLayout::BYTES])));
        }
    }

    Ok(CellGrid { size, cells })
}

/// A cell whose palette index changed since the last drawn frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeltaCell {
    pub col: u16,
    pub row: u16,
    pub index: u8,
}

/// What the renderer has to draw for the next frame.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameDiff {
    /// Redraw every cell.
    Full,
    /// Only the changed cells.
    Delta(Vec<DeltaCell>),
}

/// Compare `current` against the previously drawn grid.
///
/// Falls back to a full redraw when there is nothing to compare against,
/// the size changed, or more than 60% of cells changed.
pub fn compute_delta(prev: Option<&CellGrid>, current: &CellGrid, force_full: bool) -> FrameDiff {
    let prev = match prev {
        Some(p) if !force_full && p.size == current.size => p,
        _ => return FrameDiff::Full,
    };

    let cols = usize::from(current.size.cols);
    let total = current.cells.len();
    let mut deltas = Vec::new();

    for (i, (&now, &before)) in current.cells.iter().zip(&prev.cells).enumerate() {
        if now != before {
            deltas.push(DeltaCell {
                col: (i % cols) as u16,
                row: (i / cols) as u16,
                index: now,
            });
        }
    }

    if deltas.len() > total * 60 / 100 {
        FrameDiff::Full
    } else {
        FrameDiff::Delta(deltas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::XTERM;
    use crate::quantize::QuantizeOptions;

    fn quantizer() -> Quantizer<'static> {
        Quantizer::new(&XTERM, QuantizeOptions::default())
    }

    /// 3x2 frame: red, green, blue / black, greyish, white.
    fn sample_frame() -> Vec<u8> {
        vec![
            255, 0, 0, 0, 255, 0, 0, 0, 255, //
            0, 0, 0, 120, 130, 125, 255, 255, 255,
        ]
    }

    #[test]
    fn quantizes_each_sample() {
        let grid = quantize_frame(&sample_frame(), PixelLayout::Rgb, GridSize::new(3, 2), &quantizer(), false)
            .unwrap();
        assert_eq!(grid.cells(), &[196, 46, 21, 16, 243, 231]);
        assert_eq!(grid.get(1, 1), 243);
    }

    #[test]
    fn bgr_layout_swaps_red_and_blue() {
        let grid = quantize_frame(&sample_frame(), PixelLayout::Bgr, GridSize::new(3, 2), &quantizer(), false)
            .unwrap();
        assert_eq!(&grid.cells()[..3], &[21, 46, 196]);
    }

    #[test]
    fn mirror_reverses_each_row() {
        let size = GridSize::new(3, 2);
        let plain = quantize_frame(&sample_frame(), PixelLayout::Rgb, size, &quantizer(), false).unwrap();
        let mirrored = quantize_frame(&sample_frame(), PixelLayout::Rgb, size, &quantizer(), true).unwrap();
        for (a, b) in plain.rows().zip(mirrored.rows()) {
            let reversed: Vec<u8> = a.iter().rev().copied().collect();
            assert_eq!(b, reversed.as_slice());
        }
    }

    #[test]
    fn rejects_wrong_buffer_size() {
        let err = quantize_frame(&[0; 10], PixelLayout::Rgb, GridSize::new(3, 2), &quantizer(), false);
        assert!(matches!(err, Err(CoreError::BufferSize { expected: 18, actual: 10 })));
    }

    #[test]
    fn first_frame_is_full() {
        let grid = CellGrid::filled(GridSize::new(4, 4), 16);
        assert_eq!(compute_delta(None, &grid, false), FrameDiff::Full);
    }

    #[test]
    fn small_change_is_delta() {
        let size = GridSize::new(4, 2);
        let prev = CellGrid::filled(size, 16);
        let mut current = prev.clone();
        current.cells[5] = 196;

        assert_eq!(
            compute_delta(Some(&prev), &current, false),
            FrameDiff::Delta(vec![DeltaCell { col: 1, row: 1, index: 196 }])
        );
        assert_eq!(compute_delta(Some(&prev), &current, true), FrameDiff::Full);
        assert_eq!(compute_delta(Some(&prev), &prev, false), FrameDiff::Delta(Vec::new()));
    }

    #[test]
    fn large_change_promotes_to_full() {
        let size = GridSize::new(10, 1);
        let prev = CellGrid::filled(size, 16);
        let mut current = prev.clone();
        current.cells[..6].fill(231);
        assert!(matches!(compute_delta(Some(&prev), &current, false), FrameDiff::Delta(d) if d.len() == 6));
        current.cells[6] = 231;
        assert_eq!(compute_delta(Some(&prev), &current, false), FrameDiff::Full);
    }

    #[test]
    fn size_change_is_full() {
        let prev = CellGrid::filled(GridSize::new(4, 2), 16);
        let current = CellGrid::filled(GridSize::new(2, 4), 16);
        assert_eq!(compute_delta(Some(&prev), &current, false), FrameDiff::Full);
    }
}
