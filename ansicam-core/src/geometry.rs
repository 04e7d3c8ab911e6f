//! Fitting a camera frame onto a grid of non-square character cells.

/// Crop rectangle in source pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Destination grid in terminal cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSize {
    pub cols: u16,
    pub rows: u16,
}

impl GridSize {
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    pub fn cell_count(self) -> usize {
        usize::from(self.cols) * usize::from(self.rows)
    }
}

/// Width:height ratio the grid covers on screen, given one cell's
/// width:height ratio.
pub fn effective_aspect(grid: GridSize, cell_aspect: f64) -> f64 {
    cell_aspect * f64::from(grid.cols) / f64::from(grid.rows)
}

/// Centered crop of the source that, stretched onto `grid`, keeps the
/// picture's real proportions.
///
/// One source dimension is always kept whole; the other is trimmed
/// equally from both sides, with an odd leftover pixel going to the
/// right or bottom margin.
///
/// All inputs must be positive. Callers validate them; this only
/// debug-asserts.
pub fn compute_crop(source_width: u32, source_height: u32, grid: GridSize, cell_aspect: f64) -> Rect {
    debug_assert!(source_width > 0 && source_height > 0, "empty source frame");
    debug_assert!(grid.cols > 0 && grid.rows > 0, "empty grid");
    debug_assert!(cell_aspect.is_finite() && cell_aspect > 0.0, "bad cell aspect {cell_aspect}");

    let sw = f64::from(source_width);
    let sh = f64::from(source_height);
    let span = cell_aspect * f64::from(grid.cols);
    let rows = f64::from(grid.rows);

    // effective_aspect vs sw / sh, cross-multiplied
    let wanted = span * sh;
    let have = sw * rows;

    let (width, height) = if wanted > have {
        (source_width, clamp_extent(sw * rows / span, source_height))
    } else if wanted < have {
        (clamp_extent(span * sh / rows, source_width), source_height)
    } else {
        (source_width, source_height)
    };

    Rect {
        x: (source_width - width) / 2,
        y: (source_height - height) / 2,
        width,
        height,
    }
}

fn clamp_extent(extent: f64, limit: u32) -> u32 {
    (extent as u32).clamp(1, limit)
}

/// Column to sample for `column` when the picture is flipped horizontally.
pub fn mirror_column(column: u16, cols: u16) -> u16 {
    debug_assert!(column < cols, "column {column} outside {cols}");
    cols - 1 - column
}
