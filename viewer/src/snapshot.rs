use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use ansicam_core::grid::CellGrid;

use crate::render::{write_rows, CellStyle, LineBreak};

/// Encode a grid as a standalone ANSI text file that can be `cat`ed back
/// into a 256-color terminal.
pub fn encode(grid: &CellGrid, style: CellStyle) -> Vec<u8> {
    let mut buf = Vec::with_capacity(grid.cells().len() * 12);
    write_rows(grid, style, LineBreak::File, &mut buf);
    buf.extend_from_slice(b"\x1b[0m\n");
    buf
}

/// Write `grid` to `dir/ansicam-<unix seconds>-<seq>.ans`.
pub fn save(grid: &CellGrid, style: CellStyle, dir: &Path, seq: u32) -> anyhow::Result<PathBuf> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before 1970")?
        .as_secs();
    let path = dir.join(format!("ansicam-{secs}-{seq}.ans"));
    std::fs::write(&path, encode(grid, style))
        .with_context(|| format!("failed to write snapshot {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ansicam_core::geometry::GridSize;

    #[test]
    fn encoded_rows_end_with_reset_and_newline() {
        let grid = CellGrid::filled(GridSize::new(3, 2), 21);
        let text = String::from_utf8(encode(&grid, CellStyle::default())).unwrap();
        assert_eq!(text, "\x1b[48;5;21m   \x1b[0m\n\x1b[48;5;21m   \x1b[0m\n");
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn save_writes_into_dir() {
        let dir = std::env::temp_dir().join(format!("ansicam-snapshot-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let grid = CellGrid::filled(GridSize::new(2, 1), 231);

        let path = save(&grid, CellStyle::default(), &dir, 7).unwrap();
        assert!(path.starts_with(&dir));
        assert!(path.file_name().unwrap().to_string_lossy().ends_with("-7.ans"));
        assert_eq!(std::fs::read(&path).unwrap(), encode(&grid, CellStyle::default()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn save_reports_missing_dir() {
        let grid = CellGrid::filled(GridSize::new(1, 1), 16);
        let err = save(&grid, CellStyle::default(), Path::new("/nonexistent/ansicam"), 0).unwrap_err();
        assert!(err.to_string().contains("failed to write snapshot"));
    }
}
