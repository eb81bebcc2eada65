//! Level grid loaded from a plain-text map.
//!
//! One line per row, one byte per cell. The grid never changes after load;
//! entity spawns are re-derived from it on every run reset.

use glam::Vec2;
use infman_core::geometry::Rect;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MAX_COLS: usize = 1000;
pub const MAX_ROWS: usize = 100;
/// A map must have strictly more rows and columns than these.
pub const MIN_ROWS: usize = 10;
pub const MIN_COLS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Block,
    Hazard,
    Goal,
    PlayerSpawn,
    EnemySpawn,
    CoinSpawn,
    /// Any other byte. Kept so the grid round-trips, treated as empty.
    Other(u8),
}

impl Cell {
    pub fn from_code(code: u8) -> Self {
        match code {
            b' ' => Cell::Empty,
            b'B' => Cell::Block,
            b'O' => Cell::Hazard,
            b'G' => Cell::Goal,
            b'P' => Cell::PlayerSpawn,
            b'M' => Cell::EnemySpawn,
            b'C' => Cell::CoinSpawn,
            other => Cell::Other(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => b' ',
            Cell::Block => b'B',
            Cell::Hazard => b'O',
            Cell::Goal => b'G',
            Cell::PlayerSpawn => b'P',
            Cell::EnemySpawn => b'M',
            Cell::CoinSpawn => b'C',
            Cell::Other(code) => code,
        }
    }
}

#[derive(Debug)]
pub enum MapError {
    Unreadable { path: PathBuf, source: io::Error },
    TooSmall { rows: usize, cols: usize },
    NoPlayerSpawn,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::Unreadable { path, source } => {
                write!(f, "Failed to read map {}: {source}", path.display())
            }
            MapError::TooSmall { rows, cols } => write!(
                f,
                "Map is {cols}x{rows}; it must be larger than {MIN_COLS}x{MIN_ROWS}"
            ),
            MapError::NoPlayerSpawn => write!(f, "Map has no player spawn ('P') cell"),
        }
    }
}

impl std::error::Error for MapError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapError::Unreadable { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TileMap {
    cells: Vec<u8>,
    rows: usize,
    cols: usize,
    cell_size: f32,
}

impl TileMap {
    pub fn load(path: &Path, cell_size: f32) -> Result<Self, MapError> {
        let bytes = fs::read(path).map_err(|source| MapError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let map = Self::parse(&bytes, cell_size)?;
        log::info!(
            "Map loaded: {} ({}x{} cells)",
            path.display(),
            map.cols,
            map.rows
        );
        Ok(map)
    }

    /// Build a grid from raw map text. Rows past `MAX_ROWS` and columns past
    /// `MAX_COLS` are dropped; short rows are padded with empty cells.
    pub fn parse(bytes: &[u8], cell_size: f32) -> Result<Self, MapError> {
        let mut lines: Vec<&[u8]> = bytes.split(|&b| b == b'\n').collect();
        // A trailing newline does not start another row.
        if lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        lines.truncate(MAX_ROWS);

        let trimmed: Vec<&[u8]> = lines
            .iter()
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                &line[..line.len().min(MAX_COLS)]
            })
            .collect();

        let rows = trimmed.len();
        let cols = trimmed.iter().map(|line| line.len()).max().unwrap_or(0);
        if rows <= MIN_ROWS || cols <= MIN_COLS {
            return Err(MapError::TooSmall { rows, cols });
        }

        let mut cells = vec![b' '; rows * cols];
        for (row, line) in trimmed.iter().enumerate() {
            cells[row * cols..row * cols + line.len()].copy_from_slice(line);
        }

        Ok(Self {
            cells,
            rows,
            cols,
            cell_size,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World-space extent of the whole grid.
    pub fn world_size(&self) -> Vec2 {
        Vec2::new(self.cols as f32, self.rows as f32) * self.cell_size
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        if row >= self.rows || col >= self.cols {
            return Cell::Empty;
        }
        Cell::from_code(self.cells[row * self.cols + col])
    }

    pub fn cell_origin(&self, row: usize, col: usize) -> Vec2 {
        Vec2::new(col as f32, row as f32) * self.cell_size
    }

    pub fn cell_rect(&self, row: usize, col: usize) -> Rect {
        let origin = self.cell_origin(row, col);
        Rect::new(origin.x, origin.y, self.cell_size, self.cell_size)
    }

    /// Every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &code)| (i / cols, i % cols, Cell::from_code(code)))
    }

    /// World origin of the first `cell` in row-major order.
    pub fn find_first(&self, cell: Cell) -> Option<Vec2> {
        self.positions_of(cell).next()
    }

    /// World origins of every `cell`, in row-major order.
    pub fn positions_of(&self, cell: Cell) -> impl Iterator<Item = Vec2> + '_ {
        self.cells()
            .filter(move |&(_, _, c)| c == cell)
            .map(move |(row, col, _)| self.cell_origin(row, col))
    }

    pub fn player_spawn(&self) -> Result<Vec2, MapError> {
        self.find_first(Cell::PlayerSpawn)
            .ok_or(MapError::NoPlayerSpawn)
    }

    /// Cells whose squares could intersect `rect`, clamped to the grid.
    pub fn cells_touching(&self, rect: &Rect) -> impl Iterator<Item = (usize, usize, Cell)> + '_ {
        let to_index = |v: f32, limit: usize| -> usize {
            if v <= 0.0 {
                0
            } else {
                ((v / self.cell_size) as usize).min(limit)
            }
        };
        let col_start = to_index(rect.x, self.cols);
        let col_end = to_index(rect.right(), self.cols.saturating_sub(1)) + 1;
        let row_start = to_index(rect.y, self.rows);
        let row_end = to_index(rect.bottom(), self.rows.saturating_sub(1)) + 1;
        let col_end = col_end.min(self.cols);
        let row_end = row_end.min(self.rows);

        (row_start..row_end).flat_map(move |row| {
            (col_start..col_end).map(move |col| (row, col, self.cell(row, col)))
        })
    }

    /// True when `rect` overlaps any solid block.
    pub fn overlaps_solid(&self, rect: &Rect) -> bool {
        self.cells_touching(rect)
            .any(|(row, col, cell)| cell == Cell::Block && self.cell_rect(row, col).overlaps(rect))
    }
}
