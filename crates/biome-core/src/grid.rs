//! Label grid: one biome per pixel coordinate, row-major.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::palette::{Biome, Palette};

/// An integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub column: usize,
    pub row: usize,
}

impl Position {
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }

    /// The four orthogonal neighbours that exist in unsigned space
    /// (right, left, down, up). Upper bounds are the caller's concern.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        let Position { column: c, row: r } = self;
        [
            Some(Position::new(c + 1, r)),
            c.checked_sub(1).map(|c| Position::new(c, r)),
            Some(Position::new(c, r + 1)),
            r.checked_sub(1).map(|r| Position::new(c, r)),
        ]
        .into_iter()
        .flatten()
    }
}

/// A position paired with the biome assigned to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell<'a> {
    pub position: Position,
    pub biome: &'a Biome,
}

/// Identity of one classification pass. Every new `Grid` gets a fresh version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridVersion(u64);

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

impl GridVersion {
    fn next() -> Self {
        GridVersion(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }
}

/// `width * height`, or `InvalidInput` when the product does not fit in `usize`.
pub(crate) fn cell_count(width: usize, height: usize) -> Result<usize> {
    width
        .checked_mul(height)
        .ok_or_else(|| Error::invalid(format!("grid dimensions {width}x{height} are too large")))
}

/// Per-pixel label assignment for one classified image.
///
/// Labels are palette indices; the grid owns a copy of the palette they index
/// into. A grid is never modified after construction.
#[derive(Debug, Clone)]
pub struct Grid {
    labels: Vec<u16>,
    width: usize,
    height: usize,
    palette: Palette,
    version: GridVersion,
}

impl Grid {
    /// Wrap row-major palette indices. `labels.len()` must equal
    /// `width * height` and every label must index into `palette`.
    pub fn from_labels(labels: Vec<u16>, width: usize, height: usize, palette: Palette) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid(format!("grid dimensions {width}x{height} must be positive")));
        }
        if labels.len() != cell_count(width, height)? {
            return Err(Error::invalid(format!(
                "{} labels for a {width}x{height} grid",
                labels.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l as usize >= palette.len()) {
            return Err(Error::invalid(format!(
                "label {bad} outside palette of {}",
                palette.len()
            )));
        }
        Ok(Self {
            labels,
            width,
            height,
            palette,
            version: GridVersion::next(),
        })
    }

    /// Build a grid from biome names, one string per row with
    /// whitespace-separated names. Handy for fixtures and small maps.
    pub fn from_names(rows: &[&str], palette: Palette) -> Result<Self> {
        let mut labels = Vec::new();
        let mut width = 0;
        for (r, row) in rows.iter().enumerate() {
            let names: Vec<&str> = row.split_whitespace().collect();
            if r == 0 {
                width = names.len();
            } else if names.len() != width {
                return Err(Error::invalid(format!("row {r} has {} cells, expected {width}", names.len())));
            }
            for name in names {
                let idx = palette
                    .index_of(name)
                    .ok_or_else(|| Error::invalid(format!("unknown biome {name:?}")))?;
                labels.push(idx as u16);
            }
        }
        Self::from_labels(labels, width, rows.len(), palette)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn version(&self) -> GridVersion {
        self.version
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub fn contains(&self, pos: Position) -> bool {
        pos.column < self.width && pos.row < self.height
    }

    pub fn check(&self, pos: Position) -> Result<()> {
        if self.contains(pos) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                position: pos,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Palette index at an in-bounds position. Panics if out of bounds.
    #[inline]
    pub fn label(&self, pos: Position) -> u16 {
        self.labels[pos.row * self.width + pos.column]
    }

    pub fn cell(&self, pos: Position) -> Result<Cell<'_>> {
        self.check(pos)?;
        Ok(Cell {
            position: pos,
            biome: &self.palette[self.label(pos) as usize],
        })
    }

    pub fn biome(&self, pos: Position) -> Result<&Biome> {
        self.cell(pos).map(|c| c.biome)
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> + '_ {
        self.labels.iter().enumerate().map(move |(i, &l)| Cell {
            position: Position::new(i % self.width, i / self.width),
            biome: &self.palette[l as usize],
        })
    }
}
