//! Flood-fill region discovery over a label grid.
//!
//! A region is the maximal 4-connected set of cells sharing the start cell's
//! biome. A member is a border cell when at least one of its in-bounds
//! neighbours carries a different biome. Cells on the image edge are *not*
//! border cells by virtue of the edge alone.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::grid::{Grid, GridVersion, Position};
use crate::palette::Biome;

/// How many cells are dequeued between cancellation checks.
const CANCEL_POLL_INTERVAL: usize = 4096;

/// A connected same-biome region and its border cells.
///
/// Only meaningful against the grid that produced it; see [`Region::version`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    pub members: HashSet<Position>,
    /// Members adjacent to an in-bounds cell of another biome. Always a subset
    /// of `members`.
    pub border: HashSet<Position>,
    pub start: Position,
    /// Palette index of the region's biome.
    #[serde(skip)]
    label: u16,
    version: GridVersion,
}

impl Region {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn version(&self) -> GridVersion {
        self.version
    }

    pub fn biome<'g>(&self, grid: &'g Grid) -> Result<&'g Biome> {
        if grid.version() != self.version {
            return Err(Error::invalid("region belongs to a different grid"));
        }
        Ok(&grid.palette()[self.label as usize])
    }

    /// Inclusive bounding box as `(min, max)` corners.
    pub fn bounds(&self) -> (Position, Position) {
        let mut min = self.start;
        let mut max = self.start;
        for p in &self.members {
            min.column = min.column.min(p.column);
            min.row = min.row.min(p.row);
            max.column = max.column.max(p.column);
            max.row = max.row.max(p.row);
        }
        (min, max)
    }
}

// ── Cancellation ──────────────────────────────────────────────────────────────

/// Shared flag a caller flips to abandon an in-flight fill.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ── Flood fill ────────────────────────────────────────────────────────────────

/// Find the region containing `start`.
pub fn find_region(grid: &Grid, start: Position) -> Result<Region> {
    flood(grid, start, || false)
}

/// As [`find_region`], returning `Cancelled` as soon as `token` is observed
/// cancelled. Nothing outside the call is touched, so an abandoned fill
/// leaves no trace.
pub fn find_region_cancellable(grid: &Grid, start: Position, token: &CancelToken) -> Result<Region> {
    flood(grid, start, || token.is_cancelled())
}

fn flood<F>(grid: &Grid, start: Position, cancelled: F) -> Result<Region>
where
    F: Fn() -> bool,
{
    grid.check(start)?;
    if cancelled() {
        return Err(Error::Cancelled);
    }

    let label = grid.label(start);
    let mut members = HashSet::from([start]);
    let mut border = HashSet::new();
    let mut queue = VecDeque::from([start]);
    let mut popped = 0usize;

    while let Some(cur) = queue.pop_front() {
        popped += 1;
        if popped % CANCEL_POLL_INTERVAL == 0 && cancelled() {
            log::trace!("flood fill from {start:?} cancelled after {popped} cells");
            return Err(Error::Cancelled);
        }

        for n in cur.neighbors() {
            if !grid.contains(n) || members.contains(&n) {
                continue;
            }
            if grid.label(n) == label {
                members.insert(n);
                queue.push_back(n);
            } else {
                border.insert(cur);
            }
        }
    }

    log::debug!(
        "region at ({}, {}): {} cells, {} border",
        start.column,
        start.row,
        members.len(),
        border.len()
    );
    Ok(Region {
        members,
        border,
        start,
        label,
        version: grid.version(),
    })
}

// ── Memoization ───────────────────────────────────────────────────────────────

/// Remembers the last region, keyed by grid version and the exact clicked
/// position. A click elsewhere, even inside the same region, is a miss.
#[derive(Debug, Default)]
pub struct RegionCache {
    last: Option<(GridVersion, Position, Arc<Region>)>,
}

impl RegionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, grid: &Grid, start: Position) -> Option<Arc<Region>> {
        match &self.last {
            Some((v, p, r)) if *v == grid.version() && *p == start => Some(Arc::clone(r)),
            _ => None,
        }
    }

    pub fn insert(&mut self, region: Arc<Region>) {
        self.last = Some((region.version, region.start, region));
    }

    /// Cached lookup, computing and storing the region on a miss.
    pub fn find(&mut self, grid: &Grid, start: Position) -> Result<Arc<Region>> {
        if let Some(hit) = self.get(grid, start) {
            log::trace!("region cache hit at ({}, {})", start.column, start.row);
            return Ok(hit);
        }
        let region = Arc::new(find_region(grid, start)?);
        self.insert(Arc::clone(&region));
        Ok(region)
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::Palette;

    fn grid(rows: &[&str]) -> Grid {
        Grid::from_names(rows, Palette::builtin().clone()).unwrap()
    }

    fn set(ps: &[(usize, usize)]) -> HashSet<Position> {
        ps.iter().map(|&(c, r)| Position::new(c, r)).collect()
    }

    #[test]
    fn ring_around_single_forest_cell() {
        let g = grid(&["Ocean Ocean Ocean", "Ocean Forest Ocean", "Ocean Ocean Ocean"]);
        let region = find_region(&g, Position::new(0, 0)).unwrap();
        assert_eq!(region.count(), 8);
        assert!(!region.members.contains(&Position::new(1, 1)));
        // Edge-only cells such as the corners are not border cells.
        assert_eq!(region.border, set(&[(1, 0), (0, 1), (2, 1), (1, 2)]));
        assert_eq!(region.biome(&g).unwrap().name, "Ocean");
    }

    #[test]
    fn single_cell_region() {
        let g = grid(&["Ocean Ocean Ocean", "Ocean Forest Ocean", "Ocean Ocean Ocean"]);
        let region = find_region(&g, Position::new(1, 1)).unwrap();
        assert_eq!(region.members, set(&[(1, 1)]));
        assert_eq!(region.border, set(&[(1, 1)]));
        assert_eq!(region.bounds(), (Position::new(1, 1), Position::new(1, 1)));
    }

    #[test]
    fn uniform_grid_has_no_border() {
        let g = grid(&["Sea Sea", "Sea Sea"]);
        let region = find_region(&g, Position::new(1, 1)).unwrap();
        assert_eq!(region.count(), 4);
        assert!(region.border.is_empty());
    }

    #[test]
    fn diagonal_cells_are_not_connected() {
        let g = grid(&["Desert Sea", "Sea Desert"]);
        let region = find_region(&g, Position::new(0, 0)).unwrap();
        assert_eq!(region.members, set(&[(0, 0)]));
    }

    #[test]
    fn region_follows_winding_path() {
        let g = grid(&[
            "City City City City",
            "Sea  Sea  Sea  City",
            "City City Sea  City",
            "City Sea  Sea  City",
        ]);
        let region = find_region(&g, Position::new(0, 0)).unwrap();
        // The City cells reachable around the right edge, not the pocket at bottom-left.
        assert_eq!(region.count(), 7);
        assert!(!region.members.contains(&Position::new(0, 2)));
        assert!(region.border.is_subset(&region.members));
        assert_eq!(region.bounds(), (Position::new(0, 0), Position::new(3, 3)));
    }

    #[test]
    fn start_outside_grid_is_out_of_bounds() {
        let g = grid(&["Sea Sea"]);
        assert!(matches!(
            find_region(&g, Position::new(2, 0)),
            Err(Error::OutOfBounds { .. })
        ));
        assert!(matches!(
            find_region(&g, Position::new(0, 1)),
            Err(Error::OutOfBounds { .. })
        ));
    }

    #[test]
    fn cancelled_token_abandons_fill() {
        let g = grid(&["Sea Sea", "Sea Sea"]);
        let token = CancelToken::new();
        assert!(find_region_cancellable(&g, Position::new(0, 0), &token).is_ok());
        token.cancel();
        assert_eq!(
            find_region_cancellable(&g, Position::new(0, 0), &token),
            Err(Error::Cancelled)
        );
    }

    #[test]
    fn cancellation_is_observed_mid_fill() {
        let sea = Palette::builtin().index_of("Sea").unwrap() as u16;
        let g = Grid::from_labels(vec![sea; 100 * 50], 100, 50, Palette::builtin().clone()).unwrap();
        // Passes the up-front check, then reports cancelled on every poll.
        let polls = std::cell::Cell::new(0usize);
        let result = flood(&g, Position::new(0, 0), || {
            polls.set(polls.get() + 1);
            polls.get() > 1
        });
        assert_eq!(result, Err(Error::Cancelled));
        assert_eq!(polls.get(), 2);

        // Left alone, the same fill covers all 5000 cells.
        assert_eq!(find_region(&g, Position::new(0, 0)).unwrap().count(), 100 * 50);
    }

    #[test]
    fn cache_hits_only_on_same_grid_and_position() {
        let g = grid(&["Sea Sea", "Sea Sea"]);
        let mut cache = RegionCache::new();
        let a = cache.find(&g, Position::new(0, 0)).unwrap();
        let b = cache.find(&g, Position::new(0, 0)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        // Same region, different click: recomputed.
        let c = cache.find(&g, Position::new(1, 1)).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(a.members, c.members);

        // A reclassified grid invalidates the entry.
        let g2 = g.clone();
        let fresh = grid(&["Sea Sea", "Sea Sea"]);
        assert!(cache.get(&g2, Position::new(1, 1)).is_some());
        assert!(cache.get(&fresh, Position::new(1, 1)).is_none());
        assert!(c.biome(&fresh).is_err());

        cache.clear();
        assert!(cache.get(&g, Position::new(1, 1)).is_none());
    }
}
