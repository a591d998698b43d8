//! Interactive selection state for a surface that classifies an image once
//! and then answers clicks.
//!
//! The selector owns the current grid snapshot, the last region, and the
//! cancellation token of the fill in flight. A newer request or a new grid
//! supersedes everything older: stale results are dropped on arrival.

use std::sync::Arc;

use crate::classify::{Classification, Histogram};
use crate::error::{Error, Result};
use crate::grid::{Grid, GridVersion, Position};
use crate::region::{find_region_cancellable, CancelToken, Region, RegionCache};

/// A pending region computation, detached from the selector so it can run on
/// a worker thread.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    id: u64,
    grid: Arc<Grid>,
    start: Position,
    token: CancelToken,
}

impl SelectionRequest {
    pub fn start(&self) -> Position {
        self.start
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run the flood fill. Fails with `Cancelled` once superseded.
    pub fn run(&self) -> Result<Region> {
        find_region_cancellable(&self.grid, self.start, &self.token)
    }
}

#[derive(Debug, Default)]
pub struct Selector {
    grid: Option<Arc<Grid>>,
    histogram: Option<Histogram>,
    cache: RegionCache,
    selected: Option<Arc<Region>>,
    inflight: Option<CancelToken>,
    next_id: u64,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current image. Cancels any fill in flight and forgets the
    /// previous selection.
    pub fn load(&mut self, classification: Classification) -> GridVersion {
        self.cancel();
        self.cache.clear();
        self.selected = None;
        let version = classification.grid.version();
        log::debug!(
            "selector loaded {}x{} grid {:?}",
            classification.grid.width(),
            classification.grid.height(),
            version
        );
        self.grid = Some(Arc::new(classification.grid));
        self.histogram = Some(classification.histogram);
        version
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_deref()
    }

    pub fn histogram(&self) -> Option<&Histogram> {
        self.histogram.as_ref()
    }

    /// The authoritative region for the current grid, if any.
    pub fn selected(&self) -> Option<&Arc<Region>> {
        self.selected.as_ref()
    }

    /// Abandon the fill in flight, if any (pointer moved away, zoom changed).
    pub fn cancel(&mut self) {
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }
    }

    /// Clear the current selection without touching the grid.
    pub fn deselect(&mut self) -> Option<Arc<Region>> {
        self.cancel();
        self.selected.take()
    }

    /// Start a new selection at `start`, superseding any earlier request.
    ///
    /// Yields either a cached region, already the current selection, or a
    /// request to run and hand back through [`Selector::complete`].
    pub fn begin(&mut self, start: Position) -> Result<Pending> {
        let grid = self
            .grid
            .clone()
            .ok_or_else(|| Error::invalid("no image loaded"))?;
        grid.check(start)?;
        self.cancel();
        self.next_id += 1;

        if let Some(hit) = self.cache.get(&grid, start) {
            self.selected = Some(Arc::clone(&hit));
            return Ok(Pending::Ready(hit));
        }

        self.selected = None;
        let token = CancelToken::new();
        self.inflight = Some(token.clone());
        Ok(Pending::Run(SelectionRequest {
            id: self.next_id,
            grid,
            start,
            token,
        }))
    }

    /// Accept the outcome of a request. Returns the region when it is still
    /// the latest, uncancelled request against the current grid, `None`
    /// otherwise. A finished fill is dropped if the caller cancelled after it
    /// completed.
    pub fn complete(&mut self, request: &SelectionRequest, outcome: Result<Region>) -> Result<Option<Arc<Region>>> {
        let current = self.grid.as_ref().map(|g| g.version());
        if request.id != self.next_id || current != Some(request.grid.version()) {
            log::trace!("dropping superseded selection at {:?}", request.start);
            return Ok(None);
        }
        if request.is_cancelled() {
            log::trace!("dropping cancelled selection at {:?}", request.start);
            return Ok(None);
        }
        self.inflight = None;
        let region = match outcome {
            Ok(region) => Arc::new(region),
            Err(Error::Cancelled) => return Ok(None),
            Err(e) => return Err(e),
        };
        self.cache.insert(Arc::clone(&region));
        self.selected = Some(Arc::clone(&region));
        Ok(Some(region))
    }

    /// Synchronous select: begin, run in place, complete.
    pub fn select(&mut self, start: Position) -> Result<Arc<Region>> {
        match self.begin(start)? {
            Pending::Ready(region) => Ok(region),
            Pending::Run(request) => {
                let outcome = request.run();
                self.complete(&request, outcome)?.ok_or(Error::Cancelled)
            }
        }
    }
}

/// Result of [`Selector::begin`].
#[derive(Debug)]
pub enum Pending {
    /// Served from the cache; already the current selection.
    Ready(Arc<Region>),
    /// Needs a flood fill.
    Run(SelectionRequest),
}
