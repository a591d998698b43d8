//! Biome map core: nearest-color classification of raster images into a fixed
//! biome palette, and flood-fill region selection over the resulting label grid.
//!
//! Everything here is synchronous and works on owned snapshots; callers that
//! need background work run [`selector::SelectionRequest::run`] wherever they
//! like and hand the outcome back to the [`selector::Selector`].

pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod grid;
pub mod palette;
pub mod region;
pub mod render;
pub mod selector;

pub use classify::{classify, classify_with, Classification, Histogram, PixelBuffer, PixelSource};
#[cfg(feature = "threading")]
pub use classify::classify_parallel;
pub use color::{color_from_rgb, Color};
pub use config::MapConfig;
pub use error::{Error, Result};
pub use grid::{Cell, Grid, GridVersion, Position};
pub use palette::{nearest_biome, Biome, Palette};
pub use region::{find_region, find_region_cancellable, CancelToken, Region, RegionCache};
pub use selector::{Pending, SelectionRequest, Selector};
