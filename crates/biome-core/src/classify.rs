//! Whole-image nearest-color classification.
//!
//! Every pixel is matched independently against the palette, so the pass
//! order does not affect the result. One pass yields the label [`Grid`] and a
//! per-biome [`Histogram`]; both are replaced together when a new image is
//! classified.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::grid::{cell_count, Cell, Grid, Position};
use crate::palette::{Biome, Palette};

// ── Pixel sources ─────────────────────────────────────────────────────────────

/// Read access to a decoded image's pixel colors.
///
/// Only called with `column < width` and `row < height` of the pass.
pub trait PixelSource {
    fn pixel(&self, pos: Position) -> Color;
}

impl<F> PixelSource for F
where
    F: Fn(Position) -> Color,
{
    fn pixel(&self, pos: Position) -> Color {
        self(pos)
    }
}

/// A borrowed row-major 8-bit buffer with 3 (RGB) or 4 (RGBA) channels.
/// Alpha is ignored.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize, channels: usize) -> Result<Self> {
        if channels != 3 && channels != 4 {
            return Err(Error::invalid(format!("{channels} channels per pixel, expected 3 or 4")));
        }
        let expected = cell_count(width, height)?
            .checked_mul(channels)
            .ok_or_else(|| Error::invalid(format!("{width}x{height}x{channels} image is too large")))?;
        if data.len() != expected {
            return Err(Error::invalid(format!(
                "buffer of {} bytes does not hold a {width}x{height}x{channels} image",
                data.len()
            )));
        }
        Ok(Self { data, width, height, channels })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl PixelSource for PixelBuffer<'_> {
    fn pixel(&self, pos: Position) -> Color {
        let i = (pos.row * self.width + pos.column) * self.channels;
        Color::from_rgb8([self.data[i], self.data[i + 1], self.data[i + 2]])
    }
}

// ── Histogram ─────────────────────────────────────────────────────────────────

/// Per-biome pixel counts for one classification pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    palette: Palette,
    counts: Vec<usize>,
}

impl Histogram {
    fn new(palette: Palette) -> Self {
        let counts = vec![0; palette.len()];
        Self { palette, counts }
    }

    /// Occurrences of the biome named `name`; 0 if absent.
    pub fn count(&self, name: &str) -> usize {
        self.palette.index_of(name).map_or(0, |i| self.counts[i])
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Biomes that occur at least once, in palette order.
    pub fn iter(&self) -> impl Iterator<Item = (&Biome, usize)> + '_ {
        self.palette
            .iter()
            .zip(self.counts.iter().copied())
            .filter(|&(_, n)| n > 0)
    }

    /// The most frequent biome; earliest in palette order on ties.
    pub fn dominant(&self) -> Option<(&Biome, usize)> {
        self.iter().fold(None, |best, (b, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((b, n)),
        })
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (biome, n) in self.iter() {
            map.serialize_entry(&biome.name, &n)?;
        }
        map.end()
    }
}

// ── Classification ────────────────────────────────────────────────────────────

/// Output of one pass: the label grid and its histogram.
#[derive(Debug, Clone)]
pub struct Classification {
    pub grid: Grid,
    pub histogram: Histogram,
}

fn validate(width: usize, height: usize, palette: &[Biome]) -> Result<(Palette, usize)> {
    if width == 0 || height == 0 {
        return Err(Error::invalid(format!("image dimensions {width}x{height} must be positive")));
    }
    let cells = cell_count(width, height)?;
    Ok((Palette::new(palette.to_vec())?, cells))
}

/// Classify every pixel of a `width × height` image against `palette`.
pub fn classify<S>(source: S, width: usize, height: usize, palette: &[Biome]) -> Result<Classification>
where
    S: PixelSource,
{
    classify_with(source, width, height, palette, |_| {})
}

/// As [`classify`], calling `on_cell` once per coordinate with the matched
/// biome, in row-major order. Lets a caller repaint output pixels without
/// repeating the match.
pub fn classify_with<S, F>(
    source: S,
    width: usize,
    height: usize,
    palette: &[Biome],
    mut on_cell: F,
) -> Result<Classification>
where
    S: PixelSource,
    F: FnMut(Cell<'_>),
{
    let (palette, cells) = validate(width, height, palette)?;
    let mut histogram = Histogram::new(palette.clone());
    let mut labels = Vec::with_capacity(cells);

    for row in 0..height {
        for column in 0..width {
            let position = Position::new(column, row);
            let idx = palette.nearest(source.pixel(position));
            labels.push(idx as u16);
            histogram.counts[idx] += 1;
            on_cell(Cell { position, biome: &palette[idx] });
        }
    }

    finish(labels, width, height, palette, histogram)
}

/// Row-parallel classification. Produces the same grid and histogram as
/// [`classify`].
#[cfg(feature = "threading")]
pub fn classify_parallel<S>(source: S, width: usize, height: usize, palette: &[Biome]) -> Result<Classification>
where
    S: PixelSource + Sync,
{
    use rayon::prelude::*;

    let (palette, _) = validate(width, height, palette)?;
    let rows: Vec<Vec<u16>> = (0..height)
        .into_par_iter()
        .map(|row| {
            (0..width)
                .map(|column| palette.nearest(source.pixel(Position::new(column, row))) as u16)
                .collect()
        })
        .collect();

    let labels: Vec<u16> = rows.into_iter().flatten().collect();
    let mut histogram = Histogram::new(palette.clone());
    for &l in &labels {
        histogram.counts[l as usize] += 1;
    }

    finish(labels, width, height, palette, histogram)
}

fn finish(
    labels: Vec<u16>,
    width: usize,
    height: usize,
    palette: Palette,
    histogram: Histogram,
) -> Result<Classification> {
    let grid = Grid::from_labels(labels, width, height, palette)?;
    log::debug!("classified {width}x{height} image, {} biomes present", histogram.iter().count());
    for (biome, n) in histogram.iter() {
        log::trace!("  {}: {n}", biome.name);
    }
    Ok(Classification { grid, histogram })
}
