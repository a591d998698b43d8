//! RGB8 buffers for the display layer: recolored grids and region overlays.

use crate::color::Color;
use crate::grid::{Grid, Position};

/// Row-major RGB8 buffer with every cell painted in its biome's reference color.
pub fn recolor(grid: &Grid) -> Vec<u8> {
    let lut: Vec<[u8; 3]> = grid.palette().iter().map(|b| b.color.to_rgb8()).collect();
    let mut out = Vec::with_capacity(grid.len() * 3);
    for row in 0..grid.height() {
        for column in 0..grid.width() {
            out.extend_from_slice(&lut[grid.label(Position::new(column, row)) as usize]);
        }
    }
    out
}

/// Paint `positions` in `color`. Positions outside a `width`-wide buffer
/// are skipped.
pub fn highlight<'a, I>(buf: &mut [u8], width: usize, positions: I, color: Color)
where
    I: IntoIterator<Item = &'a Position>,
{
    let rgb = color.to_rgb8();
    let height = if width == 0 { 0 } else { buf.len() / (width * 3) };
    for p in positions {
        if p.column < width && p.row < height {
            let i = (p.row * width + p.column) * 3;
            buf[i..i + 3].copy_from_slice(&rgb);
        }
    }
}

/// Repaint `positions` with their biome colors, undoing [`highlight`].
pub fn restore<'a, I>(buf: &mut [u8], grid: &Grid, positions: I)
where
    I: IntoIterator<Item = &'a Position>,
{
    for p in positions {
        if let Ok(biome) = grid.biome(*p) {
            let i = (p.row * grid.width() + p.column) * 3;
            if i + 3 <= buf.len() {
                buf[i..i + 3].copy_from_slice(&biome.color.to_rgb8());
            }
        }
    }
}
