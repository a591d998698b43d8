//! End-to-end: classify a synthetic image, then select regions on it.

use biome_core::render::{highlight, recolor};
use biome_core::{classify, classify_with, color_from_rgb, nearest_biome, Biome, Color, MapConfig, Palette, PixelBuffer, Position};

/// 6×4 RGB image: a Desert block in the top-left 3×2, Sea elsewhere, with a
/// slightly noisy shade so matching is not exact.
fn synthetic() -> Vec<u8> {
    let mut data = Vec::with_capacity(6 * 4 * 3);
    for row in 0..4 {
        for column in 0..6 {
            let px = if column < 3 && row < 2 { [247, 203, 150] } else { [78, 97, 152] };
            data.extend_from_slice(&px);
        }
    }
    data
}

#[test]
fn counts_sum_to_pixel_total() {
    let data = synthetic();
    let buf = PixelBuffer::new(&data, 6, 4, 3).unwrap();
    let out = classify(buf, 6, 4, Palette::builtin()).unwrap();
    assert_eq!(out.grid.len(), 24);
    assert_eq!(out.histogram.total(), 24);
    assert_eq!(out.histogram.count("Desert"), 6);
    assert_eq!(out.histogram.count("Sea"), 18);
}

#[test]
fn repaint_callback_matches_recolored_grid() {
    let data = synthetic();
    let buf = PixelBuffer::new(&data, 6, 4, 3).unwrap();
    let mut painted = vec![0u8; data.len()];
    let out = classify_with(buf, 6, 4, Palette::builtin(), |cell| {
        let i = (cell.position.row * 6 + cell.position.column) * 3;
        painted[i..i + 3].copy_from_slice(&cell.biome.color.to_rgb8());
    })
    .unwrap();
    assert_eq!(painted, recolor(&out.grid));
}

#[test]
fn selecting_the_desert_block_outlines_its_inner_edge() {
    let data = synthetic();
    let buf = PixelBuffer::new(&data, 6, 4, 3).unwrap();
    let out = classify(buf, 6, 4, Palette::builtin()).unwrap();
    let region = biome_core::find_region(&out.grid, Position::new(0, 0)).unwrap();
    assert_eq!(region.count(), 6);
    // Right column and bottom row of the block touch Sea; (0,0) and (1,0) do not.
    assert_eq!(region.border.len(), 4);
    assert!(!region.border.contains(&Position::new(0, 0)));

    let mut pixels = recolor(&out.grid);
    highlight(&mut pixels, 6, &region.border, MapConfig::default().highlight_color());
    let i = (6 + 2) * 3; // (2, 1)
    assert_eq!(&pixels[i..i + 3], &[0, 255, 0]);
}

#[test]
fn channel_validation_and_nearest_match() {
    assert_eq!(color_from_rgb(0, 255, 0).unwrap(), Color::new(0.0, 1.0, 0.0));
    assert!(color_from_rgb(256, 0, 0).is_err());

    let palette = [
        Biome::new("A", Color::new(0.0, 0.0, 0.0)),
        Biome::new("B", Color::new(1.0, 1.0, 1.0)),
    ];
    assert_eq!(nearest_biome(Color::new(0.1, 0.1, 0.1), &palette).unwrap().name, "A");
}
