//! Biome palette: the fixed, ordered table of labeled reference colors.
//!
//! Nearest-match lookup scans the palette in order and keeps the first of
//! several equidistant entries, so classification is reproducible for a
//! given palette order.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::color::{color_from_rgb, min_by_metric, Color};
use crate::error::{Error, Result};

/// A named reference color used as a classification label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Biome {
    pub name: String,
    pub color: Color,
}

impl Biome {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self { name: name.into(), color }
    }
}

/// Find the biome whose reference color is closest to `color`.
///
/// Ties resolve to the earliest biome in `palette`. Fails with
/// `InvalidInput` when `palette` is empty.
pub fn nearest_biome(color: Color, palette: &[Biome]) -> Result<&Biome> {
    nearest_index(color, palette).map(|i| &palette[i])
}

fn nearest_index(color: Color, palette: &[Biome]) -> Result<usize> {
    min_by_metric(palette.iter().enumerate(), |(_, b)| b.color.distance(color))
        .map(|(i, _)| i)
        .ok_or_else(|| Error::invalid("palette is empty"))
}

// ── Built-in table ────────────────────────────────────────────────────────────

const BUILTIN: [(&str, [i32; 3]); 16] = [
    ("Frozen wastes", [255, 255, 250]),
    ("City", [145, 145, 145]),
    ("Tundra", [85, 85, 70]),
    ("Mountains", [80, 80, 75]),
    ("Hills", [195, 145, 115]),
    ("Deep Ocean", [20, 35, 80]),
    ("Ocean", [40, 65, 120]),
    ("Sea", [75, 100, 150]),
    ("Forest", [50, 65, 50]),
    ("Swamp", [35, 55, 65]),
    ("Jungle", [40, 65, 45]),
    ("Grassland", [75, 90, 75]),
    ("Plains", [140, 145, 110]),
    ("Desert", [250, 200, 155]),
    ("Steppe", [100, 100, 90]),
    ("Savanna", [130, 125, 100]),
];

static BUILTIN_PALETTE: OnceLock<Palette> = OnceLock::new();

// ── Palette ───────────────────────────────────────────────────────────────────

/// A non-empty, ordered sequence of biomes with unique names.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    biomes: Vec<Biome>,
}

/// On-disk palette entry: integer channels, validated on load.
#[derive(Debug, Serialize, Deserialize)]
struct PaletteEntry {
    name: String,
    rgb: [i32; 3],
}

impl Palette {
    /// Validate and wrap an ordered biome list.
    pub fn new(biomes: Vec<Biome>) -> Result<Self> {
        if biomes.is_empty() {
            return Err(Error::invalid("palette is empty"));
        }
        if biomes.len() > u16::MAX as usize {
            return Err(Error::invalid(format!("palette of {} biomes is too large", biomes.len())));
        }
        let mut seen = HashSet::with_capacity(biomes.len());
        for b in &biomes {
            if !seen.insert(b.name.as_str()) {
                return Err(Error::invalid(format!("duplicate biome name {:?}", b.name)));
            }
        }
        Ok(Self { biomes })
    }

    /// The process-wide 16-biome table.
    pub fn builtin() -> &'static Palette {
        BUILTIN_PALETTE.get_or_init(|| {
            let biomes = BUILTIN
                .iter()
                .map(|&(name, [r, g, b])| {
                    let color = Color::from_rgb8([r as u8, g as u8, b as u8]);
                    Biome::new(name, color)
                })
                .collect();
            Palette { biomes }
        })
    }

    /// Parse a JSON list of `{ "name": ..., "rgb": [r, g, b] }` entries.
    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<PaletteEntry> = serde_json::from_str(text)
            .map_err(|e| Error::invalid(format!("malformed palette: {e}")))?;
        let biomes = entries
            .into_iter()
            .map(|e| {
                let [r, g, b] = e.rgb;
                Ok(Biome::new(e.name, color_from_rgb(r, g, b)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(biomes)
    }

    /// Serialize in the format [`Palette::from_json`] reads.
    pub fn to_json(&self) -> Result<String> {
        let entries: Vec<PaletteEntry> = self
            .biomes
            .iter()
            .map(|b| {
                let [r, g, bl] = b.color.to_rgb8();
                PaletteEntry { name: b.name.clone(), rgb: [r as i32, g as i32, bl as i32] }
            })
            .collect();
        serde_json::to_string_pretty(&entries)
            .map_err(|e| Error::invalid(format!("cannot serialize palette: {e}")))
    }

    pub fn as_slice(&self) -> &[Biome] {
        &self.biomes
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.biomes.iter().position(|b| b.name == name)
    }

    /// Palette index of the nearest biome. Never fails: a `Palette` is non-empty.
    pub fn nearest(&self, color: Color) -> usize {
        nearest_index(color, &self.biomes).unwrap_or(0)
    }
}

impl std::ops::Deref for Palette {
    type Target = [Biome];

    fn deref(&self) -> &[Biome] {
        &self.biomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone() -> Vec<Biome> {
        vec![
            Biome::new("A", Color::new(0.0, 0.0, 0.0)),
            Biome::new("B", Color::new(1.0, 1.0, 1.0)),
        ]
    }

    #[test]
    fn nearest_picks_closest_reference() {
        let palette = two_tone();
        let got = nearest_biome(Color::new(0.1, 0.1, 0.1), &palette).unwrap();
        assert_eq!(got.name, "A");
        let got = nearest_biome(Color::new(0.8, 0.9, 0.7), &palette).unwrap();
        assert_eq!(got.name, "B");
    }

    #[test]
    fn exact_reference_color_maps_to_itself() {
        let palette = Palette::builtin();
        for biome in palette.iter() {
            let got = nearest_biome(biome.color, palette).unwrap();
            assert_eq!(got, biome);
        }
    }

    #[test]
    fn equidistant_match_resolves_to_first_entry() {
        let grey = Color::new(0.5, 0.5, 0.5);
        let palette = vec![
            Biome::new("first", grey),
            Biome::new("second", grey),
            Biome::new("far", Color::new(0.0, 0.0, 0.0)),
        ];
        assert_eq!(nearest_biome(grey, &palette).unwrap().name, "first");

        // Midpoint between two distinct references.
        let palette = two_tone();
        let mid = Color::new(0.5, 0.5, 0.5);
        assert_eq!(nearest_biome(mid, &palette).unwrap().name, "A");
    }

    #[test]
    fn empty_palette_is_invalid_input() {
        let err = nearest_biome(Color::new(0.0, 0.0, 0.0), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(matches!(Palette::new(Vec::new()), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut biomes = two_tone();
        biomes.push(Biome::new("A", Color::new(0.2, 0.2, 0.2)));
        assert!(matches!(Palette::new(biomes), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn builtin_table_has_sixteen_unique_biomes() {
        let palette = Palette::builtin();
        assert_eq!(palette.len(), 16);
        assert!(Palette::new(palette.as_slice().to_vec()).is_ok());
        assert_eq!(palette[0].name, "Frozen wastes");
        assert_eq!(palette.index_of("Ocean"), Some(6));
        assert_eq!(palette[6].color.to_rgb8(), [40, 65, 120]);
    }

    #[test]
    fn json_palette_loads_and_validates_channels() {
        let text = r#"[{"name": "Sea", "rgb": [75, 100, 150]}, {"name": "Sand", "rgb": [250, 200, 155]}]"#;
        let palette = Palette::from_json(text).unwrap();
        assert_eq!(palette.len(), 2);
        assert_eq!(palette[1].name, "Sand");
        let text = palette.to_json().unwrap();
        assert!(text.contains(r#""name": "Sand""#));
        assert_eq!(Palette::from_json(&text).unwrap(), palette);

        let bad = r#"[{"name": "Sea", "rgb": [75, 100, 256]}]"#;
        assert!(matches!(Palette::from_json(bad), Err(Error::InvalidInput(_))));
        assert!(matches!(Palette::from_json("[]"), Err(Error::InvalidInput(_))));
        assert!(matches!(Palette::from_json("{"), Err(Error::InvalidInput(_))));
    }
}
