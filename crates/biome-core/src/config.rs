//! User-facing settings shared by the CLI and the browser binding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::palette::Palette;

/// Default selection-border color (pure green).
pub const DEFAULT_HIGHLIGHT: [u8; 3] = [0, 255, 0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// JSON palette file. `None` selects the built-in 16-biome table.
    pub palette: Option<PathBuf>,
    /// Border highlight color as 8-bit RGB.
    pub highlight: [u8; 3],
    /// Classify rows in parallel when built with the `threading` feature.
    pub parallel: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            palette: None,
            highlight: DEFAULT_HIGHLIGHT,
            parallel: false,
        }
    }
}

impl MapConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Resolve the palette this config names.
    pub fn palette(&self) -> Result<Palette> {
        match &self.palette {
            None => Ok(Palette::builtin().clone()),
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Cannot read palette {}", path.display()))?;
                Palette::from_json(&text).with_context(|| format!("Invalid palette {}", path.display()))
            }
        }
    }

    pub fn highlight_color(&self) -> Color {
        Color::from_rgb8(self.highlight)
    }
}
