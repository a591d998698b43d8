use biome_core::render::{highlight, recolor};
use biome_core::{classify, Classification, Color, Grid, MapConfig, Palette, PixelBuffer, Position, Region, Selector};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// What the page shows next to the cursor after a click.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSummary {
    pub x: usize,
    pub y: usize,
    pub biome: String,
    pub size: usize,
    pub border_cells: usize,
}

fn summarize(grid: &Grid, region: &Region) -> biome_core::Result<SelectionSummary> {
    Ok(SelectionSummary {
        x: region.start.column,
        y: region.start.row,
        biome: region.biome(grid)?.name.clone(),
        size: region.count(),
        border_cells: region.border.len(),
    })
}

fn classify_rgba(data: &[u8], width: usize, height: usize, palette: &Palette) -> biome_core::Result<Classification> {
    let pixels = PixelBuffer::new(data, width, height, 4)?;
    classify(pixels, width, height, palette)
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// One image and its current selection, held by the page between events.
#[wasm_bindgen]
pub struct BiomeSession {
    palette: Palette,
    highlight: Color,
    selector: Selector,
}

#[wasm_bindgen]
impl BiomeSession {
    /// `settings_json` is an optional `MapConfig`-shaped object; an inline
    /// `palette_json` list overrides the built-in table.
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>, palette_json: Option<String>) -> Result<BiomeSession, JsValue> {
        let config: MapConfig = match settings_json {
            Some(text) => serde_json::from_str(&text).map_err(|e| js_err(format!("Invalid settings: {e}")))?,
            None => MapConfig::default(),
        };
        let palette = match palette_json {
            Some(text) => Palette::from_json(&text).map_err(js_err)?,
            None => Palette::builtin().clone(),
        };
        Ok(BiomeSession {
            palette,
            highlight: config.highlight_color(),
            selector: Selector::new(),
        })
    }

    /// Classify an RGBA canvas buffer. Returns `{ biome name: count }`.
    pub fn load_rgba(&mut self, data: &[u8], width: usize, height: usize) -> Result<JsValue, JsValue> {
        let out = classify_rgba(data, width, height, &self.palette).map_err(js_err)?;
        let histogram = serde_wasm_bindgen::to_value(&out.histogram).map_err(js_err)?;
        self.selector.load(out);
        Ok(histogram)
    }

    /// Select the region under (x, y). Returns a `SelectionSummary`.
    pub fn select(&mut self, x: usize, y: usize) -> Result<JsValue, JsValue> {
        let region = self.selector.select(Position::new(x, y)).map_err(js_err)?;
        let grid = self.selector.grid().ok_or_else(|| js_err("no image loaded"))?;
        let summary = summarize(grid, &region).map_err(js_err)?;
        serde_wasm_bindgen::to_value(&summary).map_err(js_err)
    }

    /// Drop the current selection (pointer moved away, zoom changed).
    pub fn clear_selection(&mut self) {
        self.selector.deselect();
    }

    /// Recolored RGB8 pixels with the current selection border highlighted.
    pub fn pixels(&self) -> Vec<u8> {
        let Some(grid) = self.selector.grid() else {
            return Vec::new();
        };
        let mut buf = recolor(grid);
        if let Some(region) = self.selector.selected() {
            highlight(&mut buf, grid.width(), &region.border, self.highlight);
        }
        buf
    }
}
