//! Normalized RGB colors and the Euclidean color metric.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An RGB color with each channel in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }

    /// Infallible conversion from 8-bit channels, as read from a decoded image.
    pub fn from_rgb8([r, g, b]: [u8; 3]) -> Self {
        Self::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    /// Back to 8-bit channels, rounding to nearest and clamping to [0, 255].
    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.red), q(self.green), q(self.blue)]
    }

    /// Euclidean distance in (red, green, blue) space.
    pub fn distance(self, other: Color) -> f64 {
        let dr = self.red - other.red;
        let dg = self.green - other.green;
        let db = self.blue - other.blue;
        (dr * dr + dg * dg + db * db).sqrt()
    }
}

/// Build a color from integer channels, each of which must lie in 0..=255.
pub fn color_from_rgb(red: i32, green: i32, blue: i32) -> Result<Color> {
    let channel = |name: &str, v: i32| -> Result<f64> {
        if (0..=255).contains(&v) {
            Ok(v as f64 / 255.0)
        } else {
            Err(Error::invalid(format!("{name} channel {v} is outside 0..=255")))
        }
    };
    Ok(Color::new(
        channel("red", red)?,
        channel("green", green)?,
        channel("blue", blue)?,
    ))
}

/// Return the item with the smallest `metric`, keeping the earliest on ties.
///
/// `Iterator::min_by` keeps the *last* of equal elements, which would make
/// classification depend on where duplicates sit in the palette.
pub fn min_by_metric<I, F>(items: I, mut metric: F) -> Option<I::Item>
where
    I: IntoIterator,
    F: FnMut(&I::Item) -> f64,
{
    let mut best: Option<(I::Item, f64)> = None;
    for item in items {
        let score = metric(&item);
        let better = match &best {
            Some((_, s)) => score < *s,
            None => true,
        };
        if better {
            best = Some((item, score));
        }
    }
    best.map(|(item, _)| item)
}
