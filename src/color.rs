use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Fixed colour for single-series charts.
pub const ACCENT: Color32 = Color32::from_rgb(31, 119, 180);

// ---------------------------------------------------------------------------
// Category → colour
// ---------------------------------------------------------------------------

/// Assigns each category of a chart its own colour, in the order given.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
}

impl ColorMap {
    pub fn new<'a>(categories: impl IntoIterator<Item = &'a Value>) -> Self {
        let categories: Vec<&Value> = categories.into_iter().collect();
        let palette = generate_palette(categories.len());
        ColorMap {
            mapping: categories
                .into_iter()
                .cloned()
                .zip(palette)
                .collect(),
        }
    }

    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping.get(value).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(6);
        assert_eq!(colors.len(), 6);
        for (i, a) in colors.iter().enumerate() {
            assert!(colors[i + 1..].iter().all(|b| a != b));
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_category_is_grey() {
        let values = [Value::from("UG"), Value::from("PG")];
        let map = ColorMap::new(&values);
        assert_ne!(map.color_for(&values[0]), map.color_for(&values[1]));
        assert_eq!(map.color_for(&Value::from("PhD")), Color32::GRAY);
    }
}
