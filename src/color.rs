use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};
use serde::Serialize;

use crate::data::model::NOISE;

/// Colour used for noise points.
pub const NOISE_COLOR: Rgb = Rgb(0x9e, 0x9e, 0x9e);

/// An 8-bit sRGB colour, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Rgb> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: cluster label → colour
// ---------------------------------------------------------------------------

/// Maps cluster labels to distinct colours; noise is always grey.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<i32, Rgb>,
}

impl ColorMap {
    /// Build a colour map for `clusters` clusters labeled `0..clusters`.
    pub fn for_clusters(clusters: usize) -> Self {
        let mapping = generate_palette(clusters)
            .into_iter()
            .enumerate()
            .map(|(label, c)| (label as i32, c))
            .collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a given cluster label.
    pub fn color_for(&self, cluster: i32) -> Rgb {
        if cluster == NOISE {
            return NOISE_COLOR;
        }
        self.mapping.get(&cluster).copied().unwrap_or(NOISE_COLOR)
    }

    /// Legend entries (label → colour), noise first.
    pub fn legend_entries(&self) -> Vec<(String, Rgb)> {
        std::iter::once(("noise".to_string(), NOISE_COLOR))
            .chain(
                self.mapping
                    .iter()
                    .map(|(label, c)| (format!("cluster {label}"), *c)),
            )
            .collect()
    }
}
