//! Scalar-to-color lookup table.
//!
//! Named four/five-stop ramps sampled into a fixed-resolution table, with a
//! mutable `[min_v, max_v]` domain. Values outside the domain clamp to the
//! extreme colors; non-finite (missing) values resolve to white.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Color applied to missing/undefined scalars (and to unloaded surfaces).
pub const FALLBACK_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Default number of discrete steps in the lookup table.
pub const DEFAULT_RESOLUTION: usize = 1024;

/// Named color ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Palette {
    CoolToWarm,
    Rainbow,
    Blackbody,
    Grayscale,
}

impl Palette {
    pub const ALL: [Palette; 4] = [
        Palette::CoolToWarm,
        Palette::Rainbow,
        Palette::Blackbody,
        Palette::Grayscale,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Palette::CoolToWarm => "cooltowarm",
            Palette::Rainbow => "rainbow",
            Palette::Blackbody => "blackbody",
            Palette::Grayscale => "grayscale",
        }
    }

    pub fn from_name(name: &str) -> Option<Palette> {
        Palette::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Ordered `(position, 0xRRGGBB)` stops; positions cover `[0, 1]`.
    fn stops(self) -> &'static [(f32, u32)] {
        match self {
            Palette::CoolToWarm => &[
                (0.0, 0x3C4EC2),
                (0.2, 0x9BBCFF),
                (0.5, 0xDCDCDC),
                (0.8, 0xF6A385),
                (1.0, 0xB40426),
            ],
            Palette::Rainbow => &[
                (0.0, 0x0000FF),
                (0.2, 0x00FFFF),
                (0.5, 0x00FF00),
                (0.8, 0xFFFF00),
                (1.0, 0xFF0000),
            ],
            Palette::Blackbody => &[
                (0.0, 0x000000),
                (0.2, 0x780000),
                (0.5, 0xE63200),
                (0.8, 0xFFFF00),
                (1.0, 0xFFFFFF),
            ],
            Palette::Grayscale => &[
                (0.0, 0x000000),
                (0.2, 0x404040),
                (0.5, 0x7F7F80),
                (0.8, 0xBFBFBF),
                (1.0, 0xFFFFFF),
            ],
        }
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn hex_rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    ]
}

fn sample_stops(stops: &[(f32, u32)], alpha: f32) -> [f32; 3] {
    for pair in stops.windows(2) {
        let (a0, c0) = pair[0];
        let (a1, c1) = pair[1];
        if alpha <= a1 {
            let t = if a1 > a0 { (alpha - a0) / (a1 - a0) } else { 0.0 };
            let lo = hex_rgb(c0);
            let hi = hex_rgb(c1);
            return [
                lo[0] + (hi[0] - lo[0]) * t,
                lo[1] + (hi[1] - lo[1]) * t,
                lo[2] + (hi[2] - lo[2]) * t,
            ];
        }
    }
    hex_rgb(stops[stops.len() - 1].1)
}

fn build_table(palette: Palette, resolution: usize) -> Vec<[f32; 3]> {
    let n = resolution.max(2);
    (0..n)
        .map(|i| sample_stops(palette.stops(), i as f32 / (n - 1) as f32))
        .collect()
}

/// Stateful color mapper: current palette plus current domain bounds.
/// The two are independent, changing one never resets the other.
#[derive(Debug, Clone)]
pub struct Lut {
    palette: Palette,
    min_v: f32,
    max_v: f32,
    table: Vec<[f32; 3]>,
}

impl Lut {
    pub fn new(palette: Palette, resolution: usize) -> Self {
        Self {
            palette,
            min_v: 0.0,
            max_v: 1.0,
            table: build_table(palette, resolution),
        }
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    pub fn min_v(&self) -> f32 {
        self.min_v
    }

    pub fn max_v(&self) -> f32 {
        self.max_v
    }

    pub fn set_min(&mut self, min_v: f32) {
        self.min_v = min_v;
    }

    pub fn set_max(&mut self, max_v: f32) {
        self.max_v = max_v;
    }

    pub fn set_domain(&mut self, min_v: f32, max_v: f32) {
        self.min_v = min_v;
        self.max_v = max_v;
    }

    /// Switch ramps, keeping the domain and resolution.
    pub fn set_palette(&mut self, palette: Palette) {
        if palette != self.palette {
            self.palette = palette;
            self.table = build_table(palette, self.table.len());
        }
    }

    /// Discrete table index for `v`, clamped into the domain.
    fn index_for(&self, v: f32) -> usize {
        let span = self.max_v - self.min_v;
        let alpha = if span > 0.0 {
            ((v - self.min_v) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (alpha * (self.table.len() - 1) as f32).round() as usize
    }

    /// Map one scalar to RGB. Out-of-domain values take the extreme colors;
    /// non-finite values take [`FALLBACK_COLOR`].
    pub fn color_for(&self, v: f32) -> [f32; 3] {
        if !v.is_finite() {
            return FALLBACK_COLOR;
        }
        self.table[self.index_for(v)]
    }

    /// Map a whole field, one RGB triple per scalar.
    pub fn map_field(&self, field: &[f32]) -> Vec<[f32; 3]> {
        field.iter().map(|&v| self.color_for(v)).collect()
    }
}

impl Default for Lut {
    fn default() -> Self {
        Self::new(Palette::CoolToWarm, DEFAULT_RESOLUTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_is_monotonic_in_domain() {
        for palette in Palette::ALL {
            let mut lut = Lut::new(palette, 256);
            lut.set_domain(-2.0, 2.0);
            let mut last = 0;
            for step in 0..=40 {
                let v = -2.0 + step as f32 * 0.1;
                let idx = lut.index_for(v);
                assert!(idx >= last, "{palette}: index regressed at v={v}");
                last = idx;
            }
        }
    }

    #[test]
    fn out_of_domain_values_clamp_to_the_extremes() {
        let mut lut = Lut::new(Palette::CoolToWarm, 1024);
        lut.set_domain(-1.0, 1.0);
        assert_eq!(lut.color_for(-5.0), lut.color_for(-1.0));
        assert_eq!(lut.color_for(42.0), lut.color_for(1.0));
        assert_ne!(lut.color_for(-1.0), lut.color_for(1.0));
    }

    #[test]
    fn palette_change_keeps_the_domain_and_back() {
        let mut lut = Lut::new(Palette::CoolToWarm, 64);
        lut.set_domain(-2.0, 2.0);
        lut.set_palette(Palette::Grayscale);
        assert_eq!(lut.min_v(), -2.0);
        assert_eq!(lut.max_v(), 2.0);
        lut.set_domain(-1.0, 1.0);
        assert_eq!(lut.palette(), Palette::Grayscale);
    }

    #[test]
    fn grayscale_endpoints_are_black_and_white() {
        let lut = Lut::new(Palette::Grayscale, 1024);
        assert_eq!(lut.color_for(0.0), [0.0, 0.0, 0.0]);
        assert_eq!(lut.color_for(1.0), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn missing_values_map_to_white() {
        let lut = Lut::default();
        assert_eq!(lut.color_for(f32::NAN), FALLBACK_COLOR);
        let colors = lut.map_field(&[0.5, f32::NAN, f32::INFINITY]);
        assert_eq!(colors.len(), 3);
        assert_eq!(colors[1], FALLBACK_COLOR);
        assert_eq!(colors[2], FALLBACK_COLOR);
    }

    #[test]
    fn palette_names_round_trip() {
        for p in Palette::ALL {
            assert_eq!(Palette::from_name(p.name()), Some(p));
        }
        assert_eq!(Palette::from_name("viridis"), None);
    }

    #[test]
    fn degenerate_domain_does_not_divide_by_zero() {
        let mut lut = Lut::new(Palette::Rainbow, 16);
        lut.set_domain(1.0, 1.0);
        // everything collapses to the low end rather than NaN-indexing
        assert_eq!(lut.color_for(0.0), lut.color_for(5.0));
    }
}
