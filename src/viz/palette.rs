// ============================================================
// Layer 7 — Heatmap Palettes
// ============================================================
// Five named colour schemes, selectable from the CLI:
//
//   coolwarm  — diverging, cool blue through warm red
//   viridis   — perceptually uniform sequential
//   ylgnbu    — yellow-green-blue sequential
//   magma     — dark sequential
//   cubehelix — cube-helix sequential
//
// Each palette is a small set of colour stops; sampling
// linearly interpolates between the two surrounding stops.
// The stop values are 5-point approximations of the widely
// used palettes of the same names.

use std::fmt;

use anyhow::{bail, Result};

/// One anchor colour along a palette gradient.
#[derive(Clone, Copy)]
pub struct ColorStop {
    pub at: f32,
    pub color: [u8; 3],
}

const fn stop(at: f32, r: u8, g: u8, b: u8) -> ColorStop {
    ColorStop { at, color: [r, g, b] }
}

const COOLWARM_STOPS: [ColorStop; 5] = [
    stop(0.00, 59, 76, 192),
    stop(0.25, 144, 178, 254),
    stop(0.50, 221, 221, 221),
    stop(0.75, 245, 156, 125),
    stop(1.00, 180, 4, 38),
];

const VIRIDIS_STOPS: [ColorStop; 5] = [
    stop(0.00, 68, 1, 84),
    stop(0.25, 59, 82, 139),
    stop(0.50, 33, 145, 140),
    stop(0.75, 94, 201, 98),
    stop(1.00, 253, 231, 37),
];

const YLGNBU_STOPS: [ColorStop; 5] = [
    stop(0.00, 255, 255, 217),
    stop(0.25, 199, 233, 180),
    stop(0.50, 65, 182, 196),
    stop(0.75, 34, 94, 168),
    stop(1.00, 8, 29, 88),
];

const MAGMA_STOPS: [ColorStop; 5] = [
    stop(0.00, 0, 0, 4),
    stop(0.25, 81, 18, 124),
    stop(0.50, 183, 55, 121),
    stop(0.75, 252, 137, 97),
    stop(1.00, 252, 253, 191),
];

const CUBEHELIX_STOPS: [ColorStop; 5] = [
    stop(0.00, 0, 0, 0),
    stop(0.25, 22, 50, 62),
    stop(0.50, 81, 93, 62),
    stop(0.75, 190, 144, 171),
    stop(1.00, 255, 255, 255),
];

/// The enumerated palette set offered by the UI surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Coolwarm,
    Viridis,
    Ylgnbu,
    Magma,
    Cubehelix,
}

impl Palette {
    pub const ALL: [Palette; 5] = [
        Palette::Coolwarm,
        Palette::Viridis,
        Palette::Ylgnbu,
        Palette::Magma,
        Palette::Cubehelix,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Palette::Coolwarm => "coolwarm",
            Palette::Viridis => "viridis",
            Palette::Ylgnbu => "ylgnbu",
            Palette::Magma => "magma",
            Palette::Cubehelix => "cubehelix",
        }
    }

    /// Resolve a palette by its CLI name.
    pub fn from_name(name: &str) -> Result<Self> {
        for palette in Self::ALL {
            if palette.name() == name {
                return Ok(palette);
            }
        }
        let names: Vec<&str> = Self::ALL.iter().map(|p| p.name()).collect();
        bail!("unknown palette '{}'; available palettes: {}", name, names.join(", "));
    }

    fn stops(&self) -> &'static [ColorStop] {
        match self {
            Palette::Coolwarm => &COOLWARM_STOPS,
            Palette::Viridis => &VIRIDIS_STOPS,
            Palette::Ylgnbu => &YLGNBU_STOPS,
            Palette::Magma => &MAGMA_STOPS,
            Palette::Cubehelix => &CUBEHELIX_STOPS,
        }
    }

    /// Sample the gradient at `value` in [0, 1] (clamped).
    pub fn sample(&self, value: f32) -> [u8; 3] {
        sample_gradient(self.stops(), value)
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn lerp(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    let clamped = t.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for (idx, channel) in out.iter_mut().enumerate() {
        let value = a[idx] as f32 + (b[idx] as f32 - a[idx] as f32) * clamped;
        *channel = value.round() as u8;
    }
    out
}

fn sample_gradient(stops: &[ColorStop], value: f32) -> [u8; 3] {
    let clamped = value.clamp(0.0, 1.0);
    if clamped <= stops[0].at {
        return stops[0].color;
    }
    for window in stops.windows(2) {
        if let [start, end] = window {
            if clamped <= end.at {
                let span = (end.at - start.at).max(f32::EPSILON);
                let t = (clamped - start.at) / span;
                return lerp(start.color, end.color, t);
            }
        }
    }
    stops[stops.len() - 1].color
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_hits_endpoints() {
        assert_eq!(Palette::Viridis.sample(0.0), [68, 1, 84]);
        assert_eq!(Palette::Viridis.sample(1.0), [253, 231, 37]);
        assert_eq!(Palette::Coolwarm.sample(0.5), [221, 221, 221]);
    }

    #[test]
    fn test_sample_clamps_out_of_range() {
        assert_eq!(Palette::Magma.sample(-3.0), Palette::Magma.sample(0.0));
        assert_eq!(Palette::Magma.sample(7.0), Palette::Magma.sample(1.0));
    }

    #[test]
    fn test_sample_interpolates_between_stops() {
        // Midway between stops 0.0 and 0.25 of cubehelix
        let mid = Palette::Cubehelix.sample(0.125);
        assert_eq!(mid, [11, 25, 31]);
    }

    #[test]
    fn test_from_name_round_trips() {
        for palette in Palette::ALL {
            assert_eq!(Palette::from_name(palette.name()).unwrap(), palette);
        }
    }

    #[test]
    fn test_from_name_rejects_unknown() {
        let err = Palette::from_name("plasma").unwrap_err();
        assert!(err.to_string().contains("coolwarm"));
    }
}
