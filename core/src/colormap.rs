use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Number of entries in a colormap lookup table.
pub const LUT_SIZE: usize = 256;

/// Pure red, `(1.0, 0.0, 0.0)`.
pub const RED: [f64; 3] = [1.0, 0.0, 0.0];
/// CSS green, `#008000`.
pub const GREEN: [f64; 3] = [0.0, 128.0 / 255.0, 0.0];

/// A colormap built by linear interpolation between evenly spaced anchor colours.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearColormap {
    name: String,
    lut: Vec<RGBColor>,
}

impl LinearColormap {
    /// Interpolate `anchors` (RGB components in [0, 1]) into a `LUT_SIZE` table.
    pub fn from_list(name: impl Into<String>, anchors: &[[f64; 3]]) -> Self {
        let lut = (0..LUT_SIZE)
            .map(|i| {
                let t = i as f64 / (LUT_SIZE - 1) as f64;
                to_rgb(interpolate(anchors, t))
            })
            .collect();

        Self {
            name: name.into(),
            lut,
        }
    }

    pub fn red_to_green() -> Self {
        Self::from_list("red_to_green", &[RED, GREEN])
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Colour for a normalized position. Positions outside [0, 1] saturate.
    pub fn color(&self, t: f64) -> RGBColor {
        let last = self.lut.len() - 1;
        let index = if t.is_nan() || t <= 0.0 {
            0
        } else {
            ((t * self.lut.len() as f64) as usize).min(last)
        };
        self.lut[index]
    }
}

fn interpolate(anchors: &[[f64; 3]], t: f64) -> [f64; 3] {
    match anchors {
        [] => [0.0; 3],
        [only] => *only,
        _ => {
            let segments = (anchors.len() - 1) as f64;
            let scaled = t.clamp(0.0, 1.0) * segments;
            let lower = (scaled.floor() as usize).min(anchors.len() - 2);
            let local = scaled - lower as f64;
            let (a, b) = (anchors[lower], anchors[lower + 1]);
            [
                a[0] + (b[0] - a[0]) * local,
                a[1] + (b[1] - a[1]) * local,
                a[2] + (b[2] - a[2]) * local,
            ]
        }
    }
}

fn to_rgb(components: [f64; 3]) -> RGBColor {
    let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    RGBColor(
        channel(components[0]),
        channel(components[1]),
        channel(components[2]),
    )
}

/// Linear mapping of `[vmin, vmax]` onto `[0, 1]`, clipping anything outside.
///
/// An empty or inverted range never errors: `vmin == vmax` maps everything to
/// 0, and `vmin > vmax` yields a reversed mapping before clipping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    pub fn with_vmax(self, vmax: f64) -> Self {
        Self { vmax, ..self }
    }

    pub fn apply(&self, value: f64) -> f64 {
        if value.is_nan() {
            return f64::NAN;
        }
        if self.vmin == self.vmax {
            return 0.0;
        }
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.vmin >= self.vmax
    }
}

/// Relative luminance of an sRGB colour, used to pick readable annotation ink.
pub fn relative_luminance(color: RGBColor) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(color.0) + 0.7152 * linear(color.1) + 0.0722 * linear(color.2)
}
