//! Net-migration color scale.
//!
//! The ratio `positive / negative` is cubed and scaled so that a balanced region
//! sits at hue 60 (yellow), net loss moves toward 0 (red) and net gain toward
//! 120 (green). Saturation and lightness are fixed.

use serde::{Serialize, Serializer};
use std::fmt;

pub const HUE_MIN: f64 = 0.0;
pub const HUE_MAX: f64 = 120.0;
pub const HUE_BALANCED: f64 = 60.0;

pub const SATURATION: f64 = 0.70;
pub const LIGHTNESS: f64 = 0.50;

/// Color for regions without a statistics match. Kept off the hue scale so a
/// missing record is never mistaken for maximal loss.
pub const NO_DATA: Rgb8 = Rgb8 {
    r: 0x99,
    g: 0x99,
    b: 0x99,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl Serialize for Rgb8 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h_deg: f64, // 0..360
    pub s: f64,     // 0..1
    pub l: f64,     // 0..1
}

/// Hue in `[0, 120]` for the given inflow/outflow counts.
pub fn hue_for(positive: u64, negative: u64) -> f64 {
    if negative == 0 {
        return if positive > 0 { HUE_MAX } else { HUE_MIN };
    }
    let ratio = positive as f64 / negative as f64;
    (ratio.powi(3) * HUE_BALANCED).clamp(HUE_MIN, HUE_MAX)
}

/// RGB color for a hue on the fixed saturation/lightness of the scale.
pub fn hue_to_color(hue: f64) -> Rgb8 {
    hsl_to_rgb8(Hsl {
        h_deg: hue,
        s: SATURATION,
        l: LIGHTNESS,
    })
}

/// Convenience: counts straight to a color.
pub fn color_for(positive: u64, negative: u64) -> Rgb8 {
    hue_to_color(hue_for(positive, negative))
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Standard HSL to 8-bit RGB; hue wraps, saturation and lightness are clamped.
pub fn hsl_to_rgb8(hsl: Hsl) -> Rgb8 {
    let h = hsl.h_deg.rem_euclid(360.0) / 360.0;
    let s = clamp01(hsl.s);
    let l = clamp01(hsl.l);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return Rgb8 { r: v, g: v, b: v };
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 1.0 / 2.0 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    Rgb8 {
        r: (r * 255.0).round() as u8,
        g: (g * 255.0).round() as u8,
        b: (b * 255.0).round() as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_denominators() {
        assert_eq!(hue_for(0, 0), 0.0);
        assert_eq!(hue_for(5, 0), 120.0);
    }

    #[test]
    fn balance_is_midpoint() {
        assert_eq!(hue_for(7, 7), 60.0);
        assert_eq!(hue_for(1, 1), 60.0);
    }

    #[test]
    fn large_surplus_is_clamped() {
        assert_eq!(hue_for(1000, 1), 120.0);
        assert_eq!(hue_for(0, 9), 0.0);
    }

    #[test]
    fn endpoints_of_the_scale() {
        // hsl(0, 70%, 50%) and hsl(120, 70%, 50%)
        assert_eq!(hue_to_color(0.0), Rgb8 { r: 217, g: 38, b: 38 });
        assert_eq!(hue_to_color(120.0), Rgb8 { r: 38, g: 217, b: 38 });
        assert_eq!(hue_to_color(60.0).hex(), "#D9D926");
    }
}
