//! Conversions between 8-bit RGB and normalized HSL.
//!
//! Both directions are total. The round trip RGB -> HSL -> RGB lands within
//! one unit per channel of the input.

/// Hue, saturation and lightness, each in `0.0..=1.0`.
///
/// Only produced by [`rgb_to_hsl`]; use [`Hsl::with_lightness`] to derive a
/// shifted copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    h: f64,
    s: f64,
    l: f64,
}

impl Hsl {
    pub fn h(&self) -> f64 {
        self.h
    }

    pub fn s(&self) -> f64 {
        self.s
    }

    pub fn l(&self) -> f64 {
        self.l
    }

    /// Same hue and saturation, lightness clamped to `0.0..=1.0`.
    #[must_use]
    pub fn with_lightness(self, l: f64) -> Self {
        Self {
            l: l.clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_rgb(self) -> [u8; 3] {
        hsl_to_rgb(self.h, self.s, self.l)
    }
}

#[inline]
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> Hsl {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        // achromatic
        return Hsl { h: 0.0, s: 0.0, l };
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    Hsl {
        h: (h / 6.0).rem_euclid(1.0),
        s,
        l,
    }
}

#[inline]
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> [u8; 3] {
    let to_u8 = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;

    if s == 0.0 {
        let v = to_u8(l);
        return [v, v, v];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        to_u8(hue_to_channel(p, q, h + 1.0 / 3.0)),
        to_u8(hue_to_channel(p, q, h)),
        to_u8(hue_to_channel(p, q, h - 1.0 / 3.0)),
    ]
}

/// Piecewise hue interpolation between the `p` and `q` anchors.
#[inline]
pub fn hue_to_channel(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}
