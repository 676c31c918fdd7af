//! Tolerance-gated, lightness-preserving colour replacement.
//!
//! A pixel matches when its euclidean RGB distance to the target colour is
//! at most the tolerance. Matching pixels take the replacement's hue and
//! saturation, while their lightness keeps the same offset from the target
//! that it had before, so shading on the recoloured area survives. Alpha
//! is never touched.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::{
    color::{Color, ParseColorError},
    history::EditOperation,
    hsl::rgb_to_hsl,
    raster::Raster,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplaceError {
    #[error("invalid color {input:?}: {source}")]
    InvalidColor {
        input: String,
        #[source]
        source: ParseColorError,
    },
    #[error("cannot recolor an empty raster")]
    EmptyRaster,
}

/// Maximum euclidean RGB distance for a pixel to count as a match.
///
/// `0` matches only the exact target colour. `255` is special-cased to
/// match every pixel, even those further than 255 away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tolerance(pub u8);

impl Tolerance {
    pub const EXACT: Tolerance = Tolerance(0);
    pub const ALL: Tolerance = Tolerance(u8::MAX);

    pub fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn matches(self, distance_squared: u32) -> bool {
        self == Self::ALL || distance_squared <= (self.0 as u32) * (self.0 as u32)
    }
}

impl From<u8> for Tolerance {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Validated parameters of one replacement pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorReplacement {
    pub target: Color,
    pub replacement: Color,
    pub tolerance: Tolerance,
}

impl ColorReplacement {
    pub fn new(target: Color, replacement: Color, tolerance: Tolerance) -> Self {
        Self {
            target,
            replacement,
            tolerance,
        }
    }

    /// Parse both colours strictly. No fallback interpretation is attempted.
    pub fn parse(
        target: &str,
        replacement: &str,
        tolerance: u8,
    ) -> Result<Self, ReplaceError> {
        Ok(Self::new(
            parse_color(target)?,
            parse_color(replacement)?,
            Tolerance(tolerance),
        ))
    }
}

fn parse_color(input: &str) -> Result<Color, ReplaceError> {
    input.parse().map_err(|source| ReplaceError::InvalidColor {
        input: input.to_string(),
        source,
    })
}

/// Recolour `source` into a freshly allocated raster. `source` is left as is.
pub fn replace_colors(source: &Raster, params: &ColorReplacement) -> Result<Raster, ReplaceError> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(ReplaceError::EmptyRaster);
    }

    let ColorReplacement {
        target,
        replacement,
        tolerance,
    } = *params;
    let target_l = target.to_hsl().l();
    let replacement_hsl = replacement.to_hsl();

    debug!(
        width,
        height,
        %target,
        %replacement,
        %tolerance,
        "replacing colors"
    );

    let mut out = source.as_image().clone();
    let mut recolored = 0usize;
    for px in out.pixels_mut() {
        let [r, g, b, a] = px.0;
        if !tolerance.matches(target.distance_squared(r, g, b)) {
            continue;
        }
        let lightness_diff = rgb_to_hsl(r, g, b).l() - target_l;
        let [nr, ng, nb] = replacement_hsl
            .with_lightness(replacement_hsl.l() + lightness_diff)
            .to_rgb();
        px.0 = [nr, ng, nb, a];
        recolored += 1;
    }

    debug!(recolored, total = source.pixel_count(), "replacement done");

    Raster::from_image(out).map_err(|_| ReplaceError::EmptyRaster)
}

/// Parse the colours, recolour `source` and wrap the result in an
/// [`EditOperation`] ready to be recorded in an
/// [`EditHistory`](crate::history::EditHistory).
pub fn apply(
    source: &Raster,
    target: &str,
    replacement: &str,
    tolerance: u8,
) -> Result<EditOperation, ReplaceError> {
    let params = ColorReplacement::parse(target, replacement, tolerance)?;
    apply_replacement(source, &params)
}

/// Same as [`apply`] with already parsed colours.
pub fn apply_replacement(
    source: &Raster,
    params: &ColorReplacement,
) -> Result<EditOperation, ReplaceError> {
    let result = replace_colors(source, params)?;
    Ok(EditOperation::new(*params, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(pixels: &[[u8; 4]]) -> Raster {
        Raster::from_rgba(pixels.len() as u32, 1, pixels.concat()).unwrap()
    }

    fn pixels(raster: &Raster) -> Vec<[u8; 4]> {
        raster
            .as_bytes()
            .chunks_exact(4)
            .map(|c| [c[0], c[1], c[2], c[3]])
            .collect()
    }

    #[test]
    fn tolerance_bounds() {
        assert!(Tolerance::EXACT.matches(0));
        assert!(!Tolerance::EXACT.matches(1));
        assert!(Tolerance(10).matches(100));
        assert!(!Tolerance(10).matches(101));
        assert!(Tolerance(254).matches(254 * 254));
        assert!(!Tolerance(254).matches(254 * 254 + 1));
        assert!(Tolerance::ALL.matches(3 * 255 * 255));
    }

    #[test]
    fn exact_match_only_at_zero_tolerance() {
        let src = raster(&[[100, 50, 25, 255], [101, 50, 25, 255], [100, 50, 25, 7]]);
        let params = ColorReplacement::parse("#643219", "#00ff00", 0).unwrap();
        let out = pixels(&replace_colors(&src, &params).unwrap());
        assert_ne!(out[0], [100, 50, 25, 255]);
        assert_eq!(out[1], [101, 50, 25, 255]);
        assert_ne!(out[2][..3], [100, 50, 25]);
        assert_eq!(out[2][3], 7);
    }

    #[test]
    fn same_lightness_takes_replacement_verbatim() {
        // pure red and pure blue share l = 0.5
        let src = raster(&[[255, 0, 0, 255], [0, 255, 0, 255]]);
        let params = ColorReplacement::parse("#ff0000", "#0000ff", 10).unwrap();
        let out = pixels(&replace_colors(&src, &params).unwrap());
        assert_eq!(out, vec![[0, 0, 255, 255], [0, 255, 0, 255]]);
    }

    #[test]
    fn keeps_shading_offset() {
        // darker shade of the target stays darker after recolouring
        let src = raster(&[[200, 0, 0, 255], [255, 0, 0, 255]]);
        let params = ColorReplacement::parse("#ff0000", "#00ff00", 60).unwrap();
        let out = pixels(&replace_colors(&src, &params).unwrap());
        assert_eq!(out[1], [0, 255, 0, 255]);
        let [r, g, b, _] = out[0];
        assert_eq!((r, b), (0, 0));
        assert_eq!(g, 200);
    }

    #[test]
    fn lightness_clamps_at_white() {
        // pixel is lighter than the target by more than the replacement can absorb
        let src = raster(&[[0, 255, 255, 255]]);
        let params = ColorReplacement::new(Color::new(0, 0, 0), Color::new(255, 0, 0), Tolerance::ALL);
        let out = pixels(&replace_colors(&src, &params).unwrap());
        assert_eq!(out[0], [255, 255, 255, 255]);
    }

    #[test]
    fn invalid_colors_are_reported_with_input() {
        let src = raster(&[[1, 2, 3, 4]]);
        let err = apply(&src, "red", "#0000ff", 10).unwrap_err();
        assert_eq!(
            err,
            ReplaceError::InvalidColor {
                input: "red".to_string(),
                source: ParseColorError::InvalidDigit('r'),
            }
        );
        assert!(matches!(
            apply(&src, "#ff0000", "#12345", 10),
            Err(ReplaceError::InvalidColor { .. })
        ));
    }

    #[test]
    fn apply_builds_an_edit_record() {
        let src = raster(&[[255, 0, 0, 255]]);
        let op = apply(&src, "#F00", "#0000ff", 3).unwrap();
        assert_eq!(op.source_color(), Color::new(255, 0, 0));
        assert_eq!(op.target_color(), Color::new(0, 0, 255));
        assert_eq!(op.tolerance(), Tolerance(3));
        assert_eq!(op.result().pixel(0, 0), Some([0, 0, 255, 255]));
    }
}
