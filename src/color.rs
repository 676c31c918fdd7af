use std::{fmt, str::FromStr};

use itertools::Itertools;
use thiserror::Error;

use crate::hsl::{rgb_to_hsl, Hsl};

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseColorError {
    #[error("empty color string")]
    Empty,
    #[error("expected 3 or 6 hex digits, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex digit {0:?}")]
    InvalidDigit(char),
}

/// An opaque 8-bit sRGB color.
///
/// Parsed from `#rrggbb` / `#rgb` (the `#` is optional, digits are
/// case-insensitive) and displayed as lower-case `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: &str) -> Result<Self, ParseColorError> {
        hex.parse()
    }

    pub fn to_hex(self) -> String {
        self.to_string()
    }

    pub fn to_hsl(self) -> Hsl {
        rgb_to_hsl(self.r, self.g, self.b)
    }

    /// Squared euclidean distance in raw RGB space.
    pub fn distance_squared(self, r: u8, g: u8, b: u8) -> u32 {
        let dr = self.r.abs_diff(r) as u32;
        let dg = self.g.abs_diff(g) as u32;
        let db = self.b.abs_diff(b) as u32;
        dr * dr + dg * dg + db * db
    }
}

fn nibble(c: u8) -> Result<u8, ParseColorError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(ParseColorError::InvalidDigit(c as char)),
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.is_empty() {
            return Err(ParseColorError::Empty);
        }
        if !digits.is_ascii() {
            // report the first offending char rather than a byte length
            let bad = digits.chars().find(|c| !c.is_ascii()).unwrap_or('?');
            return Err(ParseColorError::InvalidDigit(bad));
        }

        let bytes = digits.as_bytes();
        let channel = |hi: u8, lo: u8| -> Result<u8, ParseColorError> {
            Ok((nibble(hi)? << 4) | nibble(lo)?)
        };
        let (r, g, b) = match bytes.len() {
            // #rgb expands each nibble: a -> aa
            3 => bytes.iter().map(|&c| channel(c, c)).collect_tuple(),
            6 => bytes
                .chunks_exact(2)
                .map(|pair| channel(pair[0], pair[1]))
                .collect_tuple(),
            len => return Err(ParseColorError::InvalidLength(len)),
        }
        .ok_or(ParseColorError::InvalidLength(bytes.len()))?;

        Ok(Self {
            r: r?,
            g: g?,
            b: b?,
        })
    }
}

impl TryFrom<&str> for Color {
    type Error = ParseColorError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(px: image::Rgba<u8>) -> Self {
        let [r, g, b, _] = px.0;
        Self { r, g, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_form_with_and_without_marker() {
        assert_eq!("#a1b2c3".parse::<Color>().unwrap(), Color::new(0xa1, 0xb2, 0xc3));
        assert_eq!("a1b2c3".parse::<Color>().unwrap(), Color::new(0xa1, 0xb2, 0xc3));
        assert_eq!("#A1B2C3".parse::<Color>().unwrap(), Color::new(0xa1, 0xb2, 0xc3));
    }

    #[test]
    fn expands_shorthand() {
        assert_eq!("#abc".parse::<Color>().unwrap(), Color::new(0xaa, 0xbb, 0xcc));
        assert_eq!("f00".parse::<Color>().unwrap(), Color::new(255, 0, 0));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("red".parse::<Color>(), Err(ParseColorError::InvalidDigit('r')));
        assert_eq!("".parse::<Color>(), Err(ParseColorError::Empty));
        assert_eq!("#".parse::<Color>(), Err(ParseColorError::Empty));
        assert_eq!("#ff00".parse::<Color>(), Err(ParseColorError::InvalidLength(4)));
        assert_eq!("#ff00000".parse::<Color>(), Err(ParseColorError::InvalidLength(7)));
        assert_eq!("#gg0000".parse::<Color>(), Err(ParseColorError::InvalidDigit('g')));
        assert_eq!("#ff 000".parse::<Color>(), Err(ParseColorError::InvalidDigit(' ')));
        assert_eq!("#ffé00".parse::<Color>(), Err(ParseColorError::InvalidDigit('é')));
    }

    #[test]
    fn reports_first_bad_digit_in_channel_order() {
        assert_eq!("#12g4z6".parse::<Color>(), Err(ParseColorError::InvalidDigit('g')));
        assert_eq!("#1234zg".parse::<Color>(), Err(ParseColorError::InvalidDigit('z')));
        assert_eq!("#axz".parse::<Color>(), Err(ParseColorError::InvalidDigit('x')));
        assert_eq!("#0f8".parse::<Color>().unwrap(), Color::new(0x00, 0xff, 0x88));
    }

    #[test]
    fn no_prefix_slicing_fallback() {
        // "#ff0000zz" must not be read as its first six digits
        assert!("#ff0000zz".parse::<Color>().is_err());
    }

    #[test]
    fn displays_lower_case_hex() {
        assert_eq!(Color::new(0xa1, 0x0b, 0xff).to_string(), "#a10bff");
        let c: Color = "#ABC".parse().unwrap();
        assert_eq!(c.to_hex(), "#aabbcc");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Color::new(10, 20, 30);
        assert_eq!(a.distance_squared(13, 24, 30), 25);
        assert_eq!(Color::new(13, 24, 30).distance_squared(10, 20, 30), 25);
        assert_eq!(Color::new(0, 0, 0).distance_squared(255, 255, 255), 3 * 255 * 255);
    }
}
