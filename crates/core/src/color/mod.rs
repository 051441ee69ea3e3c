use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{MicrotoneError, Result};

/// Brightening applied to the middle gradient colour to obtain the hover colour.
pub const HOVER_BRIGHTEN: u8 = 80;
/// Brightening applied to the middle gradient colour to obtain the pressed colour.
pub const PRESSED_BRIGHTEN: u8 = 160;

/// 8-bit RGB colour, written and parsed as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0x00, 0x00, 0x00);
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const RED: Rgb = Rgb::new(0xff, 0x00, 0x00);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Adds `amount` to every channel, saturating at 255.
    pub fn brighten(self, amount: u8) -> Self {
        Self {
            r: self.r.saturating_add(amount),
            g: self.g.saturating_add(amount),
            b: self.b.saturating_add(amount),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = MicrotoneError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| MicrotoneError::invalid(format!("colour `{s}` must start with `#`")))?;

        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MicrotoneError::invalid(format!(
                "colour `{s}` must have the form #rrggbb"
            )));
        }

        let channel = |start: usize| {
            u8::from_str_radix(&hex[start..start + 2], 16)
                .map_err(|_| MicrotoneError::invalid(format!("colour `{s}` is not hexadecimal")))
        };

        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = MicrotoneError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Linear per-channel ramp between two colours over a fixed number of steps.
///
/// Channel steps are fractional; each step truncates towards zero and clamps
/// into `0..=255`, so the last step lands exactly on the end colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    start: Rgb,
    end: Rgb,
    steps: usize,
}

impl Gradient {
    pub fn new(start: Rgb, end: Rgb, steps: usize) -> Self {
        Self { start, end, steps }
    }

    /// Colour at position `index`; indices past `steps` keep extrapolating
    /// and are clamped per channel.
    pub fn at(&self, index: usize) -> Rgb {
        let steps = self.steps.max(1) as f64;
        let channel = |start: u8, end: u8| {
            let span = f64::from(end) - f64::from(start);
            let value = f64::from(start) + span * index as f64 / steps;
            value.trunc().clamp(0.0, 255.0) as u8
        };

        Rgb::new(
            channel(self.start.r, self.end.r),
            channel(self.start.g, self.end.g),
            channel(self.start.b, self.end.b),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_hex_colours() {
        let colour: Rgb = "#1111ff".parse().unwrap();
        assert_eq!(colour, Rgb::new(0x11, 0x11, 0xff));
        assert_eq!(colour.to_string(), "#1111ff");
    }

    #[test]
    fn rejects_malformed_colours() {
        for text in ["1111ff", "#12345", "#gg0000", "#1234567", "#+f+f+f", "#-1-1-1"] {
            let err = text.parse::<Rgb>().unwrap_err();
            assert!(err.is_invalid_input(), "{text} should be rejected");
        }
    }

    #[test]
    fn brighten_saturates() {
        let colour = Rgb::new(0x10, 0xc0, 0xf0).brighten(HOVER_BRIGHTEN);
        assert_eq!(colour, Rgb::new(0x60, 0xff, 0xff));
    }

    #[test]
    fn gradient_spans_start_to_end() {
        let gradient = Gradient::new(Rgb::new(0x11, 0x11, 0xff), Rgb::new(0xff, 0x11, 0xff), 12);
        assert_eq!(gradient.at(0), Rgb::new(0x11, 0x11, 0xff));
        assert_eq!(gradient.at(12), Rgb::new(0xff, 0x11, 0xff));

        let middle = gradient.at(6);
        assert!(middle.r > 0x11 && middle.r < 0xff);
    }

    #[test]
    fn serialises_as_string() {
        let json = serde_json::to_string(&Rgb::new(0xaa, 0xbb, 0xcc)).unwrap();
        assert_eq!(json, "\"#aabbcc\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(0xaa, 0xbb, 0xcc));
    }
}
