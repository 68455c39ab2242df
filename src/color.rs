//! RGB color value.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::gamma::degamma;

/// RGB color.
#[derive(Default, PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Apply the brightness correction curve to every channel.
    pub fn degamma(self) -> Self {
        Self { r: degamma(self.r), g: degamma(self.g), b: degamma(self.b) }
    }

    /// Channels in `[r, g, b]` order.
    pub const fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Color string is not in `0xRRGGBB` or `#RRGGBB` format.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("color '{0}' does not match format 0xRRGGBB")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Rgb, ParseRgbError> {
        let chars = match s.strip_prefix("0x").or_else(|| s.strip_prefix('#')) {
            Some(chars) if chars.len() == 6 => chars,
            _ => return Err(ParseRgbError(s.into())),
        };

        match u32::from_str_radix(chars, 16) {
            Ok(mut color) => {
                let b = (color & 0xff) as u8;
                color >>= 8;
                let g = (color & 0xff) as u8;
                color >>= 8;
                let r = color as u8;
                Ok(Rgb { r, g, b })
            },
            Err(_) => Err(ParseRgbError(s.into())),
        }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
