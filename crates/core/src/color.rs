//! Hex color parsing

use std::fmt;
use thiserror::Error;

/// Errors from [`parse_hex`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("bad hex {0:?}: expected #rgb or #rrggbb")]
    Format(String),

    #[error("bad hex {0:?}: invalid digit")]
    Digit(String),
}

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parse `#rgb` or `#rrggbb`
///
/// Short notation doubles each digit (`#f0a` is `#ff00aa`).
pub fn parse_hex(input: &str) -> Result<Rgb, ColorError> {
    let digits = input
        .strip_prefix('#')
        .filter(|d| d.len() == 3 || d.len() == 6)
        .ok_or_else(|| ColorError::Format(input.to_string()))?;

    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ColorError::Digit(input.to_string()));
    }

    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };

    let value = u32::from_str_radix(&expanded, 16)
        .map_err(|_| ColorError::Digit(input.to_string()))?;

    Ok(Rgb::new(
        (value >> 16) as u8,
        ((value >> 8) & 0xff) as u8,
        (value & 0xff) as u8,
    ))
}
