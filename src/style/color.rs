use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::MapError;

/// Straight (non-premultiplied) RGBA color as understood by style JSON.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Same color with the alpha channel replaced
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self::rgba(self.r, self.g, self.b, alpha)
    }

    /// Parses `#rrggbb`, `#rrggbbaa` or `rgba(r, g, b, a)` / `rgb(r, g, b)`.
    pub fn parse(value: &str) -> crate::Result<Self> {
        let trimmed = value.trim();
        let invalid = || MapError::Config(format!("invalid color '{}'", value));

        if let Some(hex) = trimmed.strip_prefix('#') {
            let channel = |i: usize| {
                hex.get(i..i + 2)
                    .and_then(|c| u8::from_str_radix(c, 16).ok())
                    .ok_or_else(invalid)
            };
            return match hex.len() {
                6 => Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
                8 => Ok(Self::rgba(
                    channel(0)?,
                    channel(2)?,
                    channel(4)?,
                    channel(6)? as f32 / 255.0,
                )),
                _ => Err(invalid()),
            };
        }

        let args = trimmed
            .strip_prefix("rgba(")
            .or_else(|| trimmed.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let byte = |s: &str| s.parse::<u8>().map_err(|_| invalid());
        match parts.as_slice() {
            [r, g, b] => Ok(Self::rgb(byte(r)?, byte(g)?, byte(b)?)),
            [r, g, b, a] => Ok(Self::rgba(
                byte(r)?,
                byte(g)?,
                byte(b)?,
                a.parse::<f32>().map_err(|_| invalid())?,
            )),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Color::parse(&raw).map_err(serde::de::Error::custom)
    }
}
