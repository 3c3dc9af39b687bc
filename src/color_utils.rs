//! Color utility functions shared across the application.
//!
//! Treatment colors arrive from the backend as CSS hex strings and are
//! handed to the whiteboard unchanged, so `Color` keeps the original text
//! next to the parsed channels.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::DEFAULT_STROKE_COLOR;

/// Parse `#rrggbb` or `#rgb` into RGB channels.
pub fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ]),
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let nibble = c.to_digit(16)? as u8;
                rgb[i] = nibble * 17;
            }
            Some(rgb)
        }
        _ => None,
    }
}

/// A display color with its CSS text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Color {
    hex: String,
    rgb: [u8; 3],
}

impl Color {
    /// Parse a CSS hex color.
    pub fn parse(text: &str) -> Option<Self> {
        let rgb = parse_hex(text)?;
        Some(Self {
            hex: text.trim().to_string(),
            rgb,
        })
    }

    /// Parse a CSS hex color, falling back to the whiteboard's default stroke.
    pub fn parse_or_default(text: &str) -> Self {
        Self::parse(text).unwrap_or_else(|| {
            log::warn!("Unusable color '{}', using {}", text, DEFAULT_STROKE_COLOR);
            Self::default()
        })
    }

    /// The CSS text form, as handed to the whiteboard.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// RGB channels.
    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }
}

impl Default for Color {
    fn default() -> Self {
        Self {
            hex: DEFAULT_STROKE_COLOR.to_string(),
            rgb: [0x1e, 0x1e, 0x1e],
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(text.map(|t| Self::parse_or_default(&t)).unwrap_or_default())
    }
}
