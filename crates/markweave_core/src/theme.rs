//! Theme values shared by every span factory.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ConfigError;

/// An ARGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const RED: Color = Color(0xFFFF_0000);
    pub const GREEN: Color = Color(0xFF00_FF00);
    pub const BLUE: Color = Color(0xFF00_00FF);
    pub const TRANSPARENT: Color = Color(0);

    /// Creates a color from its channels.
    pub const fn argb(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self(((alpha as u32) << 24) | ((red as u32) << 16) | ((green as u32) << 8) | blue as u32)
    }

    /// Creates an opaque color.
    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::argb(0xFF, red, green, blue)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Returns this color with its alpha channel replaced.
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Self((self.0 & 0x00FF_FFFF) | ((alpha as u32) << 24))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

/// Parses `#RRGGBB` (opaque) or `#AARRGGBB`.
impl FromStr for Color {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        match hex.len() {
            6 => Ok(Color(0xFF00_0000 | value)),
            8 => Ok(Color(value)),
            _ => Err(invalid()),
        }
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
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable theme snapshot.
///
/// Sizes are in display units chosen by the surface that consumes the
/// output; text-size values are multipliers of the base text size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub link_color: Color,
    pub link_underlined: bool,
    /// Leading margin of block quotes and list items.
    pub block_margin: u32,
    pub block_quote_width: u32,
    pub block_quote_color: Color,
    pub list_item_color: Color,
    pub bullet_width: u32,
    pub code_text_color: Color,
    pub code_background_color: Color,
    pub code_block_text_color: Color,
    pub code_block_background_color: Color,
    pub code_block_margin: u32,
    pub code_text_size_multiplier: f32,
    /// Height of the rule drawn under level 1 and 2 headings.
    pub heading_break_height: u32,
    pub heading_break_color: Color,
    /// Text-size multipliers for heading levels 1 to 6.
    pub heading_text_size_multipliers: [f32; 6],
    pub thematic_break_color: Color,
    pub thematic_break_height: u32,
}

impl Theme {
    pub const DEFAULT_HEADING_TEXT_SIZE_MULTIPLIERS: [f32; 6] = [2.0, 1.5, 1.17, 1.0, 0.83, 0.67];

    pub fn builder() -> ThemeBuilder {
        ThemeBuilder::new()
    }

    /// Returns the text-size multiplier for a heading level, clamped to 1..=6.
    pub fn heading_text_size(&self, level: u8) -> f32 {
        let index = usize::from(level.clamp(1, 6)) - 1;
        self.heading_text_size_multipliers[index]
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            link_color: Color(0xFF1E_88E5),
            link_underlined: true,
            block_margin: 24,
            block_quote_width: 6,
            block_quote_color: Color::BLACK.with_alpha(25),
            list_item_color: Color::BLACK,
            bullet_width: 8,
            code_text_color: Color(0xFF37_474F),
            code_background_color: Color::BLACK.with_alpha(15),
            code_block_text_color: Color(0xFF37_474F),
            code_block_background_color: Color::BLACK.with_alpha(15),
            code_block_margin: 24,
            code_text_size_multiplier: 0.87,
            heading_break_height: 1,
            heading_break_color: Color::BLACK.with_alpha(75),
            heading_text_size_multipliers: Self::DEFAULT_HEADING_TEXT_SIZE_MULTIPLIERS,
            thematic_break_color: Color::BLACK.with_alpha(25),
            thematic_break_height: 1,
        }
    }
}

/// Accumulates theme overrides while plugins are configured.
///
/// Every setter replaces the previous value; untouched values keep the
/// [`Theme::default`] values.
#[derive(Debug, Clone, Default)]
pub struct ThemeBuilder {
    theme: Theme,
}

macro_rules! theme_setters {
    ($($(#[$meta:meta])* $name:ident: $ty:ty),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&mut self, value: $ty) -> &mut Self {
                self.theme.$name = value;
                self
            }
        )*
    };
}

impl ThemeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    theme_setters! {
        link_color: Color,
        link_underlined: bool,
        block_margin: u32,
        block_quote_width: u32,
        block_quote_color: Color,
        list_item_color: Color,
        bullet_width: u32,
        code_text_color: Color,
        code_background_color: Color,
        code_block_text_color: Color,
        code_block_background_color: Color,
        code_block_margin: u32,
        code_text_size_multiplier: f32,
        heading_break_height: u32,
        heading_break_color: Color,
        /// Multipliers for heading levels 1 to 6.
        heading_text_size_multipliers: [f32; 6],
        thematic_break_color: Color,
        thematic_break_height: u32,
    }

    /// Freezes the accumulated values.
    pub fn build(self) -> Theme {
        self.theme
    }
}
