//! Display-neutral style descriptors attached to output ranges.
//!
//! A display surface maps each [`Style`] to its own concrete span object.

use std::path::PathBuf;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use serde::{Serialize, Serializer};

use crate::image_size::ImageSize;
use crate::theme::Color;

/// A style annotation value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Style {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Subscript,
    Superscript,
    ForegroundColor {
        color: Color,
    },
    BackgroundColor {
        color: Color,
    },
    /// Text size relative to the base size.
    RelativeSize {
        multiplier: f32,
    },
    Heading {
        level: u8,
    },
    /// Rule drawn under a level 1 or 2 heading.
    HeadingBreak {
        color: Color,
        height: u32,
    },
    /// Inline code.
    Code {
        text_color: Color,
        background_color: Color,
    },
    CodeBlock {
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        text_color: Color,
        background_color: Color,
        margin: u32,
    },
    BlockQuote {
        color: Color,
        width: u32,
        margin: u32,
    },
    ListItem {
        ordered: bool,
        /// Item number of an ordered list.
        #[serde(skip_serializing_if = "Option::is_none")]
        number: Option<u32>,
        /// Nesting depth, 0 for a top-level list.
        level: u32,
        /// Bullet or number color.
        color: Color,
        bullet_width: u32,
        margin: u32,
    },
    ThematicBreak {
        color: Color,
        height: u32,
    },
    Link {
        url: String,
        color: Color,
        underlined: bool,
    },
    Image {
        destination: String,
        /// Where the image bytes come from, when a scheme handler resolved it.
        source: Option<ImageItem>,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<ImageSize>,
    },
    Alignment {
        align: Align,
    },
    /// Plugin-defined style.
    Custom {
        name: String,
        value: serde_json::Value,
    },
}

impl Style {
    /// Returns the serialized `kind` tag of this style.
    pub fn kind(&self) -> &'static str {
        match self {
            Style::Bold => "bold",
            Style::Italic => "italic",
            Style::Strikethrough => "strikethrough",
            Style::Underline => "underline",
            Style::Subscript => "subscript",
            Style::Superscript => "superscript",
            Style::ForegroundColor { .. } => "foreground_color",
            Style::BackgroundColor { .. } => "background_color",
            Style::RelativeSize { .. } => "relative_size",
            Style::Heading { .. } => "heading",
            Style::HeadingBreak { .. } => "heading_break",
            Style::Code { .. } => "code",
            Style::CodeBlock { .. } => "code_block",
            Style::BlockQuote { .. } => "block_quote",
            Style::ListItem { .. } => "list_item",
            Style::ThematicBreak { .. } => "thematic_break",
            Style::Link { .. } => "link",
            Style::Image { .. } => "image",
            Style::Alignment { .. } => "alignment",
            Style::Custom { .. } => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Normal,
    Center,
    Opposite,
}

/// Resolved source of an image.
///
/// Resolution only describes where the bytes live; fetching them is up to
/// the display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageItem {
    /// Fetched over the network.
    Network { url: String },
    /// Read from the local file system.
    File { path: PathBuf },
    /// Decoded in place from a `data:` URI.
    Inline {
        #[serde(skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
        #[serde(serialize_with = "serialize_base64")]
        data: Vec<u8>,
    },
}

fn serialize_base64<T, S>(data: T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&BASE64_STANDARD.encode(data))
}
