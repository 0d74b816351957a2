//! Built-in plugins.

mod config_file;
mod core;
mod html;
mod images;
mod soft_break;

pub use config_file::{ConfigFilePlugin, DefaultSchemeProcessor};
pub use core::{CoreProps, CorePlugin};
pub use html::{HtmlPlugin, HtmlTag, ImageTagHandler, LinkTagHandler, StyleTagHandler, TagHandler};
pub use images::{
    DataUriSchemeHandler, FileSchemeHandler, ImageProps, ImagesPlugin, NetworkSchemeHandler,
    SchemeHandler,
};
pub use soft_break::SoftBreakAddsNewLinePlugin;
