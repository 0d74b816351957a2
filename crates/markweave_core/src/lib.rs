//! # markweave_core
//!
//! Plugin-driven rendering of Markdown trees into text plus style spans.
//!
//! This crate provides:
//! - The [`Plugin`] contract and the [`PluginRegistry`] that orders plugins
//!   by dependency and priority
//! - Builders for the render [`Configuration`], [`Theme`], [`VisitorTable`]
//!   and [`SpanFactoryTable`]
//! - The [`RenderEngine`] that walks a tree and records [`Style`] spans
//! - Built-in plugins (core nodes, images, raw HTML, config files)
//! - Configuration loading (`.markweave.jsonc`)
//!
//! ## Example
//!
//! ```rust
//! use markweave_core::Markweave;
//! use markweave_core::plugins::{HtmlPlugin, ImagesPlugin};
//!
//! let markweave = Markweave::builder()
//!     .use_plugin(ImagesPlugin::new())
//!     .use_plugin(HtmlPlugin::new())
//!     .build()
//!     .unwrap();
//!
//! let output = markweave.render_markdown("# Title\n\nSome **bold** text").unwrap();
//! assert_eq!(output.text, "Title\n\nSome bold text");
//! assert_eq!(output.spans_of_kind("bold").count(), 1);
//! ```

mod config;
mod configuration;
mod engine;
mod error;
mod handler_table;
mod image_size;
mod pipeline;
mod plugin;
pub mod plugins;
mod props;
mod registry;
mod span_table;
mod style;
mod theme;
mod visitor_table;

pub use config::{CONFIG_FILES, RenderConfig, ThemeOverrides};
pub use configuration::{
    Configuration, ConfigurationBuilder, HighlightSpan, SyntaxHighlight, SyntaxHighlightNoOp,
    UrlProcessor, UrlProcessorNoOp,
};
pub use engine::{RenderEngine, RenderOutput, SpanRecord, VisitContext};
pub use error::{BuildError, ConfigError, RenderError};
pub use handler_table::HandlerTable;
pub use image_size::{Bounds, Dimension, ImageSize, ImageSizeResolver, ImageSizeResolverDef};
pub use pipeline::{Markweave, MarkweaveBuilder};
pub use plugin::{Builders, CapabilityId, Plugin};
pub use props::{Prop, RenderProps};
pub use registry::PluginRegistry;
pub use span_table::{SpanFactory, SpanFactoryTable, SpanFactoryTableBuilder};
pub use style::{Align, ImageItem, Style};
pub use theme::{Color, Theme, ThemeBuilder};
pub use visitor_table::{NodeVisitor, Visit, VisitorTable, VisitorTableBuilder};

pub use markweave_ast::{Node, NodeType};
pub use markweave_parser::{MarkdownParser, ParseError, Parser};
