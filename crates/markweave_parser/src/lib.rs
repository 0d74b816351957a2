//! # markweave_parser
//!
//! Parser adapters for Markweave.
//!
//! This crate provides:
//! - A [`Parser`] trait that any front end can implement
//! - A built-in [`MarkdownParser`] backed by `markdown-rs` (CommonMark + GFM)
//!
//! ## Example
//!
//! ```rust
//! use markweave_ast::{AstArena, NodeType};
//! use markweave_parser::{MarkdownParser, Parser};
//!
//! let arena = AstArena::new();
//! let parser = MarkdownParser::new();
//!
//! let doc = parser.parse(&arena, "# Hello\n\nA paragraph?").unwrap();
//! assert_eq!(doc.node_type, NodeType::Document);
//! assert_eq!(doc.children[0].node_type, NodeType::Heading);
//! ```

mod error;
mod mdast;
mod traits;

pub use error::ParseError;
pub use mdast::MarkdownParser;
pub use traits::Parser;
