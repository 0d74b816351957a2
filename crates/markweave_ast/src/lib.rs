//! # markweave_ast
//!
//! Document tree definitions for Markweave.
//!
//! This crate provides the node types consumed by the Markweave render
//! engine. Parsers (see `markweave_parser`) build these trees; plugins
//! dispatch on [`NodeType`] when rendering them.
//!
//! ## Architecture
//!
//! - Uses `bumpalo` for Arena allocation
//! - All nodes of one document are allocated in a single arena
//! - Nodes are `Copy` and borrow their children and text from the arena
//! - Memory is freed all at once when the arena is dropped
//!
//! ## Example
//!
//! ```rust
//! use markweave_ast::{AstArena, Node, NodeType, Span};
//!
//! let arena = AstArena::new();
//!
//! let text = arena.alloc(Node::new_text(NodeType::Text, Span::new(0, 5), "Hello"));
//! let children = arena.alloc_slice_copy(&[*text]);
//! let paragraph = Node::new_parent(NodeType::Paragraph, Span::new(0, 5), children);
//!
//! assert_eq!(paragraph.children[0].text(), Some("Hello"));
//! ```

mod arena;
mod node;
mod node_type;
mod span;

pub use arena::AstArena;
pub use node::{DefinitionData, LinkData, ListData, Node, NodeData, ReferenceData};
pub use node_type::{NodeType, UnknownNodeType};
pub use span::Span;
