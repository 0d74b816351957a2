//! Parser trait definition.

use markweave_ast::{AstArena, Node};

use crate::ParseError;

/// Trait for parsing source text into a Markweave document tree.
///
/// The render pipeline only depends on this trait, so any front end that can
/// produce [`Node`] trees can feed it.
///
/// # Example
///
/// ```rust
/// use markweave_ast::{AstArena, Node, NodeType, Span};
/// use markweave_parser::{ParseError, Parser};
///
/// struct LineParser;
///
/// impl Parser for LineParser {
///     fn name(&self) -> &str {
///         "lines"
///     }
///
///     fn extensions(&self) -> &[&str] {
///         &["txt"]
///     }
///
///     fn parse<'a>(&self, arena: &'a AstArena, source: &str) -> Result<Node<'a>, ParseError> {
///         let text = Node::new_text(NodeType::Text, Span::new(0, source.len() as u32), arena.alloc_str(source));
///         Ok(Node::new_parent(NodeType::Document, text.span, arena.alloc_slice_copy(&[text])))
///     }
/// }
///
/// assert!(LineParser.can_parse("TXT"));
/// ```
pub trait Parser: Send + Sync {
    /// Returns the name of this parser.
    fn name(&self) -> &str;

    /// Returns the file extensions this parser handles.
    ///
    /// Extensions should not include the leading dot (e.g., `["md", "markdown"]`).
    fn extensions(&self) -> &[&str];

    /// Parses the source text into a document tree allocated in `arena`.
    fn parse<'a>(&self, arena: &'a AstArena, source: &str) -> Result<Node<'a>, ParseError>;

    /// Returns true if this parser can handle the given file extension.
    fn can_parse(&self, extension: &str) -> bool {
        self.extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}
