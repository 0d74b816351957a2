//! Node type definitions.
//!
//! The built-in variants follow the mdast/CommonMark vocabulary plus the GFM
//! extensions. [`NodeType::Custom`] lets plugins introduce their own node
//! types without touching this enum.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Node types of a Markweave document tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    // Document structure
    /// Root document node.
    Document,

    // Block elements
    /// Paragraph containing inline content.
    Paragraph,
    /// Heading (H1-H6).
    Heading,
    /// Block quote.
    BlockQuote,
    /// Ordered or unordered list.
    List,
    /// Item in a list.
    ListItem,
    /// Fenced or indented code block.
    CodeBlock,
    /// Thematic break / horizontal rule.
    ThematicBreak,
    /// Raw HTML (block or inline).
    Html,

    // Inline elements
    /// Plain text.
    Text,
    /// Hard line break.
    Break,
    /// Emphasis (italic).
    Emphasis,
    /// Strong emphasis (bold).
    Strong,
    /// Strikethrough text (GFM).
    Strikethrough,
    /// Inline code.
    Code,
    /// Hyperlink.
    Link,
    /// Image.
    Image,

    // Reference elements
    /// Link reference.
    LinkReference,
    /// Image reference.
    ImageReference,
    /// Reference definition.
    Definition,

    // Extension elements (GFM)
    /// Table.
    Table,
    /// Table row.
    TableRow,
    /// Table cell.
    TableCell,
    /// Footnote definition.
    FootnoteDefinition,
    /// Footnote reference.
    FootnoteReference,

    /// Plugin-defined node type.
    Custom(&'static str),
}

/// Error returned when a node type name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown node type: {0}")]
pub struct UnknownNodeType(pub String);

impl NodeType {
    /// All built-in node types, in declaration order.
    pub const BUILTIN: [NodeType; 25] = [
        NodeType::Document,
        NodeType::Paragraph,
        NodeType::Heading,
        NodeType::BlockQuote,
        NodeType::List,
        NodeType::ListItem,
        NodeType::CodeBlock,
        NodeType::ThematicBreak,
        NodeType::Html,
        NodeType::Text,
        NodeType::Break,
        NodeType::Emphasis,
        NodeType::Strong,
        NodeType::Strikethrough,
        NodeType::Code,
        NodeType::Link,
        NodeType::Image,
        NodeType::LinkReference,
        NodeType::ImageReference,
        NodeType::Definition,
        NodeType::Table,
        NodeType::TableRow,
        NodeType::TableCell,
        NodeType::FootnoteDefinition,
        NodeType::FootnoteReference,
    ];

    /// Returns the canonical name of this node type.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeType::Document => "Document",
            NodeType::Paragraph => "Paragraph",
            NodeType::Heading => "Heading",
            NodeType::BlockQuote => "BlockQuote",
            NodeType::List => "List",
            NodeType::ListItem => "ListItem",
            NodeType::CodeBlock => "CodeBlock",
            NodeType::ThematicBreak => "ThematicBreak",
            NodeType::Html => "Html",
            NodeType::Text => "Text",
            NodeType::Break => "Break",
            NodeType::Emphasis => "Emphasis",
            NodeType::Strong => "Strong",
            NodeType::Strikethrough => "Strikethrough",
            NodeType::Code => "Code",
            NodeType::Link => "Link",
            NodeType::Image => "Image",
            NodeType::LinkReference => "LinkReference",
            NodeType::ImageReference => "ImageReference",
            NodeType::Definition => "Definition",
            NodeType::Table => "Table",
            NodeType::TableRow => "TableRow",
            NodeType::TableCell => "TableCell",
            NodeType::FootnoteDefinition => "FootnoteDefinition",
            NodeType::FootnoteReference => "FootnoteReference",
            NodeType::Custom(name) => name,
        }
    }

    /// Returns true if this node type is a block element.
    #[inline]
    pub const fn is_block(&self) -> bool {
        matches!(
            self,
            NodeType::Document
                | NodeType::Paragraph
                | NodeType::Heading
                | NodeType::BlockQuote
                | NodeType::List
                | NodeType::ListItem
                | NodeType::CodeBlock
                | NodeType::ThematicBreak
                | NodeType::Html
                | NodeType::Table
                | NodeType::TableRow
                | NodeType::FootnoteDefinition
        )
    }

    /// Returns true if this node type is an inline element.
    #[inline]
    pub const fn is_inline(&self) -> bool {
        matches!(
            self,
            NodeType::Text
                | NodeType::Break
                | NodeType::Emphasis
                | NodeType::Strong
                | NodeType::Strikethrough
                | NodeType::Code
                | NodeType::Link
                | NodeType::Image
                | NodeType::LinkReference
                | NodeType::ImageReference
                | NodeType::FootnoteReference
        )
    }

    /// Returns true if this node type can contain children.
    ///
    /// Custom node types are assumed to be parents.
    #[inline]
    pub const fn is_parent(&self) -> bool {
        matches!(
            self,
            NodeType::Document
                | NodeType::Paragraph
                | NodeType::Heading
                | NodeType::BlockQuote
                | NodeType::List
                | NodeType::ListItem
                | NodeType::Emphasis
                | NodeType::Strong
                | NodeType::Strikethrough
                | NodeType::Link
                | NodeType::LinkReference
                | NodeType::Table
                | NodeType::TableRow
                | NodeType::TableCell
                | NodeType::FootnoteDefinition
                | NodeType::Custom(_)
        )
    }

    /// Returns true if this node type carries a text value.
    #[inline]
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            NodeType::Text | NodeType::Code | NodeType::CodeBlock | NodeType::Html
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses a built-in node type name. Custom types cannot be parsed since
/// their names are owned by the plugin that defines them.
impl FromStr for NodeType {
    type Err = UnknownNodeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::BUILTIN
            .iter()
            .copied()
            .find(|node_type| node_type.name() == s)
            .ok_or_else(|| UnknownNodeType(s.to_string()))
    }
}

impl Serialize for NodeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_is_block() {
        assert!(NodeType::Paragraph.is_block());
        assert!(NodeType::Heading.is_block());
        assert!(!NodeType::Text.is_block());
        assert!(!NodeType::Emphasis.is_block());
    }

    #[test]
    fn test_is_inline() {
        assert!(NodeType::Text.is_inline());
        assert!(NodeType::Emphasis.is_inline());
        assert!(!NodeType::Paragraph.is_inline());
        assert!(!NodeType::Document.is_inline());
    }

    #[test]
    fn test_is_parent() {
        assert!(NodeType::Document.is_parent());
        assert!(NodeType::Custom("admonition").is_parent());
        assert!(!NodeType::Text.is_parent());
        assert!(!NodeType::Code.is_parent());
    }

    #[test]
    fn test_display_custom() {
        assert_eq!(NodeType::Custom("admonition").to_string(), "admonition");
    }

    #[rstest]
    #[case("Heading", NodeType::Heading)]
    #[case("Paragraph", NodeType::Paragraph)]
    #[case("ThematicBreak", NodeType::ThematicBreak)]
    #[case("FootnoteReference", NodeType::FootnoteReference)]
    fn test_from_str(#[case] name: &str, #[case] expected: NodeType) {
        assert_eq!(name.parse::<NodeType>(), Ok(expected));
    }

    #[test]
    fn test_from_str_unknown() {
        let err = "Header".parse::<NodeType>().unwrap_err();
        assert_eq!(err, UnknownNodeType("Header".to_string()));
        assert_eq!(err.to_string(), "Unknown node type: Header");
    }

    #[test]
    fn test_builtin_names_round_trip() {
        for node_type in NodeType::BUILTIN {
            assert_eq!(node_type.name().parse::<NodeType>(), Ok(node_type));
        }
    }

    #[test]
    fn test_serialize_as_name() {
        let json = serde_json::to_value(NodeType::BlockQuote).unwrap();
        assert_eq!(json, "BlockQuote");
    }
}
