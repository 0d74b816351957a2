//! Node definition.
//!
//! The tree element consumed by the render engine.

use serde::Serialize;

use crate::{NodeType, Span};

/// A node in a Markweave document tree.
///
/// Nodes are allocated in an [`AstArena`](crate::AstArena) and borrow their
/// children and text from it.
///
/// # Example
///
/// ```rust
/// use markweave_ast::{AstArena, Node, NodeType, Span};
///
/// let arena = AstArena::new();
///
/// let text = arena.alloc(Node::new_text(NodeType::Text, Span::new(0, 5), "Hello"));
/// let children = arena.alloc_slice_copy(&[*text]);
/// let paragraph = Node::new_parent(NodeType::Paragraph, Span::new(0, 5), children);
///
/// assert!(paragraph.has_children());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    /// The type of this node.
    pub node_type: NodeType,

    /// Byte span in the source text.
    pub span: Span,

    /// Child nodes, in document order.
    pub children: &'a [Node<'a>],

    /// Text value (text, code, code block, raw HTML, image alt text).
    pub value: Option<&'a str>,

    /// Additional node-specific data.
    pub data: NodeData<'a>,
}

/// Node-specific payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NodeData<'a> {
    #[default]
    None,
    /// Heading depth (1-6).
    Heading(u8),
    List(ListData),
    /// Code block info string language.
    CodeBlock(Option<&'a str>),
    /// Link or image destination.
    Link(LinkData<'a>),
    Reference(ReferenceData<'a>),
    Definition(DefinitionData<'a>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListData {
    pub ordered: bool,
    /// First item number of an ordered list.
    pub start: Option<u32>,
    /// Loose list (items separated by blank lines).
    pub spread: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkData<'a> {
    pub url: &'a str,
    pub title: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceData<'a> {
    pub identifier: &'a str,
    pub label: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefinitionData<'a> {
    pub identifier: &'a str,
    pub url: &'a str,
    pub title: Option<&'a str>,
    pub label: Option<&'a str>,
}

impl<'a> Serialize for Node<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let has_children = self.node_type.is_parent() || !self.children.is_empty();

        let mut len = 2; // type, range
        if has_children {
            len += 1;
        }
        if self.value.is_some() {
            len += 1;
        }
        len += self.data.present_field_count();

        let mut state = serializer.serialize_struct("Node", len)?;

        state.serialize_field("type", &self.node_type)?;
        state.serialize_field("range", &[self.span.start, self.span.end])?;

        if has_children {
            state.serialize_field("children", &self.children)?;
        }

        if let Some(value) = &self.value {
            state.serialize_field("value", value)?;
        }

        self.data.serialize_fields(&mut state)?;

        state.end()
    }
}

impl<'a> Node<'a> {
    /// Creates a new parent node with children.
    #[inline]
    pub const fn new_parent(node_type: NodeType, span: Span, children: &'a [Node<'a>]) -> Self {
        Self {
            node_type,
            span,
            children,
            value: None,
            data: NodeData::new(),
        }
    }

    /// Creates a new text node with a value.
    #[inline]
    pub const fn new_text(node_type: NodeType, span: Span, value: &'a str) -> Self {
        Self {
            node_type,
            span,
            children: &[],
            value: Some(value),
            data: NodeData::new(),
        }
    }

    /// Creates a new leaf node (no children, no value).
    #[inline]
    pub const fn new_leaf(node_type: NodeType, span: Span) -> Self {
        Self {
            node_type,
            span,
            children: &[],
            value: None,
            data: NodeData::new(),
        }
    }

    /// Returns this node with `data` attached.
    #[inline]
    pub const fn with_data(mut self, data: NodeData<'a>) -> Self {
        self.data = data;
        self
    }

    /// Returns true if this node has children.
    #[inline]
    pub const fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns the text value of this node.
    ///
    /// Parent nodes return `None`; use [`Node::collect_text`] to gather the
    /// text of a subtree.
    #[inline]
    pub const fn text(&self) -> Option<&'a str> {
        self.value
    }

    /// Concatenates the text values of this node and all its descendants.
    pub fn collect_text(&self) -> String {
        let mut out = String::new();
        self.collect_text_into(&mut out);
        out
    }

    fn collect_text_into(&self, out: &mut String) {
        if let Some(value) = self.value {
            out.push_str(value);
        }
        for child in self.children {
            child.collect_text_into(out);
        }
    }

    /// Returns the heading depth, if this is a heading.
    #[inline]
    pub const fn heading_depth(&self) -> Option<u8> {
        match self.data {
            NodeData::Heading(depth) => Some(depth),
            _ => None,
        }
    }

    /// Returns link/image destination data, if present.
    #[inline]
    pub const fn link(&self) -> Option<LinkData<'a>> {
        match self.data {
            NodeData::Link(link) => Some(link),
            _ => None,
        }
    }
}

impl<'a> NodeData<'a> {
    /// Returns the number of present fields for serialization.
    fn present_field_count(&self) -> usize {
        match self {
            NodeData::None => 0,
            NodeData::Heading(_) => 1,
            NodeData::List(list) => 2 + usize::from(list.start.is_some()),
            NodeData::CodeBlock(lang) => usize::from(lang.is_some()),
            NodeData::Link(link) => 1 + usize::from(link.title.is_some()),
            NodeData::Reference(reference) => 1 + usize::from(reference.label.is_some()),
            NodeData::Definition(def) => {
                2 + usize::from(def.title.is_some()) + usize::from(def.label.is_some())
            }
        }
    }

    /// Serializes present fields into the given struct serializer state.
    fn serialize_fields<S: serde::ser::SerializeStruct>(
        &self,
        state: &mut S,
    ) -> Result<(), S::Error> {
        match self {
            NodeData::None => {}
            NodeData::Heading(depth) => {
                state.serialize_field("depth", depth)?;
            }
            NodeData::List(list) => {
                state.serialize_field("ordered", &list.ordered)?;
                if let Some(start) = list.start {
                    state.serialize_field("start", &start)?;
                }
                state.serialize_field("spread", &list.spread)?;
            }
            NodeData::CodeBlock(lang) => {
                if let Some(l) = lang {
                    state.serialize_field("lang", l)?;
                }
            }
            NodeData::Link(link) => {
                state.serialize_field("url", link.url)?;
                if let Some(title) = link.title {
                    state.serialize_field("title", title)?;
                }
            }
            NodeData::Reference(reference) => {
                state.serialize_field("identifier", reference.identifier)?;
                if let Some(label) = reference.label {
                    state.serialize_field("label", label)?;
                }
            }
            NodeData::Definition(def) => {
                state.serialize_field("identifier", def.identifier)?;
                state.serialize_field("url", def.url)?;
                if let Some(title) = def.title {
                    state.serialize_field("title", title)?;
                }
                if let Some(label) = def.label {
                    state.serialize_field("label", label)?;
                }
            }
        }
        Ok(())
    }

    /// Creates new empty node data.
    #[inline]
    pub const fn new() -> Self {
        Self::None
    }

    /// Creates node data for a heading.
    #[inline]
    pub const fn heading(depth: u8) -> Self {
        Self::Heading(depth)
    }

    /// Creates node data for a link or image.
    #[inline]
    pub const fn link(url: &'a str, title: Option<&'a str>) -> Self {
        Self::Link(LinkData { url, title })
    }

    /// Creates node data for a code block.
    #[inline]
    pub const fn code_block(lang: Option<&'a str>) -> Self {
        Self::CodeBlock(lang)
    }

    /// Creates node data for a list.
    #[inline]
    pub const fn list(ordered: bool, start: Option<u32>, spread: bool) -> Self {
        Self::List(ListData {
            ordered,
            start,
            spread,
        })
    }
}
