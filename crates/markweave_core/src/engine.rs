//! Depth-first render engine.
//!
//! For every node the engine looks up the visit action, runs it against the
//! output buffer of the current render call with a fresh [`RenderProps`],
//! then asks the span factory table for the styles of the range the node
//! emitted.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use markweave_ast::Node;
use serde::Serialize;
use tracing::trace;

use crate::RenderError;
use crate::configuration::Configuration;
use crate::props::RenderProps;
use crate::span_table::SpanFactoryTable;
use crate::style::Style;
use crate::theme::Theme;
use crate::visitor_table::{Visit, VisitorTable};

/// A style applied to `text[start..end]` (UTF-8 byte offsets).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanRecord {
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

/// Result of one render call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderOutput {
    pub text: String,
    /// Annotations in the order their nodes completed.
    pub spans: Vec<SpanRecord>,
}

impl RenderOutput {
    /// Returns the text covered by `span`.
    pub fn slice(&self, span: &SpanRecord) -> Option<&str> {
        self.text.get(span.start..span.end)
    }

    /// Returns the spans whose style has the given `kind`.
    pub fn spans_of_kind<'s>(&'s self, kind: &'s str) -> impl Iterator<Item = &'s SpanRecord> + 's {
        self.spans.iter().filter(move |span| span.style.kind() == kind)
    }
}

/// Per-call output buffer.
#[derive(Default)]
struct RenderBuffer {
    text: String,
    spans: Vec<SpanRecord>,
    scratch: HashMap<TypeId, Box<dyn Any>>,
}

/// Walks document trees using frozen tables.
///
/// Cheap to clone; all clones share the same frozen artifacts.
#[derive(Debug, Clone)]
pub struct RenderEngine {
    configuration: Arc<Configuration>,
    visitors: Arc<VisitorTable>,
    spans: Arc<SpanFactoryTable>,
}

impl RenderEngine {
    pub fn new(
        configuration: Configuration,
        visitors: VisitorTable,
        spans: SpanFactoryTable,
    ) -> Self {
        Self {
            configuration: Arc::new(configuration),
            visitors: Arc::new(visitors),
            spans: Arc::new(spans),
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn visitors(&self) -> &VisitorTable {
        &self.visitors
    }

    pub fn span_factories(&self) -> &SpanFactoryTable {
        &self.spans
    }

    /// Renders the tree rooted at `root`.
    ///
    /// Any error from a visit action or span factory aborts the call; no
    /// partial output is returned.
    pub fn render(&self, root: &Node<'_>) -> Result<RenderOutput, RenderError> {
        let mut out = RenderBuffer::default();
        self.visit_node(root, &mut out, None)?;
        Ok(RenderOutput {
            text: out.text,
            spans: out.spans,
        })
    }

    fn visit_node(
        &self,
        node: &Node<'_>,
        out: &mut RenderBuffer,
        parent: Option<&RenderProps<'_>>,
    ) -> Result<(), RenderError> {
        match self.visitors.lookup(node.node_type) {
            Visit::Suppressed => {
                trace!(node_type = %node.node_type, "Skipping suppressed subtree");
                Ok(())
            }
            Visit::Absent => {
                for child in node.children {
                    self.visit_node(child, out, parent)?;
                }
                Ok(())
            }
            Visit::Action(visitor) => {
                let start = out.text.len();
                let props = match parent {
                    Some(parent) => parent.child(),
                    None => RenderProps::new(),
                };
                let mut ctx = VisitContext {
                    engine: self,
                    out,
                    props,
                    start,
                };
                visitor.visit(&mut ctx, node)?;

                let VisitContext {
                    out, props, start, ..
                } = ctx;
                let Some(factory) = self.spans.get(node.node_type) else {
                    return Ok(());
                };
                let end = out.text.len();
                for style in factory.create(&self.configuration, &props)? {
                    out.spans.push(SpanRecord { start, end, style });
                }
                Ok(())
            }
        }
    }
}

/// What a visit action sees of the render in progress.
pub struct VisitContext<'r, 'p> {
    engine: &'r RenderEngine,
    out: &'r mut RenderBuffer,
    props: RenderProps<'p>,
    start: usize,
}

impl<'r, 'p> VisitContext<'r, 'p> {
    /// Current length of the output, i.e. the write cursor.
    pub fn len(&self) -> usize {
        self.out.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.text.is_empty()
    }

    /// Text emitted so far by the whole render call.
    pub fn text(&self) -> &str {
        &self.out.text
    }

    /// Start of the range that will be annotated for this node.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn push_str(&mut self, text: &str) {
        self.out.text.push_str(text);
    }

    pub fn push(&mut self, c: char) {
        self.out.text.push(c);
    }

    /// Writes a newline unless the output is empty or already ends with one.
    pub fn ensure_newline(&mut self) {
        self.separate(|text| {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
        });
    }

    /// Separates a block from preceding content with a blank line.
    pub fn block_start(&mut self) {
        self.separate(|text| {
            if text.is_empty() {
                return;
            }
            while !text.ends_with("\n\n") {
                text.push('\n');
            }
        });
    }

    /// Writes separators; when nothing was emitted for this node yet, its
    /// range starts after them.
    fn separate(&mut self, write: impl FnOnce(&mut String)) {
        let untouched = self.out.text.len() == self.start;
        write(&mut self.out.text);
        if untouched {
            self.start = self.out.text.len();
        }
    }

    /// Visits every child of `node`.
    pub fn visit_children(&mut self, node: &Node<'_>) -> Result<(), RenderError> {
        for child in node.children {
            self.visit_child(child)?;
        }
        Ok(())
    }

    /// Visits one node as a child of the current node.
    pub fn visit_child(&mut self, child: &Node<'_>) -> Result<(), RenderError> {
        self.engine.visit_node(child, self.out, Some(&self.props))
    }

    pub fn configuration(&self) -> &'r Configuration {
        &self.engine.configuration
    }

    pub fn theme(&self) -> &'r Theme {
        self.engine.configuration.theme()
    }

    pub fn props(&self) -> &RenderProps<'p> {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut RenderProps<'p> {
        &mut self.props
    }

    /// Annotates `text[start..end]` directly.
    ///
    /// The range must lie within the text emitted so far and on character
    /// boundaries.
    pub fn annotate(&mut self, start: usize, end: usize, style: Style) -> Result<(), RenderError> {
        let text = &self.out.text;
        let len = text.len();
        if start > end || end > len || !text.is_char_boundary(start) || !text.is_char_boundary(end)
        {
            return Err(RenderError::InvalidRange { start, end, len });
        }
        self.out.spans.push(SpanRecord { start, end, style });
        Ok(())
    }

    /// State shared by all visit actions of the current render call.
    ///
    /// Created with `T::default()` on first access and dropped when the
    /// call returns.
    pub fn scratch<T: Any + Default>(&mut self) -> &mut T {
        self.out
            .scratch
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::default()))
            .downcast_mut::<T>()
            .expect("scratch entries are keyed by their own TypeId")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Color;
    use crate::visitor_table::VisitorTableBuilder;
    use markweave_ast::{AstArena, NodeType, Span};
    use pretty_assertions::assert_eq;

    fn text<'a>(arena: &'a AstArena, value: &str) -> Node<'a> {
        Node::new_text(NodeType::Text, Span::new(0, 0), arena.alloc_str(value))
    }

    fn parent<'a>(arena: &'a AstArena, node_type: NodeType, children: &[Node<'a>]) -> Node<'a> {
        Node::new_parent(node_type, Span::new(0, 0), arena.alloc_slice_copy(children))
    }

    fn base_visitors() -> VisitorTableBuilder {
        let mut visitors = VisitorTable::builder();
        visitors
            .on(NodeType::Document, |ctx, node| ctx.visit_children(node))
            .on(NodeType::Paragraph, |ctx, node| {
                ctx.block_start();
                ctx.visit_children(node)
            })
            .on(NodeType::Text, |ctx, node| {
                ctx.push_str(node.value.unwrap_or_default());
                Ok(())
            });
        visitors
    }

    fn engine(visitors: VisitorTableBuilder, spans: SpanFactoryTable) -> RenderEngine {
        RenderEngine::new(Configuration::default(), visitors.build(), spans)
    }

    #[test]
    fn test_paragraph_factory_covers_text() {
        let arena = AstArena::new();
        let doc = parent(
            &arena,
            NodeType::Document,
            &[parent(&arena, NodeType::Paragraph, &[text(&arena, "A paragraph?")])],
        );

        let mut spans = SpanFactoryTable::builder();
        spans.set_factory(NodeType::Paragraph, |_, _| {
            vec![Style::ForegroundColor {
                color: Color::GREEN,
            }]
        });
        let output = engine(base_visitors(), spans.build()).render(&doc).unwrap();

        assert_eq!(output.text, "A paragraph?");
        assert_eq!(
            output.spans,
            vec![SpanRecord {
                start: 0,
                end: 12,
                style: Style::ForegroundColor {
                    color: Color::GREEN
                },
            }]
        );
    }

    #[test]
    fn test_block_start_moves_range_past_separator() {
        let arena = AstArena::new();
        let doc = parent(
            &arena,
            NodeType::Document,
            &[
                parent(&arena, NodeType::Paragraph, &[text(&arena, "one")]),
                parent(&arena, NodeType::Paragraph, &[text(&arena, "two")]),
            ],
        );

        let mut spans = SpanFactoryTable::builder();
        spans.set_factory(NodeType::Paragraph, |_, _| vec![Style::Bold]);
        let output = engine(base_visitors(), spans.build()).render(&doc).unwrap();

        assert_eq!(output.text, "one\n\ntwo");
        let ranges: Vec<_> = output.spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, vec![(0, 3), (5, 8)]);
        assert_eq!(output.slice(&output.spans[1]), Some("two"));
    }

    #[test]
    fn test_absent_node_descends_without_span() {
        let arena = AstArena::new();
        let doc = parent(
            &arena,
            NodeType::Document,
            &[parent(&arena, NodeType::Emphasis, &[text(&arena, "soft")])],
        );

        let mut spans = SpanFactoryTable::builder();
        spans.set_factory(NodeType::Emphasis, |_, _| vec![Style::Italic]);
        let output = engine(base_visitors(), spans.build()).render(&doc).unwrap();

        assert_eq!(output.text, "soft");
        assert!(output.spans.is_empty());
    }

    #[test]
    fn test_suppressed_subtree_is_skipped() {
        let arena = AstArena::new();
        let doc = parent(
            &arena,
            NodeType::Document,
            &[
                parent(&arena, NodeType::Heading, &[text(&arena, "gone")]),
                parent(&arena, NodeType::Paragraph, &[text(&arena, "kept")]),
            ],
        );

        let mut visitors = base_visitors();
        visitors.suppress(NodeType::Heading);
        let output = engine(visitors, SpanFactoryTable::default())
            .render(&doc)
            .unwrap();

        assert_eq!(output.text, "kept");
    }

    #[test]
    fn test_post_order_with_direct_annotations_first() {
        let arena = AstArena::new();
        let doc = parent(
            &arena,
            NodeType::Document,
            &[parent(
                &arena,
                NodeType::Paragraph,
                &[parent(&arena, NodeType::Strong, &[text(&arena, "ab")])],
            )],
        );

        let mut visitors = base_visitors();
        visitors.on(NodeType::Strong, |ctx, node| {
            ctx.visit_children(node)?;
            ctx.annotate(0, 1, Style::Underline)
        });
        let mut spans = SpanFactoryTable::builder();
        spans
            .set_factory(NodeType::Strong, |_, _| vec![Style::Bold])
            .set_factory(NodeType::Paragraph, |_, _| vec![Style::Italic]);
        let output = engine(visitors, spans.build()).render(&doc).unwrap();

        let kinds: Vec<_> = output.spans.iter().map(|s| s.style.kind()).collect();
        assert_eq!(kinds, vec!["underline", "bold", "italic"]);
    }

    #[test]
    fn test_props_flow_to_factory_and_descendants() {
        const MARK: crate::Prop<&'static str> = crate::Prop::new("mark");

        let arena = AstArena::new();
        let doc = parent(
            &arena,
            NodeType::Document,
            &[parent(&arena, NodeType::Paragraph, &[text(&arena, "x")])],
        );

        let mut visitors = base_visitors();
        visitors
            .on(NodeType::Document, |ctx, node| {
                ctx.props_mut().set(MARK, "doc");
                ctx.visit_children(node)
            })
            .on(NodeType::Text, |ctx, node| {
                let mark = ctx.props().get(MARK).copied().unwrap_or("none");
                ctx.push_str(mark);
                ctx.push_str(node.value.unwrap_or_default());
                Ok(())
            });
        let mut spans = SpanFactoryTable::builder();
        spans.set_factory(NodeType::Document, |_, props| {
            vec![Style::Custom {
                name: props.get(MARK).copied().unwrap_or("none").to_string(),
                value: serde_json::Value::Null,
            }]
        });
        let output = engine(visitors, spans.build()).render(&doc).unwrap();

        assert_eq!(output.text, "docx");
        assert!(matches!(&output.spans[0].style, Style::Custom { name, .. } if name == "doc"));
    }

    #[test]
    fn test_annotate_rejects_out_of_range() {
        let arena = AstArena::new();
        let doc = parent(&arena, NodeType::Document, &[text(&arena, "héllo")]);

        let mut visitors = base_visitors();
        visitors.on(NodeType::Document, |ctx, node| {
            ctx.visit_children(node)?;
            ctx.annotate(0, 2, Style::Bold)
        });
        let err = engine(visitors, SpanFactoryTable::default())
            .render(&doc)
            .unwrap_err();

        assert!(matches!(
            err,
            RenderError::InvalidRange {
                start: 0,
                end: 2,
                len: 6
            }
        ));
    }

    #[test]
    fn test_action_error_aborts_render() {
        let arena = AstArena::new();
        let doc = parent(&arena, NodeType::Document, &[text(&arena, "x")]);

        let mut visitors = base_visitors();
        visitors.on(NodeType::Text, |_, _| {
            Err(RenderError::visit(NodeType::Text, "boom"))
        });
        let result = engine(visitors, SpanFactoryTable::default()).render(&doc);

        assert!(matches!(result, Err(RenderError::Visit { .. })));
    }

    #[test]
    fn test_scratch_is_shared_within_one_call() {
        let arena = AstArena::new();
        let doc = parent(
            &arena,
            NodeType::Document,
            &[text(&arena, "a"), text(&arena, "b")],
        );

        let mut visitors = base_visitors();
        visitors.on(NodeType::Text, |ctx, _| {
            let count = ctx.scratch::<usize>();
            *count += 1;
            let count = *count;
            ctx.push_str(&count.to_string());
            Ok(())
        });
        let engine = engine(visitors, SpanFactoryTable::default());

        assert_eq!(engine.render(&doc).unwrap().text, "12");
        assert_eq!(engine.render(&doc).unwrap().text, "12");
    }
}
