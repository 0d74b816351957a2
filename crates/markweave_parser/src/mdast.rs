//! Markdown parser using markdown-rs (wooorm/markdown-rs).
//!
//! Converts the mdast tree produced by the `markdown` crate into an
//! arena-allocated Markweave tree. Reference-style links and images are
//! resolved against the document's definitions while converting.

use std::collections::HashMap;

use markdown::mdast;
use markdown::{ParseOptions, to_mdast};
use markweave_ast::{AstArena, DefinitionData, Node, NodeData, NodeType, ReferenceData, Span};

use crate::{ParseError, Parser};

/// Definition destinations keyed by normalized identifier.
type Definitions<'m> = HashMap<&'m str, (&'m str, Option<&'m str>)>;

/// Markdown parser implementation.
///
/// Parses CommonMark plus the GFM extensions (tables, strikethrough,
/// footnotes, task lists, autolinks).
#[derive(Debug, Clone, Copy)]
pub struct MarkdownParser {
    gfm: bool,
    frontmatter: bool,
}

impl MarkdownParser {
    /// Creates a new Markdown parser with GFM enabled.
    pub fn new() -> Self {
        Self {
            gfm: true,
            frontmatter: false,
        }
    }

    /// Creates a parser that only understands CommonMark.
    pub fn commonmark() -> Self {
        Self {
            gfm: false,
            frontmatter: false,
        }
    }

    /// Accepts YAML/TOML frontmatter. It becomes a `yaml` or `toml` custom
    /// node that renders nothing unless a plugin handles it.
    pub fn with_frontmatter(mut self) -> Self {
        self.frontmatter = true;
        self
    }

    fn options(&self) -> ParseOptions {
        let mut options = if self.gfm {
            ParseOptions::gfm()
        } else {
            ParseOptions::default()
        };
        options.constructs.frontmatter = self.frontmatter;
        options
    }
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for MarkdownParser {
    fn name(&self) -> &str {
        "markdown"
    }

    fn extensions(&self) -> &[&str] {
        &["md", "markdown", "mdown", "mkdn", "mkd"]
    }

    fn parse<'a>(&self, arena: &'a AstArena, source: &str) -> Result<Node<'a>, ParseError> {
        let mdast = to_mdast(source, &self.options())
            .map_err(|e| ParseError::invalid_source(e.to_string()))?;

        let mut definitions = Definitions::new();
        collect_definitions(&mdast, &mut definitions);

        let converter = Converter { arena, definitions };
        Ok(converter.convert_node(&mdast))
    }
}

/// Collects every definition in document order. The first definition of an
/// identifier wins.
fn collect_definitions<'m>(node: &'m mdast::Node, out: &mut Definitions<'m>) {
    if let mdast::Node::Definition(def) = node {
        out.entry(def.identifier.as_str())
            .or_insert((def.url.as_str(), def.title.as_deref()));
    }
    if let Some(children) = node.children() {
        for child in children {
            collect_definitions(child, out);
        }
    }
}

struct Converter<'a, 'm> {
    arena: &'a AstArena,
    definitions: Definitions<'m>,
}

impl<'a, 'm> Converter<'a, 'm> {
    /// Converts an mdast node to a Markweave node.
    fn convert_node(&self, node: &mdast::Node) -> Node<'a> {
        use markdown::mdast::Node as Md;

        let arena = self.arena;
        match node {
            Md::Root(root) => self.parent(node, &root.children, NodeType::Document),

            Md::Paragraph(para) => self.parent(node, &para.children, NodeType::Paragraph),

            Md::Heading(heading) => self
                .parent(node, &heading.children, NodeType::Heading)
                .with_data(NodeData::heading(heading.depth)),

            Md::Text(text) => self.text(node, &text.value, NodeType::Text),

            Md::Emphasis(em) => self.parent(node, &em.children, NodeType::Emphasis),

            Md::Strong(strong) => self.parent(node, &strong.children, NodeType::Strong),

            Md::Delete(del) => self.parent(node, &del.children, NodeType::Strikethrough),

            Md::InlineCode(code) => self.text(node, &code.value, NodeType::Code),

            Md::Code(code) => {
                let lang = code.lang.as_deref().map(|lang| arena.alloc_str(lang));
                self.text(node, &code.value, NodeType::CodeBlock)
                    .with_data(NodeData::code_block(lang))
            }

            Md::Link(link) => self
                .parent(node, &link.children, NodeType::Link)
                .with_data(self.link_data(&link.url, link.title.as_deref())),

            Md::Image(image) => self
                .text(node, &image.alt, NodeType::Image)
                .with_data(self.link_data(&image.url, image.title.as_deref())),

            Md::List(list) => self
                .parent(node, &list.children, NodeType::List)
                .with_data(NodeData::list(list.ordered, list.start, list.spread)),

            Md::ListItem(item) => self.parent(node, &item.children, NodeType::ListItem),

            Md::Blockquote(quote) => self.parent(node, &quote.children, NodeType::BlockQuote),

            Md::ThematicBreak(_) => self.leaf(node, NodeType::ThematicBreak),

            Md::Break(_) => self.leaf(node, NodeType::Break),

            Md::Html(html) => self.text(node, &html.value, NodeType::Html),

            Md::Table(table) => self.parent(node, &table.children, NodeType::Table),

            Md::TableRow(row) => self.parent(node, &row.children, NodeType::TableRow),

            Md::TableCell(cell) => self.parent(node, &cell.children, NodeType::TableCell),

            Md::FootnoteDefinition(def) => self
                .parent(node, &def.children, NodeType::FootnoteDefinition)
                .with_data(self.reference(&def.identifier, def.label.as_deref())),

            Md::FootnoteReference(reference) => self
                .leaf(node, NodeType::FootnoteReference)
                .with_data(self.reference(&reference.identifier, reference.label.as_deref())),

            Md::LinkReference(reference) => {
                match self.definitions.get(reference.identifier.as_str()) {
                    Some(&(url, title)) => self
                        .parent(node, &reference.children, NodeType::Link)
                        .with_data(self.link_data(url, title)),
                    None => self
                        .parent(node, &reference.children, NodeType::LinkReference)
                        .with_data(
                            self.reference(&reference.identifier, reference.label.as_deref()),
                        ),
                }
            }

            Md::ImageReference(reference) => {
                match self.definitions.get(reference.identifier.as_str()) {
                    Some(&(url, title)) => self
                        .text(node, &reference.alt, NodeType::Image)
                        .with_data(self.link_data(url, title)),
                    None => self
                        .text(node, &reference.alt, NodeType::ImageReference)
                        .with_data(
                            self.reference(&reference.identifier, reference.label.as_deref()),
                        ),
                }
            }

            Md::Definition(def) => {
                self.leaf(node, NodeType::Definition)
                    .with_data(NodeData::Definition(DefinitionData {
                        identifier: arena.alloc_str(&def.identifier),
                        url: arena.alloc_str(&def.url),
                        title: def.title.as_deref().map(|t| arena.alloc_str(t)),
                        label: def.label.as_deref().map(|l| arena.alloc_str(l)),
                    }))
            }

            Md::Yaml(yaml) => self.text(node, &yaml.value, NodeType::Custom("yaml")),

            Md::Toml(toml) => self.text(node, &toml.value, NodeType::Custom("toml")),

            Md::Math(math) => self.text(node, &math.value, NodeType::Custom("math")),

            Md::InlineMath(math) => self.text(node, &math.value, NodeType::Custom("inline_math")),

            // MDX constructs keep their position but carry no renderable content.
            _ => self.leaf(node, NodeType::Custom("mdx")),
        }
    }

    fn parent(&self, node: &mdast::Node, children: &[mdast::Node], node_type: NodeType) -> Node<'a> {
        let children = self
            .arena
            .alloc_slice_fill_iter(children.iter().map(|child| self.convert_node(child)));
        Node::new_parent(node_type, node_span(node), children)
    }

    fn text(&self, node: &mdast::Node, text: &str, node_type: NodeType) -> Node<'a> {
        Node::new_text(node_type, node_span(node), self.arena.alloc_str(text))
    }

    fn leaf(&self, node: &mdast::Node, node_type: NodeType) -> Node<'a> {
        Node::new_leaf(node_type, node_span(node))
    }

    fn link_data(&self, url: &str, title: Option<&str>) -> NodeData<'a> {
        let url = self.arena.alloc_str(url);
        let title = title.map(|t| self.arena.alloc_str(t));
        NodeData::link(url, title)
    }

    fn reference(&self, identifier: &str, label: Option<&str>) -> NodeData<'a> {
        NodeData::Reference(ReferenceData {
            identifier: self.arena.alloc_str(identifier),
            label: label.map(|l| self.arena.alloc_str(l)),
        })
    }
}

fn node_span(node: &mdast::Node) -> Span {
    node.position()
        .map(|pos| Span::new(pos.start.offset as u32, pos.end.offset as u32))
        .unwrap_or(Span::new(0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_ast::ListData;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse<'a>(arena: &'a AstArena, source: &str) -> Node<'a> {
        MarkdownParser::new().parse(arena, source).unwrap()
    }

    #[test]
    fn test_parse_simple_markdown() {
        let arena = AstArena::new();
        let ast = parse(&arena, "# Hello\n\nThis is a paragraph.");

        assert_eq!(ast.node_type, NodeType::Document);
        assert_eq!(ast.children.len(), 2);
        assert_eq!(ast.children[0].node_type, NodeType::Heading);
        assert_eq!(ast.children[1].node_type, NodeType::Paragraph);
    }

    #[test]
    fn test_parse_heading_depths() {
        let arena = AstArena::new();
        let ast = parse(&arena, "# H1\n## H2\n### H3\n#### H4\n##### H5\n###### H6");

        assert_eq!(ast.children.len(), 6);
        for (i, child) in ast.children.iter().enumerate() {
            assert_eq!(child.node_type, NodeType::Heading);
            assert_eq!(child.heading_depth(), Some((i + 1) as u8));
        }
    }

    #[test]
    fn test_parse_link_with_title() {
        let arena = AstArena::new();
        let ast = parse(&arena, "[Link](https://example.com \"Example Title\")");

        let link = &ast.children[0].children[0];
        assert_eq!(link.node_type, NodeType::Link);
        let data = link.link().unwrap();
        assert_eq!(data.url, "https://example.com");
        assert_eq!(data.title, Some("Example Title"));
        assert_eq!(link.collect_text(), "Link");
    }

    #[test]
    fn test_parse_image_keeps_alt_text() {
        let arena = AstArena::new();
        let ast = parse(&arena, "![Alt text](image.png \"Title\")");

        let image = &ast.children[0].children[0];
        assert_eq!(image.node_type, NodeType::Image);
        assert_eq!(image.text(), Some("Alt text"));
        assert_eq!(image.link().unwrap().url, "image.png");
    }

    #[test]
    fn test_parse_code_block() {
        let arena = AstArena::new();
        let ast = parse(&arena, "```rust\nfn main() {}\n```");

        let code_block = &ast.children[0];
        assert_eq!(code_block.node_type, NodeType::CodeBlock);
        assert_eq!(code_block.data, NodeData::CodeBlock(Some("rust")));
        assert_eq!(code_block.text(), Some("fn main() {}"));
    }

    #[test]
    fn test_parse_code_block_no_language() {
        let arena = AstArena::new();
        let ast = parse(&arena, "```\nplain code\n```");

        assert_eq!(ast.children[0].data, NodeData::CodeBlock(None));
    }

    #[test]
    fn test_parse_lists() {
        let arena = AstArena::new();
        let ast = parse(&arena, "3. First\n4. Second\n\n- a\n- b");

        let ordered = &ast.children[0];
        assert_eq!(ordered.node_type, NodeType::List);
        assert_eq!(
            ordered.data,
            NodeData::List(ListData {
                ordered: true,
                start: Some(3),
                spread: false,
            })
        );
        assert_eq!(ordered.children.len(), 2);
        assert!(
            ordered
                .children
                .iter()
                .all(|item| item.node_type == NodeType::ListItem)
        );

        let bullets = &ast.children[1];
        assert!(matches!(
            bullets.data,
            NodeData::List(ListData { ordered: false, .. })
        ));
    }

    #[test]
    fn test_parse_inline_elements() {
        let arena = AstArena::new();
        let ast = parse(&arena, "*italic* **bold** ~~gone~~ `code`");

        let kinds: Vec<NodeType> = ast.children[0]
            .children
            .iter()
            .map(|c| c.node_type)
            .filter(|t| *t != NodeType::Text)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeType::Emphasis,
                NodeType::Strong,
                NodeType::Strikethrough,
                NodeType::Code
            ]
        );
    }

    #[test]
    fn test_commonmark_has_no_strikethrough() {
        let arena = AstArena::new();
        let ast = MarkdownParser::commonmark()
            .parse(&arena, "~~gone~~")
            .unwrap();

        assert!(
            ast.children[0]
                .children
                .iter()
                .all(|c| c.node_type != NodeType::Strikethrough)
        );
    }

    #[test]
    fn test_parse_table() {
        let arena = AstArena::new();
        let ast = parse(&arena, "| A | B |\n|---|---|\n| 1 | 2 |");

        let table = &ast.children[0];
        assert_eq!(table.node_type, NodeType::Table);
        assert_eq!(table.children[0].node_type, NodeType::TableRow);
        assert_eq!(table.children[0].children[0].node_type, NodeType::TableCell);
    }

    #[test]
    fn test_parse_html_block() {
        let arena = AstArena::new();
        let ast = parse(&arena, "<center>HTML content</center>");

        let html = &ast.children[0];
        assert_eq!(html.node_type, NodeType::Html);
        assert_eq!(html.text(), Some("<center>HTML content</center>"));
    }

    #[test]
    fn test_parse_definition() {
        let arena = AstArena::new();
        let ast = parse(&arena, "[home]: https://example.com \"Home\"");

        let def = &ast.children[0];
        assert_eq!(def.node_type, NodeType::Definition);
        match def.data {
            NodeData::Definition(data) => {
                assert_eq!(data.identifier, "home");
                assert_eq!(data.url, "https://example.com");
                assert_eq!(data.title, Some("Home"));
            }
            other => panic!("Expected definition data, got {other:?}"),
        }
    }

    #[test]
    fn test_span_positions() {
        let arena = AstArena::new();
        let ast = parse(&arena, "Hello");

        assert_eq!(ast.span, Span::new(0, 5));
        assert_eq!(ast.children[0].span, Span::new(0, 5));
    }

    #[rstest]
    #[case("md", true)]
    #[case("MD", true)]
    #[case("markdown", true)]
    #[case("mkd", true)]
    #[case("txt", false)]
    fn test_extensions(#[case] extension: &str, #[case] expected: bool) {
        let parser = MarkdownParser::default();

        assert_eq!(parser.name(), "markdown");
        assert_eq!(parser.can_parse(extension), expected);
    }

    #[test]
    fn test_parser_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MarkdownParser>();
    }

    #[test]
    fn test_reference_link_resolves_to_definition() {
        let arena = AstArena::new();
        let ast = parse(&arena, "see [docs][R]\n\n[r]: https://example.com \"Docs\"");

        let link = &ast.children[0].children[1];
        assert_eq!(link.node_type, NodeType::Link);
        assert_eq!(link.collect_text(), "docs");
        let data = link.link().unwrap();
        assert_eq!(data.url, "https://example.com");
        assert_eq!(data.title, Some("Docs"));
    }

    #[test]
    fn test_reference_image_resolves_to_definition() {
        let arena = AstArena::new();
        let ast = parse(&arena, "![logo][r] ![][r]\n\n[r]: https://example.com/a.png");

        let paragraph = &ast.children[0];
        let images: Vec<_> = paragraph
            .children
            .iter()
            .filter(|child| child.node_type == NodeType::Image)
            .collect();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].text(), Some("logo"));
        assert_eq!(images[0].link().unwrap().url, "https://example.com/a.png");
        assert_eq!(images[1].text(), Some(""));
    }

    #[test]
    fn test_first_definition_wins() {
        let arena = AstArena::new();
        let ast = parse(
            &arena,
            "[a][x]\n\n[x]: https://first.example\n[x]: https://second.example",
        );

        let link = &ast.children[0].children[0];
        assert_eq!(link.link().unwrap().url, "https://first.example");
    }

    #[rstest]
    #[case("---\ntitle: Notes\n---\n\n# Notes", "yaml")]
    #[case("+++\ntitle = \"Notes\"\n+++\n\n# Notes", "toml")]
    fn test_frontmatter_is_custom_node(#[case] source: &str, #[case] name: &str) {
        let arena = AstArena::new();
        let ast = MarkdownParser::new()
            .with_frontmatter()
            .parse(&arena, source)
            .unwrap();

        assert_eq!(ast.children[0].node_type.name(), name);
        assert!(matches!(ast.children[0].node_type, NodeType::Custom(_)));
        assert_eq!(ast.children[1].node_type, NodeType::Heading);
    }

    #[test]
    fn test_parse_empty_document() {
        let arena = AstArena::new();
        let ast = parse(&arena, "");

        assert_eq!(ast.node_type, NodeType::Document);
        assert!(ast.children.is_empty());
    }
}
