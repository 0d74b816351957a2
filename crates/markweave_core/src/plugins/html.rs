//! Raw HTML rendering with per-tag handlers.
//!
//! Inline HTML reaches the renderer split across nodes (`<b>`, text,
//! `</b>`), so open tags are tracked for the whole render call and an
//! element is annotated when its end tag shows up, whichever node that is.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use markweave_ast::{Node, NodeType};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::{trace, warn};

use crate::configuration::Configuration;
use crate::engine::VisitContext;
use crate::handler_table::HandlerTable;
use crate::image_size::{Dimension, ImageSize};
use crate::plugin::{Builders, CapabilityId, Plugin};
use crate::props::RenderProps;
use crate::style::Style;
use crate::RenderError;

const OBJECT_REPLACEMENT: &str = "\u{FFFC}";

/// Elements that never have an end tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements that open a new block when they start an HTML fragment.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "div", "dl", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "ol", "p", "pre", "section",
    "table", "ul",
];

/// An HTML element and the text range it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlTag {
    /// Lowercase tag name.
    pub name: String,
    pub attributes: HashMap<String, String>,
    pub start: usize,
    pub end: usize,
}

impl HtmlTag {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Produces the styles of one or more HTML elements.
pub trait TagHandler: Send + Sync {
    /// Lowercase tag names this handler is registered for.
    fn supported_tags(&self) -> &[&str];

    fn styles(&self, configuration: &Configuration, props: &RenderProps<'_>, tag: &HtmlTag)
    -> Vec<Style>;
}

/// Inline formatting elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleTagHandler;

impl TagHandler for StyleTagHandler {
    fn supported_tags(&self) -> &[&str] {
        &[
            "b", "strong", "i", "em", "cite", "dfn", "s", "del", "strike", "u", "ins", "sub", "sup",
        ]
    }

    fn styles(&self, _: &Configuration, _: &RenderProps<'_>, tag: &HtmlTag) -> Vec<Style> {
        let style = match tag.name.as_str() {
            "b" | "strong" => Style::Bold,
            "i" | "em" | "cite" | "dfn" => Style::Italic,
            "s" | "del" | "strike" => Style::Strikethrough,
            "u" | "ins" => Style::Underline,
            "sub" => Style::Subscript,
            "sup" => Style::Superscript,
            _ => return Vec::new(),
        };
        vec![style]
    }
}

/// `<a href>`, styled like a Markdown link.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkTagHandler;

impl TagHandler for LinkTagHandler {
    fn supported_tags(&self) -> &[&str] {
        &["a"]
    }

    fn styles(&self, configuration: &Configuration, _: &RenderProps<'_>, tag: &HtmlTag) -> Vec<Style> {
        let Some(href) = tag.attribute("href") else {
            return Vec::new();
        };
        let theme = configuration.theme();
        vec![Style::Link {
            url: configuration.url_processor().process(href),
            color: theme.link_color,
            underlined: theme.link_underlined,
        }]
    }
}

/// `<img src width height>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageTagHandler;

impl TagHandler for ImageTagHandler {
    fn supported_tags(&self) -> &[&str] {
        &["img"]
    }

    fn styles(&self, configuration: &Configuration, _: &RenderProps<'_>, tag: &HtmlTag) -> Vec<Style> {
        let Some(src) = tag.attribute("src") else {
            return Vec::new();
        };
        let width = tag.attribute("width").and_then(Dimension::parse);
        let height = tag.attribute("height").and_then(Dimension::parse);
        let size = (width.is_some() || height.is_some()).then(|| ImageSize::new(width, height));
        vec![Style::Image {
            destination: configuration.url_processor().process(src),
            source: None,
            size,
        }]
    }
}

/// Renders raw HTML nodes.
#[derive(Debug, Clone)]
pub struct HtmlPlugin {
    handlers: HandlerTable<dyn TagHandler>,
}

impl HtmlPlugin {
    pub const ID: CapabilityId = "html";

    /// Creates the plugin with handlers for inline formatting, links and
    /// images.
    pub fn new() -> Self {
        let mut plugin = Self::empty();
        plugin
            .add_handler(StyleTagHandler)
            .add_handler(LinkTagHandler)
            .add_handler(ImageTagHandler);
        plugin
    }

    /// Creates the plugin without tag handlers. Tags still render their text.
    pub fn empty() -> Self {
        Self {
            handlers: HandlerTable::new(),
        }
    }

    /// Registers `handler` for each of its tags, replacing previous ones.
    pub fn add_handler(&mut self, handler: impl TagHandler + 'static) -> &mut Self {
        let handler: Arc<dyn TagHandler> = Arc::new(handler);
        for tag in handler.supported_tags() {
            self.handlers.insert(tag, Arc::clone(&handler));
        }
        self
    }

    /// Stops annotating `tag`; its text is still rendered.
    pub fn exclude_tag(&mut self, tag: &str) -> &mut Self {
        self.handlers.remove(tag);
        self
    }

    pub fn handlers(&self) -> &HandlerTable<dyn TagHandler> {
        &self.handlers
    }
}

impl Default for HtmlPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for HtmlPlugin {
    fn id(&self) -> CapabilityId {
        Self::ID
    }

    fn configure(&self, builders: &mut Builders) {
        let handlers = self.handlers.clone();
        builders.visitors.on(NodeType::Html, move |ctx, node| {
            visit_html(ctx, node, &handlers)
        });
    }
}

/// Elements started but not yet closed in the current render call.
#[derive(Default)]
struct OpenTags(Vec<HtmlTag>);

fn visit_html(
    ctx: &mut VisitContext<'_, '_>,
    node: &Node<'_>,
    handlers: &HandlerTable<dyn TagHandler>,
) -> Result<(), RenderError> {
    let Some(raw) = node.value else {
        return Ok(());
    };

    let mut reader = Reader::from_str(raw);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut leading = true;
    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, position = reader.buffer_position(), "Malformed HTML, rest of fragment skipped");
                break;
            }
        };
        match event {
            Event::Start(e) => {
                let tag = begin_tag(ctx, open_tag(&reader, &e), &mut leading);
                if VOID_TAGS.contains(&tag.name.as_str()) {
                    close_void(ctx, handlers, tag)?;
                } else {
                    ctx.scratch::<OpenTags>().0.push(tag);
                }
            }
            Event::Empty(e) => {
                let tag = begin_tag(ctx, open_tag(&reader, &e), &mut leading);
                close_void(ctx, handlers, tag)?;
            }
            Event::End(e) => {
                let name = decode_name(&reader, e.name().as_ref());
                let open = &mut ctx.scratch::<OpenTags>().0;
                let Some(index) = open.iter().rposition(|tag| tag.name == name) else {
                    trace!(tag = %name, "End tag without a start tag");
                    continue;
                };
                // Elements left open inside this one end with it.
                let mut tag = open.swap_remove(index);
                open.truncate(index);
                tag.end = ctx.len();
                apply(ctx, handlers, &tag)?;
            }
            Event::Text(e) => {
                let text = reader
                    .decoder()
                    .decode(&e)
                    .map_or_else(|_| String::from_utf8_lossy(&e).into_owned(), Cow::into_owned);
                leading &= text.trim().is_empty();
                ctx.push_str(&text);
            }
            Event::GeneralRef(e) => {
                let entity = String::from_utf8_lossy(&e);
                leading = false;
                ctx.push_str(&decode_entity(&entity));
            }
            Event::CData(e) => {
                leading = false;
                ctx.push_str(&String::from_utf8_lossy(&e));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

/// Places `tag` at the cursor, opening a block first when a block element
/// leads the fragment.
fn begin_tag(ctx: &mut VisitContext<'_, '_>, mut tag: HtmlTag, leading: &mut bool) -> HtmlTag {
    if std::mem::take(leading) && BLOCK_TAGS.contains(&tag.name.as_str()) {
        ctx.block_start();
    }
    tag.start = ctx.len();
    tag.end = tag.start;
    tag
}

/// Renders a void element and annotates what it emitted.
fn close_void(
    ctx: &mut VisitContext<'_, '_>,
    handlers: &HandlerTable<dyn TagHandler>,
    mut tag: HtmlTag,
) -> Result<(), RenderError> {
    match tag.name.as_str() {
        "br" => ctx.push('\n'),
        "img" => match tag.attribute("alt") {
            Some(alt) if !alt.is_empty() => ctx.push_str(alt),
            _ => ctx.push_str(OBJECT_REPLACEMENT),
        },
        _ => {}
    }
    tag.end = ctx.len();
    apply(ctx, handlers, &tag)
}

fn apply(
    ctx: &mut VisitContext<'_, '_>,
    handlers: &HandlerTable<dyn TagHandler>,
    tag: &HtmlTag,
) -> Result<(), RenderError> {
    let Some(handler) = handlers.get(&tag.name) else {
        return Ok(());
    };
    let styles = handler.styles(ctx.configuration(), ctx.props(), tag);
    for style in styles {
        ctx.annotate(tag.start, tag.end, style)?;
    }
    Ok(())
}

fn open_tag(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> HtmlTag {
    let mut attributes = HashMap::new();
    for attr in e.html_attributes().flatten() {
        let key = decode_name(reader, attr.key.as_ref());
        let value = attr
            .unescape_value()
            .map_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned(), Cow::into_owned);
        attributes.insert(key, value);
    }
    HtmlTag {
        name: decode_name(reader, e.name().as_ref()),
        attributes,
        start: 0,
        end: 0,
    }
}

fn decode_name(reader: &Reader<&[u8]>, name: &[u8]) -> String {
    reader
        .decoder()
        .decode(name)
        .map_or_else(|_| String::from_utf8_lossy(name).into_owned(), Cow::into_owned)
        .to_ascii_lowercase()
}

/// Decodes the body of an entity reference such as `amp` or `#x27`.
fn decode_entity(entity: &str) -> String {
    let decoded = match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        "nbsp" => Some('\u{00A0}'),
        _ => entity.strip_prefix('#').and_then(|code| {
            let code = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };
    decoded.map_or_else(|| format!("&{entity};"), |c| c.to_string())
}
