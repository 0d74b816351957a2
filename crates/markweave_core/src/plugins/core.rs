//! Baseline rendering of CommonMark and GFM nodes.

use markweave_ast::{Node, NodeData, NodeType};

use crate::engine::VisitContext;
use crate::plugin::{Builders, CapabilityId, Plugin};
use crate::props::Prop;
use crate::style::Style;
use crate::RenderError;

const NBSP: char = '\u{00A0}';
const TABLE_CELL_SEPARATOR: &str = " | ";

/// Props written by the core visit actions.
pub struct CoreProps;

impl CoreProps {
    pub const HEADING_LEVEL: Prop<u8> = Prop::new("heading_level");
    pub const CODE_BLOCK_LANGUAGE: Prop<String> = Prop::new("code_block_language");
    pub const LINK_DESTINATION: Prop<String> = Prop::new("link_destination");
    pub const LIST_ORDERED: Prop<bool> = Prop::new("list_ordered");
    /// Nesting depth of the closest list, 0 at the top level.
    pub const LIST_LEVEL: Prop<u32> = Prop::new("list_level");
    pub const LIST_TIGHT: Prop<bool> = Prop::new("list_tight");
    pub const LIST_ITEM_NUMBER: Prop<u32> = Prop::new("list_item_number");
}

/// Renders every built-in node type that has a textual form.
///
/// Images, raw HTML and footnotes have no entry here; the images and HTML
/// plugins add the first two.
#[derive(Debug, Default)]
pub struct CorePlugin;

impl CorePlugin {
    pub const ID: CapabilityId = "core";

    pub fn new() -> Self {
        Self
    }
}

impl Plugin for CorePlugin {
    fn id(&self) -> CapabilityId {
        Self::ID
    }

    fn priority(&self) -> i32 {
        i32::MIN
    }

    fn dependencies(&self) -> Vec<CapabilityId> {
        Vec::new()
    }

    fn configure(&self, builders: &mut Builders) {
        builders
            .visitors
            .on(NodeType::Document, |ctx, node| ctx.visit_children(node))
            .on(NodeType::Heading, visit_heading)
            .on(NodeType::Paragraph, visit_paragraph)
            .on(NodeType::Text, visit_text)
            .on(NodeType::Break, |ctx, _| {
                ctx.push('\n');
                Ok(())
            })
            .on(NodeType::Emphasis, |ctx, node| ctx.visit_children(node))
            .on(NodeType::Strong, |ctx, node| ctx.visit_children(node))
            .on(NodeType::Strikethrough, |ctx, node| ctx.visit_children(node))
            .on(NodeType::Code, visit_code)
            .on(NodeType::CodeBlock, visit_code_block)
            .on(NodeType::BlockQuote, |ctx, node| {
                ctx.block_start();
                ctx.visit_children(node)
            })
            .on(NodeType::List, visit_list)
            .on(NodeType::ListItem, |ctx, node| {
                ctx.ensure_newline();
                ctx.visit_children(node)
            })
            .on(NodeType::ThematicBreak, |ctx, _| {
                ctx.block_start();
                ctx.push(NBSP);
                Ok(())
            })
            .on(NodeType::Link, visit_link)
            .on(NodeType::Table, |ctx, node| {
                ctx.block_start();
                ctx.visit_children(node)
            })
            .on(NodeType::TableRow, visit_table_row)
            .on(NodeType::TableCell, |ctx, node| ctx.visit_children(node))
            .suppress(NodeType::Definition);

        builders
            .spans
            .set_factory(NodeType::Heading, |config, props| {
                let theme = config.theme();
                let level = props.get(CoreProps::HEADING_LEVEL).copied().unwrap_or(1);
                let mut styles = vec![
                    Style::Heading { level },
                    Style::RelativeSize {
                        multiplier: theme.heading_text_size(level),
                    },
                ];
                if level <= 2 {
                    styles.push(Style::HeadingBreak {
                        color: theme.heading_break_color,
                        height: theme.heading_break_height,
                    });
                }
                styles
            })
            .set_factory(NodeType::Emphasis, |_, _| vec![Style::Italic])
            .set_factory(NodeType::Strong, |_, _| vec![Style::Bold])
            .set_factory(NodeType::Strikethrough, |_, _| vec![Style::Strikethrough])
            .set_factory(NodeType::Code, |config, _| {
                let theme = config.theme();
                vec![
                    Style::Code {
                        text_color: theme.code_text_color,
                        background_color: theme.code_background_color,
                    },
                    Style::RelativeSize {
                        multiplier: theme.code_text_size_multiplier,
                    },
                ]
            })
            .set_factory(NodeType::CodeBlock, |config, props| {
                let theme = config.theme();
                vec![
                    Style::CodeBlock {
                        language: props.get(CoreProps::CODE_BLOCK_LANGUAGE).cloned(),
                        text_color: theme.code_block_text_color,
                        background_color: theme.code_block_background_color,
                        margin: theme.code_block_margin,
                    },
                    Style::RelativeSize {
                        multiplier: theme.code_text_size_multiplier,
                    },
                ]
            })
            .set_factory(NodeType::BlockQuote, |config, _| {
                let theme = config.theme();
                vec![Style::BlockQuote {
                    color: theme.block_quote_color,
                    width: theme.block_quote_width,
                    margin: theme.block_margin,
                }]
            })
            .set_factory(NodeType::ListItem, |config, props| {
                let theme = config.theme();
                let ordered = props.get(CoreProps::LIST_ORDERED).copied().unwrap_or(false);
                let number = props.get(CoreProps::LIST_ITEM_NUMBER).copied();
                vec![Style::ListItem {
                    ordered,
                    number: number.filter(|_| ordered),
                    level: props.get(CoreProps::LIST_LEVEL).copied().unwrap_or(0),
                    color: theme.list_item_color,
                    bullet_width: theme.bullet_width,
                    margin: theme.block_margin,
                }]
            })
            .set_factory(NodeType::ThematicBreak, |config, _| {
                let theme = config.theme();
                vec![Style::ThematicBreak {
                    color: theme.thematic_break_color,
                    height: theme.thematic_break_height,
                }]
            })
            .set_factory(NodeType::Link, |config, props| {
                let theme = config.theme();
                vec![Style::Link {
                    url: props
                        .get(CoreProps::LINK_DESTINATION)
                        .cloned()
                        .unwrap_or_default(),
                    color: theme.link_color,
                    underlined: theme.link_underlined,
                }]
            });
    }
}

fn visit_heading(ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
    ctx.block_start();
    ctx.props_mut()
        .set(CoreProps::HEADING_LEVEL, node.heading_depth().unwrap_or(1));
    ctx.visit_children(node)
}

/// Paragraphs of a tight list item follow the item's newline directly.
fn visit_paragraph(ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
    if ctx.props().get(CoreProps::LIST_TIGHT) != Some(&true) {
        ctx.block_start();
    }
    ctx.visit_children(node)
}

fn visit_text(ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
    let value = node.value.unwrap_or_default();
    if ctx.configuration().soft_break_adds_new_line() || !value.contains('\n') {
        ctx.push_str(value);
    } else {
        ctx.push_str(&value.replace('\n', " "));
    }
    Ok(())
}

fn visit_code(ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
    ctx.push(NBSP);
    ctx.push_str(node.value.unwrap_or_default());
    ctx.push(NBSP);
    Ok(())
}

fn visit_code_block(ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
    ctx.block_start();

    let code = node.value.unwrap_or_default();
    let language = match node.data {
        NodeData::CodeBlock(language) => language,
        _ => None,
    };
    if let Some(language) = language {
        ctx.props_mut()
            .set(CoreProps::CODE_BLOCK_LANGUAGE, language.to_string());
    }

    let base = ctx.len();
    ctx.push_str(code);
    for span in ctx
        .configuration()
        .syntax_highlight()
        .highlight(language, code)
    {
        ctx.annotate(base + span.start, base + span.end, span.style)?;
    }
    Ok(())
}

fn visit_list(ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
    let (ordered, start, spread) = match node.data {
        NodeData::List(list) => (list.ordered, list.start, list.spread),
        _ => (false, None, false),
    };

    let outer = ctx.props().get(CoreProps::LIST_LEVEL).copied();
    let level = match outer {
        Some(outer) => {
            ctx.ensure_newline();
            outer + 1
        }
        None => {
            ctx.block_start();
            0
        }
    };

    let props = ctx.props_mut();
    props.set(CoreProps::LIST_LEVEL, level);
    props.set(CoreProps::LIST_ORDERED, ordered);
    props.set(CoreProps::LIST_TIGHT, !spread);

    let mut number = start.unwrap_or(1);
    for item in node.children {
        ctx.props_mut().set(CoreProps::LIST_ITEM_NUMBER, number);
        ctx.visit_child(item)?;
        number = number.saturating_add(1);
    }
    Ok(())
}

/// One line per row, cells separated by `" | "`.
fn visit_table_row(ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
    ctx.ensure_newline();
    for (index, cell) in node.children.iter().enumerate() {
        if index > 0 {
            ctx.push_str(TABLE_CELL_SEPARATOR);
        }
        ctx.visit_child(cell)?;
    }
    Ok(())
}

fn visit_link(ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
    if let Some(link) = node.link() {
        let destination = ctx.configuration().url_processor().process(link.url);
        ctx.props_mut().set(CoreProps::LINK_DESTINATION, destination);
    }
    ctx.visit_children(node)
}
