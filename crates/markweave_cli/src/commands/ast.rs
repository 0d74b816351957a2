//! Ast command implementation

use std::fmt::Write;
use std::path::Path;

use miette::{IntoDiagnostic, Result};

use markweave_ast::{AstArena, Node};
use markweave_core::Markweave;

pub fn run_ast(markweave: &Markweave, path: &Path) -> Result<()> {
    let source = std::fs::read_to_string(path).into_diagnostic()?;
    let arena = AstArena::new();
    let document = markweave
        .parser()
        .parse(&arena, &source)
        .into_diagnostic()?;

    let mut out = String::new();
    write_node(&mut out, &document, 0);
    print!("{out}");
    Ok(())
}

/// Writes one line per node: type, byte range and text value.
fn write_node(out: &mut String, node: &Node<'_>, depth: usize) {
    let _ = write!(
        out,
        "{:indent$}{} [{}..{}]",
        "",
        node.node_type,
        node.span.start,
        node.span.end,
        indent = depth * 2
    );
    if let Some(value) = node.value {
        let _ = write!(out, " {value:?}");
    }
    out.push('\n');
    for child in node.children {
        write_node(out, child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_ast::{NodeType, Span};

    #[test]
    fn test_write_node_indents_children() {
        let arena = AstArena::new();
        let text = Node::new_text(NodeType::Text, Span::new(0, 2), arena.alloc_str("hi"));
        let paragraph =
            Node::new_parent(NodeType::Paragraph, Span::new(0, 2), arena.alloc_slice_copy(&[text]));

        let mut out = String::new();
        write_node(&mut out, &paragraph, 0);

        assert_eq!(out, "Paragraph [0..2]\n  Text [0..2] \"hi\"\n");
    }
}
