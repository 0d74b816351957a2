//! Node type to visit action table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use markweave_ast::{Node, NodeType};
use tracing::debug;

use crate::RenderError;
use crate::engine::VisitContext;

/// Renders one node: emits text, recurses into children, sets props.
pub trait NodeVisitor: Send + Sync {
    fn visit(&self, ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError>;
}

struct FnVisitor<F>(F);

impl<F> NodeVisitor for FnVisitor<F>
where
    F: Fn(&mut VisitContext<'_, '_>, &Node<'_>) -> Result<(), RenderError> + Send + Sync,
{
    fn visit(&self, ctx: &mut VisitContext<'_, '_>, node: &Node<'_>) -> Result<(), RenderError> {
        (self.0)(ctx, node)
    }
}

#[derive(Clone)]
enum Entry {
    Action(Arc<dyn NodeVisitor>),
    Suppressed,
}

/// Result of looking up a node type.
pub enum Visit<'t> {
    /// Run the action.
    Action(&'t dyn NodeVisitor),
    /// Render nothing for the node and its subtree.
    Suppressed,
    /// Render nothing for the node itself but still visit its children.
    Absent,
}

/// Frozen visitor table.
#[derive(Clone, Default)]
pub struct VisitorTable {
    entries: HashMap<NodeType, Entry>,
}

impl VisitorTable {
    pub fn builder() -> VisitorTableBuilder {
        VisitorTableBuilder::default()
    }

    pub fn lookup(&self, node_type: NodeType) -> Visit<'_> {
        match self.entries.get(&node_type) {
            Some(Entry::Action(visitor)) => Visit::Action(visitor.as_ref()),
            Some(Entry::Suppressed) => Visit::Suppressed,
            None => Visit::Absent,
        }
    }

    pub fn is_suppressed(&self, node_type: NodeType) -> bool {
        matches!(self.entries.get(&node_type), Some(Entry::Suppressed))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for VisitorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.entries.keys().collect();
        types.sort();
        f.debug_struct("VisitorTable").field("types", &types).finish()
    }
}

/// Collects visit actions while plugins are configured.
///
/// Each node type has at most one entry; a later call replaces the earlier
/// one.
#[derive(Default)]
pub struct VisitorTableBuilder {
    entries: HashMap<NodeType, Entry>,
}

impl VisitorTableBuilder {
    /// Registers a closure as the visit action of `node_type`.
    pub fn on<F>(&mut self, node_type: NodeType, visit: F) -> &mut Self
    where
        F: Fn(&mut VisitContext<'_, '_>, &Node<'_>) -> Result<(), RenderError>
            + Send
            + Sync
            + 'static,
    {
        self.on_visitor(node_type, FnVisitor(visit))
    }

    /// Registers a [`NodeVisitor`] as the visit action of `node_type`.
    pub fn on_visitor(&mut self, node_type: NodeType, visitor: impl NodeVisitor + 'static) -> &mut Self {
        self.insert(node_type, Entry::Action(Arc::new(visitor)))
    }

    /// Disables rendering of `node_type` and its whole subtree.
    pub fn suppress(&mut self, node_type: NodeType) -> &mut Self {
        self.insert(node_type, Entry::Suppressed)
    }

    /// Drops any entry for `node_type`; its children are still visited.
    pub fn remove(&mut self, node_type: NodeType) -> &mut Self {
        if self.entries.remove(&node_type).is_some() {
            debug!(node_type = %node_type, "Visitor removed");
        }
        self
    }

    pub fn contains(&self, node_type: NodeType) -> bool {
        self.entries.contains_key(&node_type)
    }

    fn insert(&mut self, node_type: NodeType, entry: Entry) -> &mut Self {
        let suppressed = matches!(entry, Entry::Suppressed);
        if self.entries.insert(node_type, entry).is_some() {
            debug!(node_type = %node_type, suppressed, "Visitor overridden");
        }
        self
    }

    /// Freezes the table.
    pub fn build(self) -> VisitorTable {
        VisitorTable {
            entries: self.entries,
        }
    }
}
