//! Node type to span factory table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use markweave_ast::NodeType;
use tracing::debug;

use crate::configuration::Configuration;
use crate::props::RenderProps;
use crate::style::Style;
use crate::RenderError;

/// Produces the styles of a node's emitted range.
///
/// Runs once per visited node, after its visit action completed.
pub trait SpanFactory: Send + Sync {
    fn create(
        &self,
        configuration: &Configuration,
        props: &RenderProps<'_>,
    ) -> Result<Vec<Style>, RenderError>;
}

struct FnFactory<F>(F);

impl<F> SpanFactory for FnFactory<F>
where
    F: Fn(&Configuration, &RenderProps<'_>) -> Vec<Style> + Send + Sync,
{
    fn create(
        &self,
        configuration: &Configuration,
        props: &RenderProps<'_>,
    ) -> Result<Vec<Style>, RenderError> {
        Ok((self.0)(configuration, props))
    }
}

/// Runs two factories and concatenates their styles.
struct Chain {
    first: Arc<dyn SpanFactory>,
    second: Arc<dyn SpanFactory>,
}

impl SpanFactory for Chain {
    fn create(
        &self,
        configuration: &Configuration,
        props: &RenderProps<'_>,
    ) -> Result<Vec<Style>, RenderError> {
        let mut styles = self.first.create(configuration, props)?;
        styles.extend(self.second.create(configuration, props)?);
        Ok(styles)
    }
}

/// Frozen span factory table.
#[derive(Clone, Default)]
pub struct SpanFactoryTable {
    factories: HashMap<NodeType, Arc<dyn SpanFactory>>,
}

impl SpanFactoryTable {
    pub fn builder() -> SpanFactoryTableBuilder {
        SpanFactoryTableBuilder::default()
    }

    pub fn get(&self, node_type: NodeType) -> Option<&dyn SpanFactory> {
        self.factories.get(&node_type).map(|factory| factory.as_ref())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for SpanFactoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.factories.keys().collect();
        types.sort();
        f.debug_struct("SpanFactoryTable")
            .field("types", &types)
            .finish()
    }
}

/// Collects span factories while plugins are configured.
#[derive(Default)]
pub struct SpanFactoryTableBuilder {
    factories: HashMap<NodeType, Arc<dyn SpanFactory>>,
}

impl SpanFactoryTableBuilder {
    /// Sets the factory of `node_type`, replacing any previous one.
    pub fn set_factory<F>(&mut self, node_type: NodeType, factory: F) -> &mut Self
    where
        F: Fn(&Configuration, &RenderProps<'_>) -> Vec<Style> + Send + Sync + 'static,
    {
        self.set_span_factory(node_type, FnFactory(factory))
    }

    /// Sets a fallible [`SpanFactory`] for `node_type`, replacing any previous one.
    pub fn set_span_factory(
        &mut self,
        node_type: NodeType,
        factory: impl SpanFactory + 'static,
    ) -> &mut Self {
        if self.factories.insert(node_type, Arc::new(factory)).is_some() {
            debug!(node_type = %node_type, "Span factory overridden");
        }
        self
    }

    /// Adds a factory whose styles follow those of the existing one.
    pub fn append_factory<F>(&mut self, node_type: NodeType, factory: F) -> &mut Self
    where
        F: Fn(&Configuration, &RenderProps<'_>) -> Vec<Style> + Send + Sync + 'static,
    {
        let appended: Arc<dyn SpanFactory> = Arc::new(FnFactory(factory));
        let combined: Arc<dyn SpanFactory> = match self.factories.remove(&node_type) {
            Some(first) => Arc::new(Chain {
                first,
                second: appended,
            }),
            None => appended,
        };
        self.factories.insert(node_type, combined);
        self
    }

    pub fn remove(&mut self, node_type: NodeType) -> &mut Self {
        if self.factories.remove(&node_type).is_some() {
            debug!(node_type = %node_type, "Span factory removed");
        }
        self
    }

    pub fn get(&self, node_type: NodeType) -> Option<&dyn SpanFactory> {
        self.factories.get(&node_type).map(|factory| factory.as_ref())
    }

    /// Freezes the table.
    pub fn build(self) -> SpanFactoryTable {
        SpanFactoryTable {
            factories: self.factories,
        }
    }
}
