//! Plugin contract.

use std::any::Any;

use crate::BuildError;
use crate::configuration::ConfigurationBuilder;
use crate::plugins::CorePlugin;
use crate::registry::PluginRegistry;
use crate::span_table::SpanFactoryTableBuilder;
use crate::theme::ThemeBuilder;
use crate::visitor_table::VisitorTableBuilder;

/// Unique identifier of the capability a plugin provides.
pub type CapabilityId = &'static str;

/// A unit of rendering behavior.
///
/// Plugins are composed by [`PluginRegistry`]: every plugin is set up and
/// configured exactly once per build, after all of its dependencies.
///
/// ```rust
/// use markweave_core::{Builders, CapabilityId, Markweave, Plugin, Style};
/// use markweave_ast::NodeType;
///
/// struct LoudHeadings;
///
/// impl Plugin for LoudHeadings {
///     fn id(&self) -> CapabilityId {
///         "loud-headings"
///     }
///
///     fn configure(&self, builders: &mut Builders) {
///         builders
///             .spans
///             .append_factory(NodeType::Heading, |_, _| vec![Style::Bold]);
///     }
/// }
///
/// let markweave = Markweave::builder().use_plugin(LoudHeadings).build().unwrap();
/// let output = markweave.render_markdown("# Hi").unwrap();
/// assert!(output.spans.iter().any(|span| span.style == Style::Bold));
/// ```
pub trait Plugin: Any + Send + Sync {
    fn id(&self) -> CapabilityId;

    /// Ordering key among plugins without a dependency between them.
    /// Lower values configure first.
    fn priority(&self) -> i32 {
        0
    }

    /// Capabilities that must be configured before this plugin.
    ///
    /// Defaults to the core plugin so that every plugin overrides the
    /// baseline rendering.
    fn dependencies(&self) -> Vec<CapabilityId> {
        vec![CorePlugin::ID]
    }

    /// One-time hook to look up and customize other plugins.
    ///
    /// While it runs, this plugin is detached from the registry.
    fn setup(&mut self, _registry: &mut PluginRegistry) -> Result<(), BuildError> {
        Ok(())
    }

    /// One-time hook to contribute to the pipeline builders.
    fn configure(&self, builders: &mut Builders);
}

/// The builders every plugin configures.
#[derive(Default)]
pub struct Builders {
    pub configuration: ConfigurationBuilder,
    pub theme: ThemeBuilder,
    pub visitors: VisitorTableBuilder,
    pub spans: SpanFactoryTableBuilder,
}

impl Builders {
    pub fn new() -> Self {
        Self::default()
    }
}
