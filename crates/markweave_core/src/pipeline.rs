//! Pipeline construction and the public render entry points.

use std::sync::Arc;

use markweave_ast::{AstArena, Node};
use markweave_parser::{MarkdownParser, Parser};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::configuration::Configuration;
use crate::engine::{RenderEngine, RenderOutput};
use crate::error::{BuildError, ConfigError, RenderError};
use crate::plugin::{Builders, CapabilityId, Plugin};
use crate::plugins::{
    ConfigFilePlugin, CorePlugin, HtmlPlugin, ImagesPlugin, SoftBreakAddsNewLinePlugin,
};
use crate::registry::PluginRegistry;
use crate::theme::Theme;

/// A frozen render pipeline.
///
/// Cheap to clone and safe to share between threads.
#[derive(Clone)]
pub struct Markweave {
    engine: RenderEngine,
    parser: Arc<dyn Parser>,
    plugins: Vec<CapabilityId>,
}

impl Markweave {
    /// Starts a pipeline with the core plugin registered.
    pub fn builder() -> MarkweaveBuilder {
        MarkweaveBuilder::new()
    }

    /// Renders a tree produced by any parser.
    pub fn render(&self, document: &Node<'_>) -> Result<RenderOutput, RenderError> {
        self.engine.render(document)
    }

    /// Parses and renders `source`.
    pub fn render_markdown(&self, source: &str) -> Result<RenderOutput, RenderError> {
        let arena = AstArena::new();
        let document = self.parser.parse(&arena, source)?;
        self.engine.render(&document)
    }

    /// Renders many sources in parallel. Results keep the input order.
    pub fn render_all(&self, sources: &[&str]) -> Vec<Result<RenderOutput, RenderError>> {
        sources
            .par_iter()
            .map(|source| self.render_markdown(source))
            .collect()
    }

    pub fn engine(&self) -> &RenderEngine {
        &self.engine
    }

    pub fn configuration(&self) -> &Configuration {
        self.engine.configuration()
    }

    pub fn theme(&self) -> &Theme {
        self.engine.configuration().theme()
    }

    pub fn parser(&self) -> &dyn Parser {
        self.parser.as_ref()
    }

    /// Capabilities in the order they were configured.
    pub fn plugins(&self) -> &[CapabilityId] {
        &self.plugins
    }
}

impl std::fmt::Debug for Markweave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Markweave")
            .field("parser", &self.parser.name())
            .field("plugins", &self.plugins)
            .field("engine", &self.engine)
            .finish()
    }
}

/// Collects plugins and freezes them into a [`Markweave`].
pub struct MarkweaveBuilder {
    registry: PluginRegistry,
    parser: Option<Arc<dyn Parser>>,
    error: Option<BuildError>,
}

impl MarkweaveBuilder {
    /// Creates a builder with [`CorePlugin`] registered.
    pub fn new() -> Self {
        Self::empty().use_plugin(CorePlugin::new())
    }

    /// Creates a builder without any plugin.
    ///
    /// Plugins keep their default dependency on the core capability, so a
    /// replacement must register under [`CorePlugin::ID`].
    pub fn empty() -> Self {
        Self {
            registry: PluginRegistry::new(),
            parser: None,
            error: None,
        }
    }

    /// Registers `plugin`. The first registration error is reported by
    /// [`build`](Self::build).
    pub fn use_plugin(mut self, plugin: impl Plugin) -> Self {
        if self.error.is_none()
            && let Err(e) = self.registry.register(plugin)
        {
            self.error = Some(e);
        }
        self
    }

    /// Replaces the default Markdown parser.
    pub fn parser(mut self, parser: impl Parser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Registers the plugins a config file asks for. Relative image paths
    /// resolve against the directory the config was loaded from.
    pub fn with_config(self, config: &RenderConfig) -> Result<Self, ConfigError> {
        let mut builder = self;
        if config.images {
            let images = match &config.base_dir {
                Some(dir) => ImagesPlugin::new().with_base_dir(dir),
                None => ImagesPlugin::new(),
            };
            builder = builder.use_plugin(images);
        }
        if config.html {
            builder = builder.use_plugin(HtmlPlugin::new());
        }
        if config.soft_break_adds_new_line {
            builder = builder.use_plugin(SoftBreakAddsNewLinePlugin::new());
        }
        Ok(builder.use_plugin(ConfigFilePlugin::new(config)?))
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Resolves the plugin order, runs every setup hook, then every
    /// configure hook, and freezes the result.
    pub fn build(self) -> Result<Markweave, BuildError> {
        let Self {
            mut registry,
            parser,
            error,
        } = self;
        if let Some(e) = error {
            return Err(e);
        }

        let order = registry.resolve_order()?;
        registry.seal();
        for &index in &order {
            registry.setup_at(index)?;
        }

        let mut builders = Builders::new();
        for &index in &order {
            registry.configure_at(index, &mut builders);
        }
        let Builders {
            configuration,
            theme,
            visitors,
            spans,
        } = builders;
        let visitors = visitors.build();
        let spans = spans.build();
        debug!(
            visitors = visitors.len(),
            span_factories = spans.len(),
            "Built render tables"
        );

        let plugins: Vec<CapabilityId> = order.iter().map(|&index| registry.id_at(index)).collect();
        info!(plugins = ?plugins, "Pipeline ready");

        Ok(Markweave {
            engine: RenderEngine::new(configuration.build(theme.build()), visitors, spans),
            parser: parser.unwrap_or_else(|| Arc::new(MarkdownParser::new())),
            plugins,
        })
    }
}

impl Default for MarkweaveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Color;
    use markweave_ast::NodeType;
    use pretty_assertions::assert_eq;

    struct Named(CapabilityId, Vec<CapabilityId>);

    impl Plugin for Named {
        fn id(&self) -> CapabilityId {
            self.0
        }

        fn dependencies(&self) -> Vec<CapabilityId> {
            self.1.clone()
        }

        fn configure(&self, _builders: &mut Builders) {}
    }

    struct LateRegistration;

    impl Plugin for LateRegistration {
        fn id(&self) -> CapabilityId {
            "late"
        }

        fn setup(&mut self, registry: &mut PluginRegistry) -> Result<(), BuildError> {
            registry.register(Named("sneaky", vec![]))
        }

        fn configure(&self, _builders: &mut Builders) {}
    }

    #[test]
    fn test_default_pipeline() {
        let markweave = Markweave::builder().build().unwrap();

        assert_eq!(markweave.plugins(), &["core"]);
        assert_eq!(markweave.parser().name(), "markdown");
        assert_eq!(markweave.theme(), &Theme::default());
    }

    #[test]
    fn test_plugins_in_configure_order() {
        let markweave = Markweave::builder()
            .use_plugin(Named("b", vec!["a"]))
            .use_plugin(Named("a", vec![CorePlugin::ID]))
            .build()
            .unwrap();

        assert_eq!(markweave.plugins(), &["core", "a", "b"]);
    }

    #[test]
    fn test_first_registration_error_wins() {
        let err = Markweave::builder()
            .use_plugin(CorePlugin::new())
            .use_plugin(Named("x", vec![]))
            .use_plugin(Named("x", vec![]))
            .build()
            .unwrap_err();

        assert_eq!(err, BuildError::DuplicateCapability("core".into()));
    }

    #[test]
    fn test_missing_core() {
        let err = MarkweaveBuilder::empty()
            .use_plugin(ImagesPlugin::new())
            .build()
            .unwrap_err();

        assert_eq!(
            err,
            BuildError::MissingDependency {
                plugin: "images".into(),
                dependency: "core".into(),
            }
        );
    }

    #[test]
    fn test_registration_during_setup_fails() {
        let err = Markweave::builder()
            .use_plugin(LateRegistration)
            .build()
            .unwrap_err();

        assert!(matches!(err, BuildError::Setup(_)));
    }

    #[test]
    fn test_render_all_keeps_order() {
        let markweave = Markweave::builder().build().unwrap();
        let results = markweave.render_all(&["# one", "two", "*three*"]);
        let texts: Vec<String> = results.into_iter().map(|r| r.unwrap().text).collect();

        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_with_config() {
        let config = RenderConfig::from_json(
            r##"{ "theme": { "link_color": "#FF00FF00" }, "html": false, "suppress": ["Image"] }"##,
        )
        .unwrap();
        let markweave = Markweave::builder()
            .with_config(&config)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(markweave.plugins(), &["core", "images", "config-file"]);
        assert_eq!(markweave.theme().link_color, Color::GREEN);
        assert!(markweave.engine().visitors().is_suppressed(NodeType::Image));
    }
}
