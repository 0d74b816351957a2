//! Cross-cutting render configuration.
//!
//! Plugins adjust a [`ConfigurationBuilder`] while they are configured; the
//! pipeline then freezes it into a [`Configuration`] that every visit action
//! and span factory can read.

use std::fmt;
use std::sync::Arc;

use crate::image_size::{ImageSizeResolver, ImageSizeResolverDef};
use crate::style::Style;
use crate::theme::Theme;

/// Rewrites link and image destinations before they are used.
pub trait UrlProcessor: Send + Sync {
    /// Name used when comparing configurations.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn process(&self, destination: &str) -> String;
}

impl<F> UrlProcessor for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn process(&self, destination: &str) -> String {
        self(destination)
    }
}

/// Leaves destinations unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlProcessorNoOp;

impl UrlProcessor for UrlProcessorNoOp {
    fn process(&self, destination: &str) -> String {
        destination.to_string()
    }
}

/// A highlighted range of a code block, relative to the start of the code.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

/// Produces highlight spans for code blocks.
pub trait SyntaxHighlight: Send + Sync {
    /// Name used when comparing configurations.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// `language` is the info string of the fenced block, if any.
    fn highlight(&self, language: Option<&str>, code: &str) -> Vec<HighlightSpan>;
}

impl<F> SyntaxHighlight for F
where
    F: Fn(Option<&str>, &str) -> Vec<HighlightSpan> + Send + Sync,
{
    fn highlight(&self, language: Option<&str>, code: &str) -> Vec<HighlightSpan> {
        self(language, code)
    }
}

/// Produces no highlight spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxHighlightNoOp;

impl SyntaxHighlight for SyntaxHighlightNoOp {
    fn highlight(&self, _language: Option<&str>, _code: &str) -> Vec<HighlightSpan> {
        Vec::new()
    }
}

/// Immutable configuration snapshot.
#[derive(Clone)]
pub struct Configuration {
    theme: Theme,
    url_processor: Arc<dyn UrlProcessor>,
    image_size_resolver: Arc<dyn ImageSizeResolver>,
    syntax_highlight: Arc<dyn SyntaxHighlight>,
    soft_break_adds_new_line: bool,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn url_processor(&self) -> &dyn UrlProcessor {
        self.url_processor.as_ref()
    }

    pub fn image_size_resolver(&self) -> &dyn ImageSizeResolver {
        self.image_size_resolver.as_ref()
    }

    pub fn syntax_highlight(&self) -> &dyn SyntaxHighlight {
        self.syntax_highlight.as_ref()
    }

    /// Whether a soft line break renders as a newline instead of a space.
    pub fn soft_break_adds_new_line(&self) -> bool {
        self.soft_break_adds_new_line
    }
}

impl Default for Configuration {
    fn default() -> Self {
        ConfigurationBuilder::new().build(Theme::default())
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("theme", &self.theme)
            .field("url_processor", &self.url_processor.name())
            .field("image_size_resolver", &self.image_size_resolver.name())
            .field("syntax_highlight", &self.syntax_highlight.name())
            .field("soft_break_adds_new_line", &self.soft_break_adds_new_line)
            .finish()
    }
}

/// Handlers compare by name; everything else by value.
impl PartialEq for Configuration {
    fn eq(&self, other: &Self) -> bool {
        self.theme == other.theme
            && self.url_processor.name() == other.url_processor.name()
            && self.image_size_resolver.name() == other.image_size_resolver.name()
            && self.syntax_highlight.name() == other.syntax_highlight.name()
            && self.soft_break_adds_new_line == other.soft_break_adds_new_line
    }
}

/// Accumulates configuration overrides. The last call to each setter wins.
#[derive(Default)]
pub struct ConfigurationBuilder {
    url_processor: Option<Arc<dyn UrlProcessor>>,
    image_size_resolver: Option<Arc<dyn ImageSizeResolver>>,
    syntax_highlight: Option<Arc<dyn SyntaxHighlight>>,
    soft_break_adds_new_line: bool,
}

impl ConfigurationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_processor(&mut self, processor: impl UrlProcessor + 'static) -> &mut Self {
        self.url_processor = Some(Arc::new(processor));
        self
    }

    pub fn image_size_resolver(&mut self, resolver: impl ImageSizeResolver + 'static) -> &mut Self {
        self.image_size_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn syntax_highlight(&mut self, highlight: impl SyntaxHighlight + 'static) -> &mut Self {
        self.syntax_highlight = Some(Arc::new(highlight));
        self
    }

    pub fn soft_break_adds_new_line(&mut self, enabled: bool) -> &mut Self {
        self.soft_break_adds_new_line = enabled;
        self
    }

    /// Freezes the builder, embedding `theme`.
    pub fn build(self, theme: Theme) -> Configuration {
        Configuration {
            theme,
            url_processor: self
                .url_processor
                .unwrap_or_else(|| Arc::new(UrlProcessorNoOp)),
            image_size_resolver: self
                .image_size_resolver
                .unwrap_or_else(|| Arc::new(ImageSizeResolverDef)),
            syntax_highlight: self
                .syntax_highlight
                .unwrap_or_else(|| Arc::new(SyntaxHighlightNoOp)),
            soft_break_adds_new_line: self.soft_break_adds_new_line,
        }
    }
}
