//! Image rendering and source resolution by URL scheme.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use markweave_ast::{Node, NodeType};
use percent_encoding::percent_decode_str;
use tracing::{debug, warn};
use url::Url;

use crate::engine::VisitContext;
use crate::handler_table::HandlerTable;
use crate::plugin::{Builders, CapabilityId, Plugin};
use crate::props::Prop;
use crate::style::{ImageItem, Style};
use crate::RenderError;

/// Stands in for an image without alt text.
const OBJECT_REPLACEMENT: &str = "\u{FFFC}";

/// Resolves image destinations of one or more URL schemes.
pub trait SchemeHandler: Send + Sync {
    /// Lowercase schemes this handler is registered for.
    fn supported_schemes(&self) -> &[&str];

    /// Describes where the image behind `raw` can be loaded from. `None`
    /// leaves the image unresolved.
    fn handle(&self, raw: &str, url: &Url) -> Option<ImageItem>;
}

/// `http` and `https` images.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkSchemeHandler;

impl SchemeHandler for NetworkSchemeHandler {
    fn supported_schemes(&self) -> &[&str] {
        &["http", "https"]
    }

    fn handle(&self, _raw: &str, url: &Url) -> Option<ImageItem> {
        Some(ImageItem::Network {
            url: url.to_string(),
        })
    }
}

/// `file` images.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSchemeHandler;

impl SchemeHandler for FileSchemeHandler {
    fn supported_schemes(&self) -> &[&str] {
        &["file"]
    }

    fn handle(&self, _raw: &str, url: &Url) -> Option<ImageItem> {
        let path = url.to_file_path().ok()?;
        Some(ImageItem::File { path })
    }
}

/// `data:` URIs, decoded in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriSchemeHandler;

impl DataUriSchemeHandler {
    /// Splits `data:[<media type>][;base64],<data>` and decodes the payload.
    fn decode(raw: &str) -> Option<(Option<String>, Vec<u8>)> {
        let (scheme, rest) = raw.split_once(':')?;
        if !scheme.eq_ignore_ascii_case("data") {
            return None;
        }
        let (header, payload) = rest.split_once(',')?;

        let (media_type, is_base64) = match header.rsplit_once(';') {
            Some((media_type, encoding)) if encoding.eq_ignore_ascii_case("base64") => {
                (media_type, true)
            }
            _ => (header, false),
        };
        let content_type = (!media_type.is_empty()).then(|| media_type.to_string());

        let data = if is_base64 {
            BASE64_STANDARD.decode(payload.trim()).ok()?
        } else {
            percent_decode_str(payload).collect()
        };
        Some((content_type, data))
    }
}

impl SchemeHandler for DataUriSchemeHandler {
    fn supported_schemes(&self) -> &[&str] {
        &["data"]
    }

    fn handle(&self, raw: &str, _url: &Url) -> Option<ImageItem> {
        let (content_type, data) = Self::decode(raw)?;
        Some(ImageItem::Inline { content_type, data })
    }
}

/// Props written by the image visit action.
pub struct ImageProps;

impl ImageProps {
    /// Destination after the configured URL processor ran.
    pub const DESTINATION: Prop<String> = Prop::new("image_destination");
    pub const SOURCE: Prop<ImageItem> = Prop::new("image_source");
}

/// Renders image nodes and resolves their sources.
///
/// Other plugins customize the scheme table from their setup hook:
///
/// ```rust
/// use markweave_core::{BuildError, CapabilityId, Builders, Markweave, Plugin, PluginRegistry};
/// use markweave_core::plugins::ImagesPlugin;
///
/// struct Cdn;
///
/// impl Plugin for Cdn {
///     fn id(&self) -> CapabilityId {
///         "cdn"
///     }
///
///     fn setup(&mut self, registry: &mut PluginRegistry) -> Result<(), BuildError> {
///         registry
///             .require_mut::<ImagesPlugin>(ImagesPlugin::ID)?
///             .remove_scheme("http");
///         Ok(())
///     }
///
///     fn configure(&self, _builders: &mut Builders) {}
/// }
///
/// let markweave = Markweave::builder()
///     .use_plugin(ImagesPlugin::new())
///     .use_plugin(Cdn)
///     .build()
///     .unwrap();
/// assert_eq!(markweave.plugins(), &["core", "images", "cdn"]);
/// ```
#[derive(Debug, Clone)]
pub struct ImagesPlugin {
    schemes: HandlerTable<dyn SchemeHandler>,
    /// Base for destinations without a scheme.
    base: Option<Url>,
}

impl ImagesPlugin {
    pub const ID: CapabilityId = "images";

    /// Creates the plugin with the network, file and data handlers.
    pub fn new() -> Self {
        let mut plugin = Self::empty();
        plugin
            .add_scheme_handler(NetworkSchemeHandler)
            .add_scheme_handler(FileSchemeHandler)
            .add_scheme_handler(DataUriSchemeHandler);
        plugin
    }

    /// Creates the plugin without any scheme handler.
    pub fn empty() -> Self {
        Self {
            schemes: HandlerTable::new(),
            base: None,
        }
    }

    /// Resolves destinations without a scheme against `dir`, so relative
    /// paths reach the `file` handler.
    pub fn with_base_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.base = std::path::absolute(dir)
            .ok()
            .and_then(|dir| Url::from_directory_path(dir).ok());
        if self.base.is_none() {
            warn!(dir = %dir.display(), "Image base directory is not usable");
        }
        self
    }

    /// Registers `handler` for each of its schemes, replacing previous ones.
    pub fn add_scheme_handler(&mut self, handler: impl SchemeHandler + 'static) -> &mut Self {
        let handler: Arc<dyn SchemeHandler> = Arc::new(handler);
        for scheme in handler.supported_schemes() {
            self.schemes.insert(scheme, Arc::clone(&handler));
        }
        self
    }

    pub fn remove_scheme(&mut self, scheme: &str) -> &mut Self {
        self.schemes.remove(scheme);
        self
    }

    pub fn scheme_handlers(&self) -> &HandlerTable<dyn SchemeHandler> {
        &self.schemes
    }

    /// Resolves `destination` through the scheme table.
    pub fn resolve(&self, destination: &str) -> Option<ImageItem> {
        resolve_source(&self.schemes, self.base.as_ref(), destination)
    }
}

impl Default for ImagesPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ImagesPlugin {
    fn id(&self) -> CapabilityId {
        Self::ID
    }

    fn configure(&self, builders: &mut Builders) {
        let schemes = self.schemes.clone();
        let base = self.base.clone();
        builders
            .visitors
            .on(NodeType::Image, move |ctx, node| {
                visit_image(ctx, node, &schemes, base.as_ref())
            });
        builders.spans.set_factory(NodeType::Image, |_, props| {
            vec![Style::Image {
                destination: props
                    .get(ImageProps::DESTINATION)
                    .cloned()
                    .unwrap_or_default(),
                source: props.get(ImageProps::SOURCE).cloned(),
                size: None,
            }]
        });
    }
}

fn resolve_source(
    schemes: &HandlerTable<dyn SchemeHandler>,
    base: Option<&Url>,
    destination: &str,
) -> Option<ImageItem> {
    let url = match Url::options().base_url(base).parse(destination) {
        Ok(url) => url,
        Err(e) => {
            warn!(destination, error = %e, "Image destination has no usable scheme");
            return None;
        }
    };
    let Some(handler) = schemes.get(url.scheme()) else {
        warn!(destination, scheme = url.scheme(), "No scheme handler for image");
        return None;
    };
    let item = handler.handle(destination, &url);
    if item.is_none() {
        debug!(destination, "Scheme handler left image unresolved");
    }
    item
}

fn visit_image(
    ctx: &mut VisitContext<'_, '_>,
    node: &Node<'_>,
    schemes: &HandlerTable<dyn SchemeHandler>,
    base: Option<&Url>,
) -> Result<(), RenderError> {
    match node.value {
        Some(alt) if !alt.is_empty() => ctx.push_str(alt),
        _ => ctx.push_str(OBJECT_REPLACEMENT),
    }

    let Some(link) = node.link() else {
        return Ok(());
    };
    let destination = ctx.configuration().url_processor().process(link.url);
    if let Some(source) = resolve_source(schemes, base, &destination) {
        ctx.props_mut().set(ImageProps::SOURCE, source);
    }
    ctx.props_mut().set(ImageProps::DESTINATION, destination);
    Ok(())
}
