//! Applies a [`RenderConfig`] to the pipeline.

use markweave_ast::NodeType;

use crate::config::{RenderConfig, ThemeOverrides};
use crate::configuration::UrlProcessor;
use crate::error::ConfigError;
use crate::plugin::{Builders, CapabilityId, Plugin};

/// Prefixes `<scheme>://` to destinations without a scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSchemeProcessor {
    scheme: String,
}

impl DefaultSchemeProcessor {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
        }
    }

    fn has_scheme(destination: &str) -> bool {
        let Some((scheme, _)) = destination.split_once(':') else {
            return false;
        };
        let mut chars = scheme.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    }
}

impl UrlProcessor for DefaultSchemeProcessor {
    fn name(&self) -> &str {
        "default-scheme"
    }

    fn process(&self, destination: &str) -> String {
        if destination.is_empty() || destination.starts_with('#') || Self::has_scheme(destination)
        {
            return destination.to_string();
        }
        let destination = destination.trim_start_matches('/');
        format!("{}://{}", self.scheme, destination)
    }
}

/// Theme overrides, default scheme and suppression from a config file.
///
/// Configured late so that the file wins over other plugins.
#[derive(Debug, Clone)]
pub struct ConfigFilePlugin {
    theme: ThemeOverrides,
    default_scheme: Option<String>,
    suppress: Vec<NodeType>,
    soft_break_adds_new_line: bool,
}

impl ConfigFilePlugin {
    pub const ID: CapabilityId = "config-file";

    pub fn new(config: &RenderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            theme: config.theme.clone(),
            default_scheme: config.default_scheme.clone(),
            suppress: config.suppressed_types()?,
            soft_break_adds_new_line: config.soft_break_adds_new_line,
        })
    }
}

impl Plugin for ConfigFilePlugin {
    fn id(&self) -> CapabilityId {
        Self::ID
    }

    fn priority(&self) -> i32 {
        100
    }

    fn configure(&self, builders: &mut Builders) {
        self.theme.apply(&mut builders.theme);

        if let Some(scheme) = &self.default_scheme {
            builders
                .configuration
                .url_processor(DefaultSchemeProcessor::new(scheme.clone()));
        }
        if self.soft_break_adds_new_line {
            builders.configuration.soft_break_adds_new_line(true);
        }
        for node_type in &self.suppress {
            builders.visitors.suppress(*node_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("example.com/a", "https://example.com/a")]
    #[case("//example.com/a", "https://example.com/a")]
    #[case("http://example.com", "http://example.com")]
    #[case("mailto:me@example.com", "mailto:me@example.com")]
    #[case("data:,x", "data:,x")]
    #[case("#section", "#section")]
    #[case("", "")]
    fn test_default_scheme(#[case] destination: &str, #[case] expected: &str) {
        let processor = DefaultSchemeProcessor::new("https");
        assert_eq!(processor.process(destination), expected);
    }

    #[test]
    fn test_new_rejects_unknown_node_type() {
        let config = RenderConfig {
            suppress: vec!["Nope".into()],
            ..RenderConfig::default()
        };
        assert!(matches!(
            ConfigFilePlugin::new(&config),
            Err(ConfigError::UnknownNodeType(_))
        ));
    }
}
