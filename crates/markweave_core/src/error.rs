//! Error types for building pipelines, rendering and loading config files.

use markweave_ast::{NodeType, UnknownNodeType};
use markweave_parser::ParseError;
use thiserror::Error;

/// Errors raised while composing plugins into a pipeline.
///
/// All of these are fatal: no rendering happens once a build fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A plugin declared a dependency that nobody registered.
    #[error("Plugin '{plugin}' depends on '{dependency}', which is not registered")]
    MissingDependency { plugin: String, dependency: String },

    /// Plugin dependencies form a cycle. The path starts and ends with the
    /// same capability.
    #[error("Cyclic plugin dependency: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    /// Two plugins were registered under the same capability.
    #[error("Capability '{0}' is already registered")]
    DuplicateCapability(String),

    /// No plugin provides the requested capability.
    #[error("Capability '{0}' is not registered")]
    NotRegistered(String),

    /// The capability exists but its plugin is not of the requested type.
    #[error("Capability '{id}' is not provided by {expected}")]
    CapabilityMismatch { id: String, expected: &'static str },

    /// A plugin's setup hook failed.
    #[error("Plugin setup failed: {0}")]
    Setup(String),
}

impl BuildError {
    /// Creates a setup error.
    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup(message.into())
    }
}

/// Errors that abort a single render call.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A visit action failed.
    #[error("Visit action for {node_type} failed: {message}")]
    Visit { node_type: String, message: String },

    /// A span factory failed.
    #[error("Span factory for {node_type} failed: {message}")]
    SpanFactory { node_type: String, message: String },

    /// An annotation range falls outside the emitted text.
    #[error("Invalid annotation range {start}..{end} (text length {len})")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// The source could not be parsed into a document tree.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
}

impl RenderError {
    /// Creates a visit action error for `node_type`.
    pub fn visit(node_type: NodeType, message: impl Into<String>) -> Self {
        Self::Visit {
            node_type: node_type.to_string(),
            message: message.into(),
        }
    }

    /// Creates a span factory error for `node_type`.
    pub fn span_factory(node_type: NodeType, message: impl Into<String>) -> Self {
        Self::SpanFactory {
            node_type: node_type.to_string(),
            message: message.into(),
        }
    }
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(String),

    #[error("Invalid config: {0}")]
    Parse(String),

    #[error("Config validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    UnknownNodeType(#[from] UnknownNodeType),

    #[error("Invalid color '{0}': expected #RRGGBB or #AARRGGBB")]
    InvalidColor(String),
}

impl ConfigError {
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = BuildError::CyclicDependency {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Cyclic plugin dependency: a -> b -> a");
    }

    #[test]
    fn test_render_error_helpers() {
        let err = RenderError::visit(NodeType::Heading, "boom");
        assert_eq!(err.to_string(), "Visit action for Heading failed: boom");

        let err = RenderError::span_factory(NodeType::Custom("note"), "bad");
        assert_eq!(err.to_string(), "Span factory for note failed: bad");
    }

    #[test]
    fn test_unknown_node_type_is_transparent() {
        let err: ConfigError = UnknownNodeType("Header".into()).into();
        assert_eq!(err.to_string(), "Unknown node type: Header");
    }
}
