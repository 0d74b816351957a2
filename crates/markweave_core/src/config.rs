//! Render configuration files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use markweave_ast::NodeType;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::theme::{Color, ThemeBuilder};

const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// File names looked up by [`RenderConfig::discover`], in order.
pub const CONFIG_FILES: &[&str] = &[".markweave.jsonc", ".markweave.json"];

/// Settings read from `.markweave.jsonc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Theme values replacing the defaults.
    #[serde(default)]
    pub theme: ThemeOverrides,

    /// Scheme prefixed to link and image destinations that have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scheme: Option<String>,

    /// Node types whose whole subtree is not rendered.
    #[serde(default)]
    pub suppress: Vec<String>,

    /// Whether images are rendered.
    #[serde(default = "default_enabled")]
    pub images: bool,

    /// Whether raw HTML is rendered.
    #[serde(default = "default_enabled")]
    pub html: bool,

    #[serde(default)]
    pub soft_break_adds_new_line: bool,

    /// Directory of the file this config was loaded from.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_enabled() -> bool {
    true
}

impl RenderConfig {
    pub fn new() -> Self {
        Self {
            theme: ThemeOverrides::default(),
            default_scheme: None,
            suppress: Vec::new(),
            images: true,
            html: true,
            soft_break_adds_new_line: false,
            base_dir: None,
        }
    }

    /// Returns the first config file found in `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Option<PathBuf> {
        let dir = dir.as_ref();
        CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::read(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_json(&content)?;
        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }
        Ok(config)
    }

    /// Parses JSON with comments and trailing commas, validating it against
    /// the embedded schema.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value = jsonc_parser::parse_to_serde_value(json, &ParseOptions::default())
            .map_err(|e| ConfigError::parse(e.to_string()))?
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        let schema = CONFIG_SCHEMA.get_or_init(|| {
            let schema_json: serde_json::Value =
                serde_json::from_str(SCHEMA_JSON).expect("Invalid embedded config schema");
            Validator::new(&schema_json).expect("Invalid config schema compilation")
        });
        if let Err(e) = schema.validate(&value) {
            return Err(ConfigError::validation(format!(
                "{} at {}",
                e,
                e.instance_path()
            )));
        }

        let config: Self =
            serde_json::from_value(value).map_err(|e| ConfigError::parse(e.to_string()))?;
        config.suppressed_types()?;
        Ok(config)
    }

    /// Parses the `suppress` entries.
    pub fn suppressed_types(&self) -> Result<Vec<NodeType>, ConfigError> {
        self.suppress
            .iter()
            .map(|name| name.parse::<NodeType>().map_err(ConfigError::from))
            .collect()
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Theme values set by a config file. Absent values keep the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_underlined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_margin: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_quote_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_quote_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_item_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bullet_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_text_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_block_text_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_block_background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_block_margin: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_text_size_multiplier: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_break_height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_break_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_text_size_multipliers: Option<[f32; 6]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thematic_break_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thematic_break_height: Option<u32>,
}

macro_rules! apply_overrides {
    ($overrides:expr, $builder:expr, [$($field:ident),* $(,)?]) => {
        $(
            if let Some(value) = $overrides.$field {
                $builder.$field(value);
            }
        )*
    };
}

impl ThemeOverrides {
    /// Writes every present value into `builder`.
    pub fn apply(&self, builder: &mut ThemeBuilder) {
        apply_overrides!(self, builder, [
            link_color,
            link_underlined,
            block_margin,
            block_quote_width,
            block_quote_color,
            list_item_color,
            bullet_width,
            code_text_color,
            code_background_color,
            code_block_text_color,
            code_block_background_color,
            code_block_margin,
            code_text_size_multiplier,
            heading_break_height,
            heading_break_color,
            heading_text_size_multipliers,
            thematic_break_color,
            thematic_break_height,
        ]);
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
