use crate::errors::{EditorError, EditorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "scribe.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Node name used for paragraphs: `"P"` or `"DIV"`
    #[serde(default = "default_base_container")]
    pub base_container: String,

    /// Keep loose inline content directly under the editable root
    #[serde(default)]
    pub allow_inline_at_root: bool,

    /// Maximum number of undo steps (0 = unlimited)
    #[serde(default = "default_history_max_levels")]
    pub history_max_levels: usize,
}

fn default_base_container() -> String {
    "P".to_string()
}

fn default_history_max_levels() -> usize {
    100
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            base_container: default_base_container(),
            allow_inline_at_root: false,
            history_max_levels: default_history_max_levels(),
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(source: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Load config from a file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> EditorResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_json_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> EditorResult<()> {
        crate::plugins::base_container::BaseContainerTag::parse(&self.base_container)
            .map(|_| ())
            .ok_or_else(|| {
                EditorError::Config(format!(
                    "unsupported base container '{}' (expected P or DIV)",
                    self.base_container
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EditorConfig::from_json_str(r#"{ "baseContainer": "DIV" }"#).unwrap();
        assert_eq!(config.base_container, "DIV");
        assert!(!config.allow_inline_at_root);
        assert_eq!(config.history_max_levels, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_container() {
        let config = EditorConfig {
            base_container: "SPAN".to_string(),
            ..EditorConfig::default()
        };
        assert!(matches!(config.validate(), Err(EditorError::Config(_))));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = EditorConfig::load("/definitely/not/here/scribe.config.json").unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EditorConfig::from_json_str("{ baseContainer"),
            Err(EditorError::Json(_))
        ));
    }
}
