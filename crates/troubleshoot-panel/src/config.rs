//! Panel configuration.
//!
//! Labels and anchors used when the panel builds its layout. Every field
//! has a default, so a config file only needs the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Panel configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Identifier of the anchor the panel is built into.
    #[serde(default = "default_root_id")]
    pub root_id: String,

    /// Title shown above the conversation.
    #[serde(default = "default_title")]
    pub title: String,

    /// Placeholder shown in an empty prompt.
    #[serde(default = "default_prompt_placeholder")]
    pub prompt_placeholder: String,

    /// Label of the submit control.
    #[serde(default = "default_submit_label")]
    pub submit_label: String,

    /// Label of the affirmative answer control.
    #[serde(default = "default_yes_label")]
    pub yes_label: String,

    /// Label of the negative answer control.
    #[serde(default = "default_no_label")]
    pub no_label: String,

    /// Label of the retry control in the footer.
    #[serde(default = "default_retry_label")]
    pub retry_label: String,

    /// Footer text.
    #[serde(default)]
    pub footer_text: String,

    /// Layout width used when no terminal is attached (replay).
    #[serde(default = "default_headless_width")]
    pub headless_width: u16,

    /// Viewport height used when no terminal is attached (replay).
    #[serde(default = "default_headless_height")]
    pub headless_height: u16,
}

fn default_root_id() -> String {
    "root".into()
}

fn default_title() -> String {
    "Troubleshooter".into()
}

fn default_prompt_placeholder() -> String {
    "Describe the problem...".into()
}

fn default_submit_label() -> String {
    "Start".into()
}

fn default_yes_label() -> String {
    "Yes".into()
}

fn default_no_label() -> String {
    "No".into()
}

fn default_retry_label() -> String {
    "Retry".into()
}

fn default_headless_width() -> u16 {
    80
}

fn default_headless_height() -> u16 {
    24
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            root_id: default_root_id(),
            title: default_title(),
            prompt_placeholder: default_prompt_placeholder(),
            submit_label: default_submit_label(),
            yes_label: default_yes_label(),
            no_label: default_no_label(),
            retry_label: default_retry_label(),
            footer_text: String::new(),
            headless_width: default_headless_width(),
            headless_height: default_headless_height(),
        }
    }
}

impl PanelConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration if a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PanelConfig::default();
        assert_eq!(config.root_id, "root");
        assert_eq!(config.yes_label, "Yes");
        assert_eq!(config.no_label, "No");
        assert_eq!(config.headless_width, 80);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: PanelConfig =
            serde_json::from_str(r#"{"submit_label":"Go","footer_text":"v1"}"#).unwrap();
        assert_eq!(config.submit_label, "Go");
        assert_eq!(config.footer_text, "v1");
        assert_eq!(config.root_id, "root");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("panel.json");
        let config = PanelConfig {
            title: "Network doctor".into(),
            ..PanelConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(PanelConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(PanelConfig::load(&missing), Err(ConfigError::Io(_))));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ nope").unwrap();
        assert!(matches!(PanelConfig::load(&bad), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_or_default_without_path() {
        assert_eq!(
            PanelConfig::load_or_default(None).unwrap(),
            PanelConfig::default()
        );
    }
}
