//! Crate-wide configuration
//!
//! Every section falls back to its defaults, so a config file only needs the
//! values it overrides.

use crate::autosave::AutosaveConfig;
use crate::editor::EditorConfig;
use crate::layout::LayoutConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of layout, editing and autosave
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenogramConfig {
    /// History size and the layout spacing used by the editor
    pub editor: EditorConfig,
    pub autosave: AutosaveConfig,
}

impl GenogramConfig {
    /// Read a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse a JSON config document
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Layout spacing shared by the engine and the editor
    pub fn layout(&self) -> &LayoutConfig {
        &self.editor.layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = GenogramConfig::from_json(
            r#"{"autosave": {"debounce_ms": 500}, "editor": {"layout": {"tree_gap": 240.0}}}"#,
        )
        .unwrap();
        assert_eq!(config.autosave.debounce_ms, 500);
        assert_eq!(config.editor.max_history_size, 100);
        assert_eq!(config.layout().tree_gap, 240.0);
        assert_eq!(config.layout().sibling_gap, 90.0);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let error = GenogramConfig::from_json_file("/nonexistent/genogram.json").unwrap_err();
        assert!(error.to_string().contains("/nonexistent/genogram.json"));
    }
}
