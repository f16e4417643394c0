//! Annotator settings

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use w5500_protocol::{AnnotationKind, AnnotationRow, DecoderConfig};

/// How annotations are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One aligned text line per annotation
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Annotator settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Decoder configuration
    #[serde(default)]
    pub decoder: DecoderConfig,
    /// Show the commands row (commands and TX payloads)
    #[serde(default = "default_true")]
    pub show_commands: bool,
    /// Show the responses row (registers and RX payloads)
    #[serde(default = "default_true")]
    pub show_responses: bool,
    /// Show the warnings row
    #[serde(default = "default_true")]
    pub show_warnings: bool,
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            show_commands: true,
            show_responses: true,
            show_warnings: true,
            format: OutputFormat::Text,
        }
    }
}

impl Settings {
    /// Get the XDG config directory for w5500-annotate
    /// Uses $XDG_CONFIG_HOME/w5500-annotate, falls back to ~/.config/w5500-annotate
    fn config_dir() -> Option<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_config);
            if path.is_absolute() {
                return Some(path.join("w5500-annotate"));
            }
        }

        dirs::home_dir().map(|h| h.join(".config").join("w5500-annotate"))
    }

    /// Default settings file path
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    /// Load settings from `path`, or the default location
    ///
    /// A missing file gives defaults; a file that does not parse is logged and
    /// also gives defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };

        let Ok(contents) = std::fs::read_to_string(&path) else {
            tracing::debug!("no settings at {}, using defaults", path.display());
            return Self::default();
        };

        match serde_json::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to parse settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to `path`, or the default location, returning where they were written
    pub fn save(&self, path: Option<&Path>) -> anyhow::Result<PathBuf> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(Self::default_path)
            .context("Could not determine settings path")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(path)
    }

    /// Whether annotations of this kind are shown
    pub fn shows(&self, kind: AnnotationKind) -> bool {
        match kind.row() {
            AnnotationRow::Commands => self.show_commands,
            AnnotationRow::Responses => self.show_responses,
            AnnotationRow::Warnings => self.show_warnings,
        }
    }
}
