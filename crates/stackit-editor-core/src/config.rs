//! Editor configuration.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. Files are read as TOML or JSON depending on the extension.

use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ConfigError;

/// Emoji offered by the picker unless configured otherwise.
pub const DEFAULT_EMOJI_PALETTE: [&str; 14] = [
    "😀", "😃", "😊", "😍", "🤔", "👍", "👎", "❤️", "🎉", "🔥", "💡", "❓", "✅", "❌",
];

pub const DEFAULT_IMAGE_ALT: &str = "Uploaded image";
pub const DEFAULT_IMAGE_STYLE: &str = "max-width: 100%; height: auto;";

/// How the cursor is restored after an external content replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestoreStrategy {
    /// Node identity, then structural path, then end of content.
    #[default]
    Structural,
    /// Always collapse to the end of the new content.
    EndOfContent,
}

/// How the read-only preview treats the stored markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SanitizePolicy {
    /// Allowlisted tags and attributes only.
    #[default]
    Sanitize,
    /// Render the markup as stored.
    Trusted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Shown while the surface has no visible content.
    pub placeholder: Option<String>,
    pub emoji_palette: Vec<SmolStr>,
    /// `alt` text of inserted images.
    pub image_alt: String,
    /// Inline `style` of inserted images.
    pub image_style: String,
    pub restore_strategy: RestoreStrategy,
    pub sanitize_policy: SanitizePolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            placeholder: None,
            emoji_palette: DEFAULT_EMOJI_PALETTE.iter().map(SmolStr::new).collect(),
            image_alt: DEFAULT_IMAGE_ALT.to_owned(),
            image_style: DEFAULT_IMAGE_STYLE.to_owned(),
            restore_strategy: RestoreStrategy::default(),
            sanitize_policy: SanitizePolicy::default(),
        }
    }
}

impl EditorConfig {
    /// Load from a `.toml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?),
            Some("toml") => Self::from_toml(&std::fs::read_to_string(path)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or_default().to_owned(),
            )),
        }
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn with_restore_strategy(mut self, strategy: RestoreStrategy) -> Self {
        self.restore_strategy = strategy;
        self
    }
}
