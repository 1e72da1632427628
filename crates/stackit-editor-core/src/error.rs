//! Error types for the editor core.
//!
//! None of these are fatal and none is ever forwarded to the change sink.

use thiserror::Error;

/// Why an emoji, link, or image insertion did not happen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InsertionError {
    /// Link display text was empty after trimming.
    #[error("link text is empty")]
    EmptyLinkText,

    /// Link URL was empty after trimming.
    #[error("link URL is empty")]
    EmptyLinkUrl,

    #[error("emoji is empty")]
    EmptyEmoji,

    /// The bytes are not a recognised image format.
    #[error("not an image (detected {0})")]
    NotAnImage(String),

    /// Reading the input failed.
    #[error("failed to read image: {0}")]
    Unreadable(String),

    /// The editor was torn down while the read was in flight.
    #[error("image read cancelled")]
    Cancelled,

    /// The completion belongs to another editor instance or a torn-down one.
    #[error("image completion is stale")]
    StaleTask,
}

impl From<std::io::Error> for InsertionError {
    fn from(e: std::io::Error) -> Self {
        InsertionError::Unreadable(e.to_string())
    }
}

/// Errors loading an [`EditorConfig`](crate::config::EditorConfig).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}
