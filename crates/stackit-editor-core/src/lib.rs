//! stackit-editor-core: the question-body rich-text editor without a UI.
//!
//! This crate provides:
//! - `markup` - HTML-subset parser, node tree, caret-stop projection, and edits
//! - `Surface` - the live tree plus a flat selection
//! - `execute_command` / `execute_input` - selection-scoped mutations
//! - `SelectionTracker` and `SyncGuard` - cursor restore and echo suppression
//!   around external value replacement
//! - `RichTextEditor` - the per-instance controller that emits full values to
//!   a `ChangeSink`
//! - `render_preview` - sanitized read-only rendering

pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod execute;
pub mod image;
pub mod insert;
pub mod markup;
pub mod preview;
pub mod selection;
pub mod surface;
pub mod sync;
pub mod types;

pub use commands::{FormatCommand, InputEvent, MediaInsertion};
pub use config::{EditorConfig, RestoreStrategy, SanitizePolicy};
pub use editor::{ChangeSink, EditorId, RichTextEditor};
pub use error::{ConfigError, InsertionError};
pub use execute::{execute_command, execute_input};
pub use image::{ImageCompletion, ImageTask, LoadedImage, encode_image};
pub use insert::{ActivePicker, LinkForm};
pub use markup::{Alignment, ListKind, Mark, Tree};
pub use preview::render_preview;
pub use selection::{SelectionSnapshot, SelectionTracker};
pub use smol_str::SmolStr;
pub use surface::Surface;
pub use sync::{SuppressionScope, SyncGuard};
pub use types::Selection;
