//! Toolbar commands, typed input, and media insertions.
//!
//! `FormatCommand` is the closed set of toolbar actions. `InputEvent` is the
//! typed-edit vocabulary of the surface, modelled on the W3C input types a
//! browser would report. Both are executed by [`crate::execute`].

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::markup::{Alignment, ListKind, Mark};

/// A selection-scoped formatting command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatCommand {
    Bold,
    Italic,
    Strikethrough,
    OrderedList,
    UnorderedList,
    AlignLeft,
    AlignCenter,
    AlignRight,
    /// Replace the selection with plain text.
    InsertText(String),
    /// Replace the selection with a markup fragment.
    InsertMarkup(String),
}

impl FormatCommand {
    /// The inline mark toggled by this command, if any.
    pub fn mark(&self) -> Option<Mark> {
        match self {
            FormatCommand::Bold => Some(Mark::Bold),
            FormatCommand::Italic => Some(Mark::Italic),
            FormatCommand::Strikethrough => Some(Mark::Strikethrough),
            _ => None,
        }
    }

    pub fn list_kind(&self) -> Option<ListKind> {
        match self {
            FormatCommand::OrderedList => Some(ListKind::Ordered),
            FormatCommand::UnorderedList => Some(ListKind::Unordered),
            _ => None,
        }
    }

    pub fn alignment(&self) -> Option<Alignment> {
        match self {
            FormatCommand::AlignLeft => Some(Alignment::Left),
            FormatCommand::AlignCenter => Some(Alignment::Center),
            FormatCommand::AlignRight => Some(Alignment::Right),
            _ => None,
        }
    }
}

/// A typed edit against the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputEvent {
    /// Typed text.
    InsertText(String),
    /// Enter.
    InsertParagraph,
    /// Shift+Enter.
    InsertLineBreak,
    /// Backspace.
    DeleteBackward,
    /// Delete.
    DeleteForward,
    /// Pasted plain text.
    InsertFromPaste(String),
}

/// Media produced by the pickers and the image input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInsertion {
    Emoji(SmolStr),
    Link { url: String, text: String },
    /// A complete `data:` URL.
    Image(String),
}
