//! Command and input execution against the surface.
//!
//! `execute_command` and `execute_input` are the central dispatch points for
//! every mutation. They return true when the mutation was accepted, which is
//! exactly when the caller must emit the new value once. Nothing here emits.
//!
//! List and alignment operations never change caret offsets (they only add,
//! remove, or retag block wrappers and attributes), so the flat selection
//! stays valid across them.

use crate::commands::{FormatCommand, InputEvent};
use crate::markup::{Alignment, ListKind, Mark};
use crate::surface::Surface;
use crate::types::Selection;

/// Execute a toolbar command on the current selection.
///
/// Returns false without touching anything when the surface has no focus.
pub fn execute_command(surface: &mut Surface, command: &FormatCommand) -> bool {
    let Some(selection) = surface.selection() else {
        tracing::debug!(target: "stackit::execute", ?command, "command ignored without focus");
        return false;
    };
    let accepted = if let Some(mark) = command.mark() {
        execute_toggle_mark(surface, selection, mark)
    } else if let Some(kind) = command.list_kind() {
        execute_toggle_list(surface, selection, kind)
    } else if let Some(alignment) = command.alignment() {
        execute_align(surface, selection, alignment)
    } else {
        match command {
            FormatCommand::InsertText(text) => execute_insert_text(surface, selection, text),
            FormatCommand::InsertMarkup(markup) => {
                execute_insert_markup(surface, selection, markup)
            }
            _ => false,
        }
    };
    tracing::debug!(target: "stackit::execute", ?command, accepted, "command executed");
    accepted
}

/// Execute a typed edit. Ignored without focus.
pub fn execute_input(surface: &mut Surface, event: &InputEvent) -> bool {
    let Some(selection) = surface.selection() else {
        tracing::debug!(target: "stackit::execute", ?event, "input ignored without focus");
        return false;
    };
    let accepted = match event {
        InputEvent::InsertText(text) => execute_insert_text(surface, selection, text),
        InputEvent::InsertFromPaste(text) => execute_paste(surface, selection, text),
        InputEvent::InsertParagraph => execute_insert_paragraph(surface, selection),
        InputEvent::InsertLineBreak => execute_insert_markup(surface, selection, "<br>"),
        InputEvent::DeleteBackward => execute_delete_backward(surface, selection),
        InputEvent::DeleteForward => execute_delete_forward(surface, selection),
    };
    tracing::debug!(target: "stackit::execute", ?event, accepted, "input executed");
    accepted
}

fn execute_toggle_mark(surface: &mut Surface, selection: Selection, mark: Mark) -> bool {
    if selection.is_collapsed() {
        let active = surface.tree().is_marked_at(selection.head, mark);
        surface.pending_marks_mut().toggle(mark, active);
        return true;
    }
    surface
        .tree_mut()
        .toggle_mark(selection.start(), selection.end(), mark)
}

fn execute_toggle_list(surface: &mut Surface, selection: Selection, kind: ListKind) -> bool {
    surface
        .tree_mut()
        .toggle_list(selection.start(), selection.end(), kind)
}

fn execute_align(surface: &mut Surface, selection: Selection, alignment: Alignment) -> bool {
    surface
        .tree_mut()
        .align(selection.start(), selection.end(), alignment)
}

/// Remove a non-collapsed selection. Returns the caret offset and whether
/// anything was deleted.
fn delete_selection(surface: &mut Surface, selection: Selection) -> (usize, bool) {
    if selection.is_collapsed() {
        return (selection.head, false);
    }
    let deleted = surface
        .tree_mut()
        .delete_range(selection.start(), selection.end());
    (selection.start(), deleted)
}

fn execute_insert_text(surface: &mut Surface, selection: Selection, text: &str) -> bool {
    let (caret, deleted) = delete_selection(surface, selection);
    if text.is_empty() {
        if deleted {
            surface.set_selection(Selection::collapsed(caret));
        }
        return deleted;
    }
    let enable = surface.pending_marks().enabled();
    let disable = surface.pending_marks().disabled();
    let caret = surface
        .tree_mut()
        .insert_text(caret, text, &enable, &disable);
    surface.set_selection(Selection::collapsed(caret));
    true
}

fn execute_insert_markup(surface: &mut Surface, selection: Selection, markup: &str) -> bool {
    let (caret, deleted) = delete_selection(surface, selection);
    let inserted = surface.tree_mut().insert_fragment(caret, markup);
    if deleted || inserted.is_some() {
        surface.set_selection(Selection::collapsed(inserted.unwrap_or(caret)));
    }
    deleted || inserted.is_some()
}

/// Plain-text paste; newlines become line breaks.
fn execute_paste(surface: &mut Surface, selection: Selection, text: &str) -> bool {
    let text = text.replace("\r\n", "\n");
    if !text.contains('\n') {
        return execute_insert_text(surface, selection, &text);
    }
    let (mut caret, deleted) = delete_selection(surface, selection);
    let mut changed = deleted;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            if let Some(after) = surface.tree_mut().insert_fragment(caret, "<br>") {
                caret = after;
                changed = true;
            }
        }
        if !line.is_empty() {
            caret = surface.tree_mut().insert_text(caret, line, &[], &[]);
            changed = true;
        }
    }
    surface.set_selection(Selection::collapsed(caret));
    changed
}

fn execute_insert_paragraph(surface: &mut Surface, selection: Selection) -> bool {
    let (caret, _) = delete_selection(surface, selection);
    let caret = surface.tree_mut().split_block(caret);
    surface.set_selection(Selection::collapsed(caret));
    true
}

fn execute_delete_backward(surface: &mut Surface, selection: Selection) -> bool {
    let range = if selection.is_collapsed() {
        if selection.head == 0 {
            return false;
        }
        Selection::new(selection.head - 1, selection.head)
    } else {
        selection
    };
    let (caret, deleted) = delete_selection(surface, range);
    if deleted {
        surface.set_selection(Selection::collapsed(caret));
    }
    deleted
}

fn execute_delete_forward(surface: &mut Surface, selection: Selection) -> bool {
    let range = if selection.is_collapsed() {
        if selection.head >= surface.caret_len() {
            return false;
        }
        Selection::new(selection.head, selection.head + 1)
    } else {
        selection
    };
    let (caret, deleted) = delete_selection(surface, range);
    if deleted {
        surface.set_selection(Selection::collapsed(caret));
    }
    deleted
}
