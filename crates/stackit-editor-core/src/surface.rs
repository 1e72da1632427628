//! The editing surface: the live tree plus its flat selection.
//!
//! The surface never notifies anyone itself. Callers mutate it through
//! [`crate::execute`] and decide whether the mutation is emitted.

use crate::markup::{Mark, Tree};
use crate::types::Selection;

/// Marks toggled on a collapsed selection, applied to the next typed text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingMarks {
    toggles: Vec<(Mark, bool)>,
}

impl PendingMarks {
    /// Flip `mark`. `active` is whether the caret currently sits inside it.
    pub fn toggle(&mut self, mark: Mark, active: bool) {
        match self.toggles.iter().position(|(m, _)| *m == mark) {
            Some(idx) => {
                self.toggles.remove(idx);
            }
            None => self.toggles.push((mark, !active)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }

    /// Marks to apply.
    pub fn enabled(&self) -> Vec<Mark> {
        self.toggles
            .iter()
            .filter(|(_, on)| *on)
            .map(|(m, _)| *m)
            .collect()
    }

    /// Marks to break out of.
    pub fn disabled(&self) -> Vec<Mark> {
        self.toggles
            .iter()
            .filter(|(_, on)| !*on)
            .map(|(m, _)| *m)
            .collect()
    }

    pub fn state(&self, mark: Mark) -> Option<bool> {
        self.toggles
            .iter()
            .find(|(m, _)| *m == mark)
            .map(|(_, on)| *on)
    }

    pub fn clear(&mut self) {
        self.toggles.clear();
    }
}

#[derive(Debug, Clone)]
pub struct Surface {
    tree: Tree,
    selection: Option<Selection>,
    pending: PendingMarks,
}

impl Surface {
    /// Mount on an initial value. The surface starts unfocused.
    pub fn mount(value: &str) -> Self {
        Self {
            tree: Tree::parse(value),
            selection: None,
            pending: PendingMarks::default(),
        }
    }

    /// Current serialized content.
    pub fn value(&self) -> String {
        self.tree.serialize()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub(crate) fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Highest caret offset.
    pub fn caret_len(&self) -> usize {
        self.tree.caret_map().len()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn is_focused(&self) -> bool {
        self.selection.is_some()
    }

    /// Set the selection, clamped to the content. Clears pending marks.
    pub fn set_selection(&mut self, selection: Selection) {
        let len = self.caret_len();
        self.selection = Some(selection.clamped(len));
        self.pending.clear();
    }

    /// Set the selection without touching pending marks.
    pub(crate) fn place_selection(&mut self, selection: Option<Selection>) {
        let len = self.caret_len();
        self.selection = selection.map(|s| s.clamped(len));
    }

    /// Focus with the caret at the end, keeping an existing selection.
    pub fn focus(&mut self) {
        if self.selection.is_none() {
            self.set_selection(Selection::collapsed(self.caret_len()));
        }
    }

    pub fn blur(&mut self) {
        self.selection = None;
        self.pending.clear();
    }

    pub fn select_all(&mut self) {
        self.set_selection(Selection::new(0, self.caret_len()));
    }

    pub fn move_cursor(&mut self, offset: usize) {
        self.set_selection(Selection::collapsed(offset));
    }

    /// Move the head, keeping the anchor. Focuses at `head` when unfocused.
    pub fn extend_selection(&mut self, head: usize) {
        let anchor = self.selection.map(|s| s.anchor).unwrap_or(head);
        self.set_selection(Selection::new(anchor, head));
    }

    pub fn pending_marks(&self) -> &PendingMarks {
        &self.pending
    }

    pub(crate) fn pending_marks_mut(&mut self) -> &mut PendingMarks {
        &mut self.pending
    }

    /// Replace the content wholesale. Every node identity from the previous
    /// tree stops resolving. The selection is left for the caller to restore.
    pub(crate) fn replace_content(&mut self, value: &str) {
        self.tree = Tree::parse(value);
        self.pending.clear();
    }

    /// Text projection for emptiness checks.
    pub fn plain_text(&self) -> String {
        self.tree.plain_text()
    }

    pub fn is_placeholder_visible(&self) -> bool {
        !self.tree.has_visible_content()
    }
}
