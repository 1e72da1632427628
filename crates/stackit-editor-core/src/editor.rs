//! The per-instance editor controller.
//!
//! [`RichTextEditor`] owns the surface and wires it to the host's
//! [`ChangeSink`]. Every accepted mutation goes through one emission path,
//! which is also where the sync guard swallows the echo of an external
//! replacement. All synchronous work happens inside `&mut self` calls, so no
//! two mutations can interleave; the image read is the only async step and is
//! scoped to the editor's lifetime token.

use std::sync::atomic::{AtomicU64, Ordering};

use smol_str::SmolStr;
use tokio_util::sync::CancellationToken;

use crate::commands::{FormatCommand, InputEvent, MediaInsertion};
use crate::config::EditorConfig;
use crate::error::InsertionError;
use crate::execute::{execute_command, execute_input};
use crate::image::{ImageCompletion, ImageTask};
use crate::insert::{ActivePicker, ImageAttrs, LinkForm, insertion_command};
use crate::selection::SelectionTracker;
use crate::surface::Surface;
use crate::sync::SyncGuard;
use crate::types::Selection;

static NEXT_EDITOR_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one editor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorId(u64);

impl EditorId {
    pub(crate) fn next() -> Self {
        Self(NEXT_EDITOR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Receives the full serialized value after every accepted mutation.
pub trait ChangeSink {
    fn value_changed(&mut self, value: &str);
}

impl<F: FnMut(&str)> ChangeSink for F {
    fn value_changed(&mut self, value: &str) {
        self(value)
    }
}

pub struct RichTextEditor<S: ChangeSink> {
    id: EditorId,
    surface: Surface,
    guard: SyncGuard,
    tracker: SelectionTracker,
    sink: S,
    picker: ActivePicker,
    link_form: LinkForm,
    config: EditorConfig,
    lifetime: CancellationToken,
    torn_down: bool,
    /// The value the host is known to hold.
    last_value: String,
}

impl<S: ChangeSink> RichTextEditor<S> {
    /// Mount on the host's initial value. Mounting does not notify the sink.
    pub fn mount(initial: &str, config: EditorConfig, sink: S) -> Self {
        let editor = Self {
            id: EditorId::next(),
            surface: Surface::mount(initial),
            guard: SyncGuard::new(),
            tracker: SelectionTracker::new(config.restore_strategy),
            sink,
            picker: ActivePicker::None,
            link_form: LinkForm::default(),
            config,
            lifetime: CancellationToken::new(),
            torn_down: false,
            last_value: initial.to_owned(),
        };
        tracing::debug!(target: "stackit::editor", id = ?editor.id, "editor mounted");
        editor
    }

    pub fn id(&self) -> EditorId {
        self.id
    }

    /// Current serialized content.
    pub fn value(&self) -> String {
        self.surface.value()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<Selection> {
        self.surface.selection()
    }

    /// The placeholder to show, if the content is visibly empty.
    pub fn placeholder(&self) -> Option<&str> {
        self.config
            .placeholder
            .as_deref()
            .filter(|_| self.surface.is_placeholder_visible())
    }

    /// Glyphs offered by the emoji picker.
    pub fn emoji_palette(&self) -> &[SmolStr] {
        &self.config.emoji_palette
    }

    pub fn active_picker(&self) -> ActivePicker {
        self.picker
    }

    pub fn link_form(&self) -> &LinkForm {
        &self.link_form
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Echoes swallowed after external replacements.
    pub fn suppressed_echoes(&self) -> u64 {
        self.guard.absorbed_count()
    }

    pub fn focus(&mut self) {
        self.surface.focus();
    }

    pub fn blur(&mut self) {
        self.surface.blur();
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.surface.set_selection(selection);
    }

    pub fn select_all(&mut self) {
        self.surface.select_all();
    }

    pub fn move_cursor(&mut self, offset: usize) {
        self.surface.move_cursor(offset);
    }

    pub fn extend_selection(&mut self, head: usize) {
        self.surface.extend_selection(head);
    }

    /// Apply a typed edit. Returns whether it was accepted (and emitted).
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        if self.torn_down {
            return false;
        }
        let accepted = execute_input(&mut self.surface, event);
        if accepted {
            self.surface_changed();
        }
        accepted
    }

    /// Run a toolbar command. Returns whether it was accepted (and emitted).
    pub fn execute(&mut self, command: &FormatCommand) -> bool {
        if self.torn_down {
            return false;
        }
        let accepted = execute_command(&mut self.surface, command);
        if accepted {
            self.surface_changed();
        }
        accepted
    }

    fn surface_changed(&mut self) {
        let value = self.surface.value();
        Self::notify(&self.guard, &mut self.sink, &mut self.last_value, value);
    }

    /// The single emission path.
    fn notify(guard: &SyncGuard, sink: &mut S, last_value: &mut String, value: String) {
        if !guard.absorb() {
            sink.value_changed(&value);
        }
        *last_value = value;
    }

    /// The host's value changed. Replaces the surface content unless the value
    /// is what the surface already holds, keeping the cursor where possible.
    /// Returns whether a replacement happened. Never notifies the sink.
    pub fn sync_external(&mut self, value: &str) -> bool {
        if self.torn_down {
            return false;
        }
        if value == self.last_value || value == self.surface.value() {
            self.last_value = value.to_owned();
            return false;
        }

        let snapshot = self.tracker.capture(&self.surface);
        {
            let _scope = self.guard.suppress();
            self.surface.replace_content(value);
            self.tracker.restore(&mut self.surface, snapshot.as_ref());
            let echo = self.surface.value();
            Self::notify(&self.guard, &mut self.sink, &mut self.last_value, echo);
        }
        self.last_value = value.to_owned();
        tracing::debug!(
            target: "stackit::editor",
            id = ?self.id,
            selection = ?self.surface.selection(),
            "external value applied"
        );
        true
    }

    pub fn toggle_emoji_picker(&mut self) {
        self.picker = match self.picker {
            ActivePicker::Emoji => ActivePicker::None,
            _ => ActivePicker::Emoji,
        };
    }

    pub fn open_link_modal(&mut self) {
        self.picker = ActivePicker::Link;
    }

    pub fn close_picker(&mut self) {
        self.picker = ActivePicker::None;
    }

    /// Close the link modal. Typed fields are kept for the next opening.
    pub fn cancel_link(&mut self) {
        if self.picker == ActivePicker::Link {
            self.picker = ActivePicker::None;
        }
    }

    pub fn set_link_text(&mut self, text: impl Into<String>) {
        self.link_form.text = text.into();
    }

    pub fn set_link_url(&mut self, url: impl Into<String>) {
        self.link_form.url = url.into();
    }

    /// Insert the link from the modal. On failure nothing changes and the
    /// modal stays open.
    pub fn submit_link(&mut self) -> Result<(), InsertionError> {
        let media = self.link_form.validate()?;
        self.insert_media(&media)?;
        self.link_form.clear();
        self.picker = ActivePicker::None;
        Ok(())
    }

    /// Insert an emoji at the cursor and close the picker.
    pub fn insert_emoji(&mut self, glyph: &str) -> Result<(), InsertionError> {
        self.insert_media(&MediaInsertion::Emoji(glyph.into()))?;
        self.picker = ActivePicker::None;
        Ok(())
    }

    /// Insert media at the cursor, or at the end of content without focus.
    pub fn insert_media(&mut self, media: &MediaInsertion) -> Result<(), InsertionError> {
        if self.torn_down {
            return Err(InsertionError::StaleTask);
        }
        let attrs = ImageAttrs {
            alt: &self.config.image_alt,
            style: &self.config.image_style,
        };
        let command = insertion_command(media, attrs)?;
        self.surface.focus();
        if execute_command(&mut self.surface, &command) {
            self.surface_changed();
        }
        Ok(())
    }

    /// Start an image read bound to this editor's lifetime.
    pub fn begin_image_insertion(&self) -> ImageTask {
        ImageTask::new(self.id, self.lifetime.child_token())
    }

    /// Insert a finished image read. Completions from another editor, from a
    /// cancelled read, or arriving after teardown are dropped.
    pub fn finish_image_insertion(
        &mut self,
        completion: ImageCompletion,
    ) -> Result<(), InsertionError> {
        if completion.editor != self.id || self.torn_down {
            tracing::debug!(
                target: "stackit::editor",
                id = ?self.id,
                from = ?completion.editor,
                "stale image completion dropped"
            );
            return Err(InsertionError::StaleTask);
        }
        let image = completion.result?;
        self.insert_media(&MediaInsertion::Image(image.data_url))
    }

    /// Unmount. Cancels pending image reads; later calls are no-ops.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.picker = ActivePicker::None;
        self.lifetime.cancel();
        tracing::debug!(target: "stackit::editor", id = ?self.id, "editor torn down");
    }
}

impl<S: ChangeSink> Drop for RichTextEditor<S> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use base64::{Engine, engine::general_purpose::STANDARD};

    use super::*;
    use crate::config::RestoreStrategy;

    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
        0x52,
    ];

    type Emitted = Rc<RefCell<Vec<String>>>;

    fn editor(initial: &str) -> (RichTextEditor<impl ChangeSink>, Emitted) {
        editor_with(initial, EditorConfig::default())
    }

    fn editor_with(
        initial: &str,
        config: EditorConfig,
    ) -> (RichTextEditor<impl ChangeSink>, Emitted) {
        let emitted: Emitted = Rc::default();
        let sink = {
            let emitted = emitted.clone();
            move |value: &str| emitted.borrow_mut().push(value.to_owned())
        };
        (RichTextEditor::mount(initial, config, sink), emitted)
    }

    fn typed(text: &str) -> InputEvent {
        InputEvent::InsertText(text.into())
    }

    #[test]
    fn test_mount_does_not_emit() {
        let (editor, emitted) = editor("<p>hi</p>");
        assert_eq!(editor.value(), "<p>hi</p>");
        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn test_one_emission_per_edit() {
        let (mut editor, emitted) = editor("");
        editor.focus();
        for c in ["a", "b", "c"] {
            assert!(editor.handle_input(&typed(c)));
        }
        assert_eq!(*emitted.borrow(), vec!["a", "ab", "abc"]);
    }

    #[test]
    fn test_mixed_edits_emit_once_each() {
        let (mut editor, emitted) = editor("");
        editor.focus();
        assert!(editor.handle_input(&typed("Hi")));

        editor.toggle_emoji_picker();
        let glyph = editor.emoji_palette()[4].clone();
        editor.insert_emoji(&glyph).unwrap();

        editor.set_selection(Selection::new(0, 2));
        assert!(editor.execute(&FormatCommand::Bold));

        editor.select_all();
        assert!(editor.execute(&FormatCommand::OrderedList));

        editor.move_cursor(3);
        editor.open_link_modal();
        editor.set_link_url("https://example.com");
        assert!(editor.submit_link().is_err());
        editor.set_link_text("docs");
        editor.submit_link().unwrap();

        let link = "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">docs</a>";
        assert_eq!(
            *emitted.borrow(),
            vec![
                "Hi".to_owned(),
                "Hi🤔".to_owned(),
                "<b>Hi</b>🤔".to_owned(),
                "<ol><li><b>Hi</b>🤔</li></ol>".to_owned(),
                format!("<ol><li><b>Hi</b>🤔{link}</li></ol>"),
            ]
        );
        assert_eq!(editor.value(), emitted.borrow()[4]);
    }

    #[test]
    fn test_emoji_palette_from_config() {
        let (editor, _) = editor("");
        assert_eq!(editor.emoji_palette().len(), 14);
        assert_eq!(editor.emoji_palette()[4], "🤔");

        let config = EditorConfig {
            emoji_palette: vec!["🦀".into()],
            ..EditorConfig::default()
        };
        let (editor, _) = editor_with("", config);
        assert_eq!(editor.emoji_palette(), ["🦀"]);
    }

    #[test]
    fn test_selection_changes_do_not_emit() {
        let (mut editor, emitted) = editor("abc");
        editor.focus();
        editor.select_all();
        editor.move_cursor(1);
        editor.extend_selection(2);
        editor.blur();
        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn test_command_without_focus() {
        let (mut editor, emitted) = editor("abc");
        assert!(!editor.execute(&FormatCommand::Bold));
        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn test_collapsed_toggle_emits_once() {
        let (mut editor, emitted) = editor("abc");
        editor.move_cursor(3);
        assert!(editor.execute(&FormatCommand::Italic));
        assert_eq!(*emitted.borrow(), vec!["abc"]);
        editor.handle_input(&typed("d"));
        assert_eq!(emitted.borrow().last().map(String::as_str), Some("abc<i>d</i>"));
    }

    #[test]
    fn test_identical_external_value_is_ignored() {
        let (mut editor, emitted) = editor("abcdef");
        editor.move_cursor(3);
        assert!(!editor.sync_external("abcdef"));
        assert_eq!(editor.selection(), Some(Selection::collapsed(3)));
        assert!(emitted.borrow().is_empty());
        assert_eq!(editor.suppressed_echoes(), 0);
    }

    #[test]
    fn test_external_value_restores_cursor() {
        let (mut editor, emitted) = editor("abcdef");
        editor.move_cursor(3);
        assert!(editor.sync_external("abcdefgh"));
        assert_eq!(editor.value(), "abcdefgh");
        assert_eq!(editor.selection(), Some(Selection::collapsed(3)));
        assert!(emitted.borrow().is_empty());
        assert_eq!(editor.suppressed_echoes(), 1);
    }

    #[test]
    fn test_external_value_end_of_content() {
        let config = EditorConfig::default().with_restore_strategy(RestoreStrategy::EndOfContent);
        let (mut editor, _) = editor_with("abcdef", config);
        editor.move_cursor(3);
        editor.sync_external("abcdefgh");
        assert_eq!(editor.selection(), Some(Selection::collapsed(8)));
    }

    #[test]
    fn test_own_emission_is_not_replayed() {
        let (mut editor, emitted) = editor("ab");
        editor.move_cursor(2);
        editor.handle_input(&typed("c"));
        let echoed = emitted.borrow().last().cloned().unwrap();
        // The host feeds our own value back: no replacement.
        assert!(!editor.sync_external(&echoed));
        assert_eq!(editor.selection(), Some(Selection::collapsed(3)));
    }

    #[test]
    fn test_no_feedback_loop() {
        let (mut editor, emitted) = editor("one");
        editor.move_cursor(3);
        editor.sync_external("two");
        editor.sync_external("three");
        assert!(emitted.borrow().is_empty());
        assert_eq!(editor.suppressed_echoes(), 2);

        // The next user edit is emitted normally.
        editor.move_cursor(5);
        editor.handle_input(&typed("!"));
        assert_eq!(*emitted.borrow(), vec!["three!"]);
    }

    #[test]
    fn test_valid_link() {
        let (mut editor, emitted) = editor("see ");
        editor.move_cursor(4);
        editor.open_link_modal();
        editor.set_link_text("Example");
        editor.set_link_url("https://example.com");
        editor.submit_link().unwrap();
        insta::assert_snapshot!(
            emitted.borrow().join("\n"),
            @r#"see <a href="https://example.com" target="_blank" rel="noopener noreferrer">Example</a>"#
        );
        assert_eq!(editor.active_picker(), ActivePicker::None);
        assert_eq!(editor.link_form(), &LinkForm::default());
    }

    #[test]
    fn test_invalid_link() {
        let (mut editor, emitted) = editor("abc");
        editor.open_link_modal();
        editor.set_link_text("");
        editor.set_link_url("https://example.com");
        assert_eq!(editor.submit_link(), Err(InsertionError::EmptyLinkText));
        assert_eq!(editor.value(), "abc");
        assert!(emitted.borrow().is_empty());
        assert_eq!(editor.active_picker(), ActivePicker::Link);
        assert_eq!(editor.link_form().url, "https://example.com");
    }

    #[test]
    fn test_cancel_link_keeps_fields() {
        let (mut editor, _) = editor("");
        editor.open_link_modal();
        editor.set_link_text("draft");
        editor.cancel_link();
        assert_eq!(editor.active_picker(), ActivePicker::None);
        assert_eq!(editor.link_form().text, "draft");
    }

    #[test]
    fn test_picker_exclusivity() {
        let (mut editor, _) = editor("");
        editor.toggle_emoji_picker();
        assert_eq!(editor.active_picker(), ActivePicker::Emoji);
        editor.open_link_modal();
        assert_eq!(editor.active_picker(), ActivePicker::Link);
        editor.toggle_emoji_picker();
        assert_eq!(editor.active_picker(), ActivePicker::Emoji);
        editor.toggle_emoji_picker();
        assert_eq!(editor.active_picker(), ActivePicker::None);
    }

    #[test]
    fn test_emoji_without_focus_appends() {
        let (mut editor, emitted) = editor("<p>hi</p>");
        editor.toggle_emoji_picker();
        editor.insert_emoji("🎉").unwrap();
        assert_eq!(*emitted.borrow(), vec!["<p>hi🎉</p>"]);
        assert_eq!(editor.active_picker(), ActivePicker::None);
    }

    #[test]
    fn test_placeholder() {
        let config = EditorConfig::default().with_placeholder("Describe the problem");
        let (mut editor, _) = editor_with("", config);
        assert_eq!(editor.placeholder(), Some("Describe the problem"));
        editor.focus();
        editor.handle_input(&typed("x"));
        assert_eq!(editor.placeholder(), None);
    }

    #[tokio::test]
    async fn test_valid_image() {
        let (mut editor, emitted) = editor("");
        let task = editor.begin_image_insertion();
        let completion = task.read(PNG_HEADER, None).await;
        editor.finish_image_insertion(completion).unwrap();

        let emitted = emitted.borrow();
        assert_eq!(emitted.len(), 1);
        let src = emitted[0]
            .strip_prefix("<img src=\"data:image/png;base64,")
            .and_then(|rest| rest.split('"').next())
            .unwrap();
        assert_eq!(STANDARD.decode(src).unwrap(), PNG_HEADER);
        assert!(emitted[0].ends_with(
            "alt=\"Uploaded image\" style=\"max-width: 100%; height: auto;\">"
        ));
    }

    #[tokio::test]
    async fn test_non_image_is_rejected() {
        let (mut editor, emitted) = editor("abc");
        let completion = editor
            .begin_image_insertion()
            .read(&b"%PDF-1.7"[..], Some("application/pdf"))
            .await;
        assert!(matches!(
            editor.finish_image_insertion(completion),
            Err(InsertionError::NotAnImage(_))
        ));
        assert!(emitted.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_image_after_teardown_is_dropped() {
        let (mut editor, emitted) = editor("abc");
        let task = editor.begin_image_insertion();
        editor.teardown();
        assert!(task.is_cancelled());
        let completion = task.read(PNG_HEADER, None).await;
        assert_eq!(
            editor.finish_image_insertion(completion),
            Err(InsertionError::StaleTask)
        );
        assert!(emitted.borrow().is_empty());
        assert!(!editor.handle_input(&typed("x")));
    }

    #[tokio::test]
    async fn test_image_for_other_editor_is_dropped() {
        let (first, _) = editor("");
        let (mut second, emitted) = editor("");
        let completion = first
            .begin_image_insertion()
            .read(PNG_HEADER, None)
            .await;
        assert_eq!(
            second.finish_image_insertion(completion),
            Err(InsertionError::StaleTask)
        );
        assert!(emitted.borrow().is_empty());
    }

    #[test]
    fn test_drop_cancels_tasks() {
        let (editor, _) = editor("");
        let task = editor.begin_image_insertion();
        drop(editor);
        assert!(task.is_cancelled());
    }
}
