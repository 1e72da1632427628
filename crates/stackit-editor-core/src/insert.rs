//! Fragment builders for emoji, link, and image insertion, plus the picker
//! state they share.

use crate::commands::{FormatCommand, MediaInsertion};
use crate::error::InsertionError;
use crate::markup::{escape_attr, escape_text};

/// Which picker or modal is open. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivePicker {
    #[default]
    None,
    Emoji,
    Link,
}

/// Fields of the link modal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkForm {
    pub text: String,
    pub url: String,
}

impl LinkForm {
    /// The link to insert, or why the form is not submittable.
    pub fn validate(&self) -> Result<MediaInsertion, InsertionError> {
        let (url, text) = trimmed_link(&self.url, &self.text)?;
        Ok(MediaInsertion::Link {
            url: url.to_owned(),
            text: text.to_owned(),
        })
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.url.clear();
    }
}

/// Trimmed `(url, text)`; both must be non-empty.
fn trimmed_link<'a>(url: &'a str, text: &'a str) -> Result<(&'a str, &'a str), InsertionError> {
    let text = text.trim();
    let url = url.trim();
    if text.is_empty() {
        return Err(InsertionError::EmptyLinkText);
    }
    if url.is_empty() {
        return Err(InsertionError::EmptyLinkUrl);
    }
    Ok((url, text))
}

/// Anchor opening in a new browsing context, with both values escaped.
pub fn link_markup(url: &str, text: &str) -> String {
    format!(
        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a>",
        escape_attr(url),
        escape_text(text)
    )
}

pub fn image_markup(data_url: &str, alt: &str, style: &str) -> String {
    format!(
        "<img src=\"{}\" alt=\"{}\" style=\"{}\">",
        escape_attr(data_url),
        escape_attr(alt),
        escape_attr(style)
    )
}

/// Image presentation attributes.
#[derive(Debug, Clone, Copy)]
pub struct ImageAttrs<'a> {
    pub alt: &'a str,
    pub style: &'a str,
}

/// The command that performs a media insertion at the cursor.
pub fn insertion_command(
    media: &MediaInsertion,
    image: ImageAttrs<'_>,
) -> Result<FormatCommand, InsertionError> {
    match media {
        MediaInsertion::Emoji(glyph) if glyph.is_empty() => Err(InsertionError::EmptyEmoji),
        MediaInsertion::Emoji(glyph) => Ok(FormatCommand::InsertText(glyph.to_string())),
        MediaInsertion::Link { url, text } => {
            let (url, text) = trimmed_link(url, text)?;
            Ok(FormatCommand::InsertMarkup(link_markup(url, text)))
        }
        MediaInsertion::Image(data_url) => Ok(FormatCommand::InsertMarkup(image_markup(
            data_url,
            image.alt,
            image.style,
        ))),
    }
}
