//! Asynchronous image ingestion.
//!
//! An [`ImageTask`] is handed out by the editor that will receive the image.
//! It reads the whole input, sniffs the MIME type from the bytes, and builds a
//! `data:` URL. The task holds a child of the editor's lifetime token, so
//! tearing the editor down cancels a read in flight. The resulting
//! [`ImageCompletion`] remembers which editor it belongs to; handing it to any
//! other editor, or to a torn-down one, is rejected without mutation.

use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};
use mime_sniffer::MimeTypeSniffer;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::editor::EditorId;
use crate::error::InsertionError;

/// An image read and encoded, ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    /// MIME type (sniffed from bytes, or the declared `image/*` fallback)
    pub mime: String,
    pub data_url: String,
    /// Size of the raw input in bytes
    pub len: usize,
}

/// Outcome of an [`ImageTask`], addressed to the editor that started it.
#[derive(Debug)]
pub struct ImageCompletion {
    pub(crate) editor: EditorId,
    pub(crate) result: Result<LoadedImage, InsertionError>,
}

impl ImageCompletion {
    pub fn editor(&self) -> EditorId {
        self.editor
    }

    pub fn result(&self) -> &Result<LoadedImage, InsertionError> {
        &self.result
    }
}

#[derive(Debug)]
pub struct ImageTask {
    editor: EditorId,
    token: CancellationToken,
}

impl ImageTask {
    pub(crate) fn new(editor: EditorId, token: CancellationToken) -> Self {
        Self { editor, token }
    }

    pub fn editor(&self) -> EditorId {
        self.editor
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Read `reader` to the end and encode it.
    ///
    /// `declared_mime` is what the host was told about the input (a file
    /// picker's type). It is only used when sniffing finds no image type, and
    /// only if it is itself `image/*`.
    pub async fn read<R>(self, mut reader: R, declared_mime: Option<&str>) -> ImageCompletion
    where
        R: AsyncRead + Unpin,
    {
        let read_all = async {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await.map(|_| bytes)
        };
        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(InsertionError::Cancelled),
            read = read_all => match read {
                Ok(bytes) => encode_image(&bytes, declared_mime),
                Err(e) => Err(e.into()),
            },
        };
        if let Err(error) = &result {
            tracing::debug!(target: "stackit::image", editor = ?self.editor, %error, "image read failed");
        }
        ImageCompletion {
            editor: self.editor,
            result,
        }
    }

    /// Read an image file from disk.
    pub async fn read_file(self, path: impl AsRef<Path>) -> ImageCompletion {
        match tokio::fs::File::open(path.as_ref()).await {
            Ok(file) => self.read(file, None).await,
            Err(e) => ImageCompletion {
                editor: self.editor,
                result: Err(e.into()),
            },
        }
    }
}

/// Sniff and base64-encode raw image bytes into a `data:` URL.
pub fn encode_image(bytes: &[u8], declared_mime: Option<&str>) -> Result<LoadedImage, InsertionError> {
    if bytes.is_empty() {
        return Err(InsertionError::Unreadable("input is empty".into()));
    }
    let sniffed = bytes.sniff_mime_type();
    let mime = match sniffed {
        Some(mime) if mime.starts_with("image/") => mime,
        _ => match declared_mime.map(str::trim) {
            Some(declared) if declared.starts_with("image/") => declared,
            _ => {
                let detected = sniffed.unwrap_or("application/octet-stream");
                return Err(InsertionError::NotAnImage(detected.to_owned()));
            }
        },
    };
    Ok(LoadedImage {
        mime: mime.to_owned(),
        data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        len: bytes.len(),
    })
}
