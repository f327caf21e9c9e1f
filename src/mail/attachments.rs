//! Uploaded files tagged with the form section they belong to.
//!
//! Files live in an arena of `{file, section}` records; the section is
//! never written into the file itself.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;

use crate::error::FormError;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes,
        }
    }

    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(filename, Some("application/pdf".to_string()), bytes)
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Declared content type, or a guess from the file extension.
    pub fn mime(&self) -> String {
        self.content_type
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&self.filename)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            })
    }

    pub fn encode(&self, with_mime: bool) -> EncodedAttachment {
        EncodedAttachment {
            filename: self.filename.clone(),
            base64: STANDARD.encode(&self.bytes),
            mime: with_mime.then(|| self.mime()),
        }
    }
}

/// Attachment as the mail API expects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedAttachment {
    pub filename: String,
    pub base64: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedAttachment {
    pub file: UploadedFile,
    pub section: String,
}

#[derive(Debug, Clone, Default)]
pub struct AttachmentSet {
    entries: Vec<TaggedAttachment>,
}

impl AttachmentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: UploadedFile, section: impl Into<String>) {
        self.entries.push(TaggedAttachment {
            file,
            section: section.into(),
        });
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TaggedAttachment> {
        self.entries.iter()
    }

    pub fn by_section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a TaggedAttachment> + 'a {
        self.iter().filter(move |a| a.section == section)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.iter().map(|a| a.file.size()).sum()
    }
}

/// Fails when the raw size of `files` is above `limit`. Runs before any
/// encoding so an oversized submission never reaches the network.
pub fn ensure_within_limit<'a>(
    files: impl IntoIterator<Item = &'a UploadedFile>,
    limit: usize,
) -> Result<usize, FormError> {
    let total: usize = files.into_iter().map(UploadedFile::size).sum();
    if total > limit {
        return Err(FormError::PayloadTooLarge { total, limit });
    }
    Ok(total)
}
