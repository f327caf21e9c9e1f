use actix_multipart::{Field, Multipart};
use futures::StreamExt;
use log::warn;
use sanitize_filename::sanitize;
use serde::de::DeserializeOwned;

use crate::error::FormError;
use crate::mail::{AttachmentSet, UploadedFile};
use crate::pdf::SignatureSet;

/// Section used for a bare `file` part.
pub const DEFAULT_SECTION: &str = "allegati";

/// Name given to uploads sent without a filename.
pub const DEFAULT_FILENAME: &str = "allegato.pdf";

#[derive(Debug, thiserror::Error)]
pub enum MultipartParseError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("Invalid metadata: {0}")]
    MetadataError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Invalid UTF-8 data: {0}")]
    Utf8Error(String),
}

impl From<MultipartParseError> for FormError {
    fn from(error: MultipartParseError) -> Self {
        FormError::InvalidRequest(error.to_string())
    }
}

/// What a multipart part carries, judged by its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    Metadata,
    Signature(String),
    File(String),
    Ignored,
}

pub fn classify_field(name: &str) -> FieldRole {
    if name == "metadata" {
        return FieldRole::Metadata;
    }
    if name == "file" {
        return FieldRole::File(DEFAULT_SECTION.to_string());
    }
    if let Some(slot) = name.strip_prefix("signature_").filter(|s| !s.is_empty()) {
        return FieldRole::Signature(slot.to_string());
    }
    if let Some(section) = name.strip_prefix("file_").filter(|s| !s.is_empty()) {
        return FieldRole::File(section.to_string());
    }
    FieldRole::Ignored
}

/// JSON metadata plus signatures and uploaded documents of one submission.
#[derive(Debug)]
pub struct ParsedSubmission<M> {
    pub metadata: M,
    pub signatures: SignatureSet,
    pub attachments: AttachmentSet,
}

async fn read_field(field: &mut Field) -> Result<Vec<u8>, MultipartParseError> {
    let mut buffer = Vec::new();
    while let Some(chunk) = field.next().await {
        let data = chunk.map_err(|e| MultipartParseError::IoError(e.to_string()))?;
        buffer.extend_from_slice(&data);
    }
    Ok(buffer)
}

pub struct MultipartParser;

impl MultipartParser {
    /// Reads every part of the payload. Without a `metadata` part the
    /// metadata is `M::default()`.
    pub async fn parse_submission<M>(mut multipart: Multipart) -> Result<ParsedSubmission<M>, MultipartParseError>
    where
        M: DeserializeOwned + Default,
    {
        let mut metadata = None;
        let mut signatures = SignatureSet::new();
        let mut attachments = AttachmentSet::new();

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| MultipartParseError::FieldError(e.to_string()))?;
            let content_disposition = field
                .content_disposition()
                .ok_or_else(|| MultipartParseError::FieldError("Content disposition not found".to_string()))?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| MultipartParseError::FieldError("Field name not found".to_string()))?
                .to_string();
            let filename = content_disposition.get_filename().map(sanitize);
            let content_type = field.content_type().map(|m| m.essence_str().to_string());

            match classify_field(&name) {
                FieldRole::Metadata => {
                    let raw = String::from_utf8(read_field(&mut field).await?)
                        .map_err(|e| MultipartParseError::Utf8Error(e.to_string()))?;
                    metadata = Some(
                        serde_json::from_str(&raw)
                            .map_err(|e| MultipartParseError::MetadataError(e.to_string()))?,
                    );
                }
                FieldRole::Signature(slot) => {
                    signatures.capture(&slot, read_field(&mut field).await?);
                }
                FieldRole::File(section) => {
                    let bytes = read_field(&mut field).await?;
                    if bytes.is_empty() {
                        continue;
                    }
                    let filename = filename
                        .filter(|f| !f.is_empty())
                        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());
                    attachments.push(UploadedFile::new(filename, content_type, bytes), section);
                }
                FieldRole::Ignored => {
                    warn!("ignoring unexpected multipart field '{}'", name);
                    read_field(&mut field).await?;
                }
            }
        }

        Ok(ParsedSubmission {
            metadata: metadata.unwrap_or_default(),
            signatures,
            attachments,
        })
    }
}
