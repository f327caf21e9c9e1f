//! Outbound submissions to the external mail API.
//!
//! - `attachments` - uploaded files tagged by section, size ceiling, base64
//! - `client` - reqwest implementation of `MailTransport`

pub mod attachments;
pub mod client;

pub use attachments::{AttachmentSet, EncodedAttachment, TaggedAttachment, UploadedFile};
pub use client::HttpMailTransport;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::FormError;

/// The three mail API routes the site posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MailEndpoint {
    /// Rendered compiler forms with their attachments.
    Compiler,
    Contact,
    PartnerManager,
}

/// Body of a compiler form submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientMailPayload {
    pub nome: String,
    pub email: String,
    pub telefono: String,
    pub messaggio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub attachments: Vec<EncodedAttachment>,
}

/// Recipient and text of a submission, before attachments are encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct MailEnvelope {
    pub nome: String,
    pub email: String,
    pub telefono: String,
    pub messaggio: String,
    pub to: Option<String>,
    pub subject: Option<String>,
}

impl MailEnvelope {
    pub fn into_payload(self, attachments: Vec<EncodedAttachment>) -> ClientMailPayload {
        ClientMailPayload {
            nome: self.nome,
            email: self.email,
            telefono: self.telefono,
            messaggio: self.messaggio,
            to: self.to,
            subject: self.subject,
            attachments,
        }
    }
}

#[async_trait]
pub trait MailTransport {
    /// POSTs a JSON body. Non-2xx answers are `FormError::Submission`.
    async fn deliver(&self, endpoint: MailEndpoint, body: &serde_json::Value) -> Result<(), FormError>;
}
