use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{forward, InquiryReceipt};
use crate::error::FormError;
use crate::mail::attachments::ensure_within_limit;
use crate::mail::{AttachmentSet, EncodedAttachment, MailEndpoint};
use crate::state::AppState;
use crate::validation::{ValidationError, ValidationErrors};

const REQUIRED_MESSAGE: &str = "Inserisci almeno nome ed email.";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ContactRequest {
    pub nome: String,
    pub email: String,
    pub telefono: String,
    pub messaggio: String,
}

#[derive(Debug, Serialize)]
pub struct ContactPayload {
    pub nome: String,
    pub email: String,
    pub telefono: String,
    pub messaggio: String,
    pub allegati: Vec<EncodedAttachment>,
}

impl ContactRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.nome.is_empty() {
            errors.add(ValidationError::new("nome", REQUIRED_MESSAGE));
        }
        if self.email.is_empty() {
            errors.add(ValidationError::new("email", REQUIRED_MESSAGE));
        }
        errors.into_result()
    }

    pub fn into_payload(self, attachments: &AttachmentSet) -> ContactPayload {
        ContactPayload {
            nome: self.nome,
            email: self.email,
            telefono: self.telefono,
            messaggio: self.messaggio,
            allegati: attachments.iter().map(|a| a.file.encode(false)).collect(),
        }
    }
}

/// Sends the contact request with at most one attachment.
pub async fn submit_contact(
    state: &AppState,
    request: ContactRequest,
    attachments: &AttachmentSet,
) -> Result<InquiryReceipt, FormError> {
    request.validate()?;
    if attachments.len() > 1 {
        return Err(FormError::InvalidRequest(
            "the contact form accepts a single attachment".to_string(),
        ));
    }
    let total_bytes = ensure_within_limit(
        attachments.iter().map(|a| &a.file),
        state.config.max_attachment_bytes,
    )?;

    let payload = request.into_payload(attachments);
    forward(state, MailEndpoint::Contact, &payload).await?;
    log::info!("contact request from '{}' sent", payload.email);

    Ok(InquiryReceipt {
        attachments: payload.allegati.len(),
        total_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::UploadedFile;

    #[test]
    fn test_name_and_email_required() {
        let errors = ContactRequest::default().validate().unwrap_err();
        assert!(errors.has_field("nome"));
        assert!(errors.has_field("email"));

        let request = ContactRequest {
            nome: "Mario".into(),
            email: "mario@email.it".into(),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_payload_without_mime() {
        let mut attachments = AttachmentSet::new();
        attachments.push(UploadedFile::pdf("allegato.pdf", b"%PDF".to_vec()), "allegati");
        let request = ContactRequest {
            nome: "Mario".into(),
            email: "mario@email.it".into(),
            messaggio: "Ciao".into(),
            ..Default::default()
        };

        let json = serde_json::to_value(request.into_payload(&attachments)).unwrap();
        assert_eq!(json["nome"], "Mario");
        assert_eq!(json["telefono"], "");
        assert_eq!(json["allegati"][0]["filename"], "allegato.pdf");
        assert_eq!(json["allegati"][0]["base64"], "JVBERg==");
        assert!(json["allegati"][0].get("mime").is_none());
    }
}
