//! Partner manager onboarding.
//!
//! Company data, three mandatory document sections and a drawn signature.
//! Every violated rule is reported, not just the first one.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{forward, InquiryReceipt};
use crate::error::FormError;
use crate::mail::attachments::ensure_within_limit;
use crate::mail::{AttachmentSet, EncodedAttachment, MailEndpoint, UploadedFile};
use crate::pdf::SignatureSet;
use crate::state::AppState;
use crate::validation::{validate_cap, validate_email, validate_required, ValidationError, ValidationErrors};

/// Signature slot name, sent as the `signature_firma` part.
pub const SIGNATURE_SLOT: &str = "firma";

/// Document sections with the label used in validation messages.
pub const SECTIONS: [(&str, &str); 3] = [
    ("visura", "la visura camerale"),
    ("documento_identita", "il documento d'identità"),
    ("codice_fiscale", "il codice fiscale"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct PartnerOnboardingRequest {
    pub ragione_sociale: String,
    pub indirizzo: String,
    pub comune: String,
    pub cap: String,
    pub descrizione: String,
    pub telefono: String,
    pub email: String,
    pub iban: String,
}

#[derive(Debug, Serialize)]
pub struct PartnerAllegati {
    pub visura: Vec<EncodedAttachment>,
    pub documento_identita: Vec<EncodedAttachment>,
    pub codice_fiscale: Vec<EncodedAttachment>,
    pub firma: EncodedAttachment,
}

/// The form fields flattened next to `allegati`.
#[derive(Debug, Serialize)]
pub struct PartnerOnboardingPayload {
    #[serde(flatten)]
    pub form: PartnerOnboardingRequest,
    pub allegati: PartnerAllegati,
}

impl PartnerOnboardingRequest {
    pub fn validate(&self, attachments: &AttachmentSet, signatures: &SignatureSet) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_required(&self.ragione_sociale, "ragioneSociale", "Ragione sociale", &mut errors);
        validate_required(&self.indirizzo, "indirizzo", "Indirizzo", &mut errors);
        validate_required(&self.comune, "comune", "Comune di residenza", &mut errors);
        validate_cap(&self.cap, "cap", &mut errors);
        validate_email(self.email.trim(), "email", &mut errors);
        validate_required(&self.iban, "iban", "IBAN", &mut errors);

        for (section, label) in SECTIONS {
            if attachments.by_section(section).next().is_none() {
                errors.add(ValidationError::missing_attachment(section, label));
            }
        }
        if !signatures.get(SIGNATURE_SLOT).is_captured() {
            errors.add(ValidationError::new(SIGNATURE_SLOT, "Fornisci la firma"));
        }
        errors.into_result()
    }
}

fn encode_section(attachments: &AttachmentSet, section: &str) -> Vec<EncodedAttachment> {
    attachments.by_section(section).map(|a| a.file.encode(true)).collect()
}

/// Builds the JSON body. Files carry their mime type; the signature is
/// always `firma.png`.
pub fn build_payload(
    request: PartnerOnboardingRequest,
    attachments: &AttachmentSet,
    signature: &UploadedFile,
) -> PartnerOnboardingPayload {
    PartnerOnboardingPayload {
        form: request,
        allegati: PartnerAllegati {
            visura: encode_section(attachments, "visura"),
            documento_identita: encode_section(attachments, "documento_identita"),
            codice_fiscale: encode_section(attachments, "codice_fiscale"),
            firma: signature.encode(true),
        },
    }
}

pub async fn submit_onboarding(
    state: &AppState,
    request: PartnerOnboardingRequest,
    signatures: &SignatureSet,
    attachments: &AttachmentSet,
) -> Result<InquiryReceipt, FormError> {
    for upload in attachments.iter() {
        if !SECTIONS.iter().any(|(section, _)| *section == upload.section) {
            return Err(FormError::InvalidRequest(format!(
                "unknown document section '{}'",
                upload.section
            )));
        }
    }
    request.validate(attachments, signatures)?;

    let png = signatures.get(SIGNATURE_SLOT).png().unwrap_or_default().to_vec();
    let signature = UploadedFile::new("firma.png", Some("image/png".to_string()), png);
    let files = attachments.iter().map(|a| &a.file).chain(std::iter::once(&signature));
    let total_bytes = ensure_within_limit(files, state.config.max_attachment_bytes)?;

    let payload = build_payload(request, attachments, &signature);
    forward(state, MailEndpoint::PartnerManager, &payload).await?;
    log::info!("partner onboarding for '{}' sent", payload.form.ragione_sociale);

    Ok(InquiryReceipt {
        attachments: attachments.len() + 1,
        total_bytes,
    })
}
