//! Forms forwarded to the mail API without a rendered PDF: partner manager
//! onboarding and the contact form.

pub mod contact;
pub mod handlers;
pub mod partner;

pub use contact::{ContactPayload, ContactRequest};
pub use partner::{PartnerAllegati, PartnerOnboardingPayload, PartnerOnboardingRequest};

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::FormError;
use crate::mail::MailEndpoint;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct InquiryReceipt {
    pub attachments: usize,
    pub total_bytes: usize,
}

async fn forward<T: Serialize>(state: &AppState, endpoint: MailEndpoint, payload: &T) -> Result<(), FormError> {
    let body = serde_json::to_value(payload).map_err(|e| FormError::InvalidRequest(e.to_string()))?;
    state.mailer.deliver(endpoint, &body).await
}
