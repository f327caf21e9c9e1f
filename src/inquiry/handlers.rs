use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use log::info;
use utoipa::ToSchema;

use super::contact::{self, ContactRequest};
use super::partner::{self, PartnerOnboardingRequest};
use super::InquiryReceipt;
use crate::error::FormError;
use crate::multipart_parser::MultipartParser;
use crate::{AppState, ErrorResponse};

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct PartnerOnboardingUpload {
    /// JSON `PartnerOnboardingRequest`.
    pub metadata: String,
    /// Uploads named `file_visura`, `file_documento_identita`, `file_codice_fiscale`.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub file_section: Vec<Vec<u8>>,
    /// Drawn signature as PNG.
    #[schema(value_type = String, format = Binary)]
    pub signature_firma: Vec<u8>,
}

#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ContactUpload {
    /// JSON `ContactRequest`.
    pub metadata: String,
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
}

#[utoipa::path(
    context_path = "/api",
    tag = "Inquiry",
    post,
    path = "/partner-manager",
    request_body(content = inline(PartnerOnboardingUpload), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Onboarding request forwarded", body = InquiryReceipt),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 413, description = "Attachments over the size limit", body = ErrorResponse),
        (status = 502, description = "Mail service rejected the request", body = ErrorResponse)
    )
)]
pub async fn partner_onboarding(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let parsed = match MultipartParser::parse_submission::<PartnerOnboardingRequest>(payload).await {
        Ok(parsed) => parsed,
        Err(e) => return HttpResponse::from(FormError::from(e)),
    };
    info!("partner onboarding with {} attachment(s)", parsed.attachments.len());

    match partner::submit_onboarding(&state, parsed.metadata, &parsed.signatures, &parsed.attachments).await {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(e) => e.into(),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Inquiry",
    post,
    path = "/contact",
    request_body(content = inline(ContactUpload), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Contact request forwarded", body = InquiryReceipt),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 502, description = "Mail service rejected the request", body = ErrorResponse)
    )
)]
pub async fn send_contact(state: web::Data<AppState>, payload: Multipart) -> impl Responder {
    let parsed = match MultipartParser::parse_submission::<ContactRequest>(payload).await {
        Ok(parsed) => parsed,
        Err(e) => return HttpResponse::from(FormError::from(e)),
    };

    match contact::submit_contact(&state, parsed.metadata, &parsed.attachments).await {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(e) => e.into(),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/partner-manager").route(web::post().to(partner_onboarding)))
        .service(web::resource("/contact").route(web::post().to(send_contact)));
}
