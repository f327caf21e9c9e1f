use std::collections::BTreeMap;

use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::service::{self, SubmissionReceipt};
use super::SessionStatus;
use crate::error::FormError;
use crate::multipart_parser::MultipartParser;
use crate::pdf::{FormValues, RenderedDocument, SignatureSet};
use crate::{AppState, ErrorResponse};

#[derive(Serialize, ToSchema)]
pub struct FormSummary {
    pub slug: String,
    pub title: String,
    pub template: String,
    pub page_count: usize,
    pub fields: Vec<String>,
    pub signature_slots: Vec<String>,
    pub sections: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RenderRequest {
    /// Field name to text, boolean or number.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub values: FormValues,
    /// Slot name to base64 PNG or `data:image/png;base64,` URL.
    #[serde(default)]
    pub signatures: BTreeMap<String, String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RenderQuery {
    /// Serve the PDF as a download instead of inline.
    #[serde(default)]
    pub download: bool,
}

/// Multipart body of a compiler submission.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct SubmitFormRequest {
    /// JSON object of field values.
    pub metadata: String,
    /// One part per captured slot, named `signature_<slot>`.
    #[schema(value_type = Option<String>, format = Binary)]
    pub signature_slot: Option<Vec<u8>>,
    /// One part per uploaded document, named `file_<section>`.
    #[schema(value_type = Option<String>, format = Binary)]
    pub file_section: Option<Vec<u8>>,
}

/// Header carrying the id of the session a render opened.
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Multipart body of a session submission.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct SubmitSessionRequest {
    /// One part per uploaded document, named `file_<section>`.
    #[schema(value_type = Option<String>, format = Binary)]
    pub file_section: Option<Vec<u8>>,
}

fn pdf_response(document: RenderedDocument, download: bool, session: Uuid) -> HttpResponse {
    let disposition = ContentDisposition {
        disposition: if download {
            DispositionType::Attachment
        } else {
            DispositionType::Inline
        },
        parameters: vec![DispositionParam::Filename(document.filename)],
    };
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(disposition)
        .insert_header((SESSION_HEADER, session.to_string()))
        .body(document.pdf)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Compiler",
    get,
    path = "/forms",
    responses(
        (status = 200, description = "Available compiler forms", body = Vec<FormSummary>)
    )
)]
pub async fn list_forms(state: web::Data<AppState>) -> impl Responder {
    let forms: Vec<FormSummary> = state
        .forms
        .iter()
        .map(|entry| FormSummary {
            slug: entry.form.kind().slug().to_string(),
            title: entry.form.title().to_string(),
            template: entry.layout.template.clone(),
            page_count: entry.layout.page_count,
            fields: entry.layout.fields.iter().map(|f| f.name.clone()).collect(),
            signature_slots: entry.layout.signature_slots().map(str::to_string).collect(),
            sections: entry.form.sections().iter().map(|s| s.to_string()).collect(),
        })
        .collect();
    HttpResponse::Ok().json(forms)
}

#[utoipa::path(
    context_path = "/api",
    tag = "Compiler",
    post,
    path = "/forms/{slug}/render",
    params(
        ("slug" = String, Path, description = "Form slug (`dojo` or `adesione`)"),
        RenderQuery
    ),
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Filled PDF (application/pdf); the X-Session-Id header names the session to submit"),
        (status = 400, description = "Invalid signature image", body = ErrorResponse),
        (status = 404, description = "Unknown form", body = ErrorResponse),
        (status = 500, description = "Template could not be rendered", body = ErrorResponse)
    )
)]
pub async fn render_form(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RenderQuery>,
    body: web::Json<RenderRequest>,
) -> impl Responder {
    let slug = path.into_inner();
    let request = body.into_inner();
    debug!("render '{}' with {} value(s)", slug, request.values.len());

    let signatures = match SignatureSet::from_encoded(&request.signatures) {
        Ok(signatures) => signatures,
        Err(e) => return HttpResponse::from(FormError::from(e)),
    };

    match service::open_session(&state, &slug, request.values, &signatures).await {
        Ok((session, document)) => pdf_response(document, query.download, session),
        Err(e) => e.into(),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Compiler",
    post,
    path = "/forms/{slug}/submit",
    params(
        ("slug" = String, Path, description = "Form slug (`dojo` or `adesione`)")
    ),
    request_body(content = inline(SubmitFormRequest), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Submission accepted by the mail service", body = SubmissionReceipt),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Unknown form", body = ErrorResponse),
        (status = 413, description = "Attachments over the size limit", body = ErrorResponse),
        (status = 502, description = "Mail service rejected the submission", body = ErrorResponse)
    )
)]
pub async fn submit_form(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: Multipart,
) -> impl Responder {
    let slug = path.into_inner();
    let parsed = match MultipartParser::parse_submission::<FormValues>(payload).await {
        Ok(parsed) => parsed,
        Err(e) => return HttpResponse::from(FormError::from(e)),
    };
    info!(
        "submit '{}': {} value(s), {} attachment(s)",
        slug,
        parsed.metadata.len(),
        parsed.attachments.len()
    );

    match service::submit_form(
        &state,
        &slug,
        &parsed.metadata,
        &parsed.signatures,
        &parsed.attachments,
    )
    .await
    {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(e) => e.into(),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Compiler",
    post,
    path = "/forms/{slug}/sessions",
    params(
        ("slug" = String, Path, description = "Form slug (`dojo` or `adesione`)")
    ),
    responses(
        (status = 201, description = "Empty session opened", body = SessionStatus),
        (status = 404, description = "Unknown form", body = ErrorResponse)
    )
)]
pub async fn create_session(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    match service::create_session(&state, &path.into_inner()).await {
        Ok(status) => HttpResponse::Created().json(status),
        Err(e) => e.into(),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Compiler",
    post,
    path = "/forms/{slug}/sessions/{id}/render",
    params(
        ("slug" = String, Path, description = "Form slug (`dojo` or `adesione`)"),
        ("id" = Uuid, Path, description = "Session to render into"),
        RenderQuery
    ),
    request_body = RenderRequest,
    responses(
        (status = 200, description = "Filled PDF (application/pdf)"),
        (status = 400, description = "Invalid signature image", body = ErrorResponse),
        (status = 404, description = "Unknown form or session", body = ErrorResponse),
        (status = 409, description = "Session is being submitted", body = ErrorResponse)
    )
)]
pub async fn render_session(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
    query: web::Query<RenderQuery>,
    body: web::Json<RenderRequest>,
) -> impl Responder {
    let (slug, id) = path.into_inner();
    let request = body.into_inner();
    debug!("render session {} of '{}'", id, slug);

    let signatures = match SignatureSet::from_encoded(&request.signatures) {
        Ok(signatures) => signatures,
        Err(e) => return HttpResponse::from(FormError::from(e)),
    };

    match service::render_session(&state, &slug, id, request.values, &signatures).await {
        Ok(document) => pdf_response(document, query.download, id),
        Err(e) => e.into(),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Compiler",
    post,
    path = "/forms/{slug}/sessions/{id}/submit",
    params(
        ("slug" = String, Path, description = "Form slug (`dojo` or `adesione`)"),
        ("id" = Uuid, Path, description = "Session id returned by the render")
    ),
    request_body(content = inline(SubmitSessionRequest), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Submission accepted by the mail service", body = SubmissionReceipt),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Unknown form or session", body = ErrorResponse),
        (status = 409, description = "Not rendered, or already submitted", body = ErrorResponse),
        (status = 413, description = "Attachments over the size limit", body = ErrorResponse),
        (status = 502, description = "Mail service rejected the submission", body = ErrorResponse)
    )
)]
pub async fn submit_session(
    state: web::Data<AppState>,
    path: web::Path<(String, Uuid)>,
    payload: Multipart,
) -> impl Responder {
    let (slug, id) = path.into_inner();
    let parsed = match MultipartParser::parse_submission::<FormValues>(payload).await {
        Ok(parsed) => parsed,
        Err(e) => return HttpResponse::from(FormError::from(e)),
    };
    if !parsed.metadata.is_empty() || parsed.signatures.captured_slots().next().is_some() {
        debug!("session {}: values and signatures come from the render, ignoring the ones sent", id);
    }
    info!("submit session {} of '{}' with {} attachment(s)", id, slug, parsed.attachments.len());

    match service::submit_session(&state, &slug, id, &parsed.attachments).await {
        Ok(receipt) => HttpResponse::Ok().json(receipt),
        Err(e) => e.into(),
    }
}

#[utoipa::path(
    context_path = "/api",
    tag = "Compiler",
    get,
    path = "/sessions/{id}",
    params(
        ("id" = Uuid, Path, description = "Session id returned by the render")
    ),
    responses(
        (status = 200, description = "Current state of the session", body = SessionStatus),
        (status = 404, description = "Unknown or expired session", body = ErrorResponse)
    )
)]
pub async fn session_status(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match service::session_status(&state, path.into_inner()).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => e.into(),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/forms").route(web::get().to(list_forms)))
        .service(web::resource("/forms/{slug}/render").route(web::post().to(render_form)))
        .service(web::resource("/forms/{slug}/submit").route(web::post().to(submit_form)))
        .service(web::resource("/forms/{slug}/sessions").route(web::post().to(create_session)))
        .service(web::resource("/forms/{slug}/sessions/{id}/render").route(web::post().to(render_session)))
        .service(web::resource("/forms/{slug}/sessions/{id}/submit").route(web::post().to(submit_session)))
        .service(web::resource("/sessions/{id}").route(web::get().to(session_status)));
}
