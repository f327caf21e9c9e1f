//! Service-level errors and their HTTP mapping.

use actix_web::HttpResponse;
use thiserror::Error;

use crate::pdf::RenderError;
use crate::validation::ValidationErrors;
use crate::ErrorResponse;

fn mib(bytes: &usize) -> f64 {
    *bytes as f64 / (1024.0 * 1024.0)
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Allegati troppo pesanti ({:.2} MB, massimo {:.2} MB)", mib(.total), mib(.limit))]
    PayloadTooLarge { total: usize, limit: usize },
    #[error("HTTP {status} - {body}")]
    Submission { status: u16, body: String },
    #[error("mail service unreachable: {0}")]
    Transport(String),
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("unknown form '{0}'")]
    UnknownForm(String),
    #[error("the document must be rendered before it can be submitted")]
    NotRendered,
    #[error("submission already in progress")]
    SubmissionInProgress,
    #[error("unknown session '{0}'")]
    UnknownSession(uuid::Uuid),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ValidationErrors> for FormError {
    fn from(errors: ValidationErrors) -> Self {
        FormError::Validation(errors)
    }
}

impl From<FormError> for HttpResponse {
    fn from(error: FormError) -> Self {
        log::error!("{}", error);
        let message = error.to_string();
        match error {
            FormError::Validation(errors) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "ValidationError",
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "errors": errors.errors(),
            })),
            FormError::InvalidRequest(_) | FormError::Render(RenderError::ImageDecode(_)) => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&message))
            }
            FormError::NotRendered => {
                HttpResponse::Conflict().json(ErrorResponse::new("NotRendered", &message))
            }
            FormError::SubmissionInProgress => {
                HttpResponse::Conflict().json(ErrorResponse::new("SubmissionInProgress", &message))
            }
            FormError::UnknownForm(_) | FormError::UnknownSession(_) => HttpResponse::NotFound().json(ErrorResponse::not_found(&message)),
            FormError::PayloadTooLarge { .. } => {
                HttpResponse::PayloadTooLarge().json(ErrorResponse::new("PayloadTooLarge", &message))
            }
            FormError::Submission { .. } | FormError::Transport(_) => {
                HttpResponse::BadGateway().json(ErrorResponse::new("SubmissionError", &message))
            }
            FormError::Render(_) => HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&message)),
        }
    }
}
