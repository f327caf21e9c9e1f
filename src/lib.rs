use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{http::header, web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod error;
pub mod forms;
pub mod inquiry;
pub mod mail;
pub mod multipart_parser;
pub mod pdf;
pub mod state;
pub mod validation;

pub use crate::state::AppState;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::forms::handlers::list_forms,
        crate::forms::handlers::render_form,
        crate::forms::handlers::submit_form,
        crate::forms::handlers::create_session,
        crate::forms::handlers::render_session,
        crate::forms::handlers::submit_session,
        crate::forms::handlers::session_status,
        crate::inquiry::handlers::partner_onboarding,
        crate::inquiry::handlers::send_contact
    ),
    components(
        schemas(
            forms::FormKind,
            forms::handlers::FormSummary,
            forms::handlers::RenderRequest,
            forms::service::SubmissionReceipt,
            forms::SessionStatus,
            inquiry::InquiryReceipt,
            inquiry::PartnerOnboardingRequest,
            inquiry::ContactRequest,
            validation::ValidationError,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Compiler", description = "Fill, download and submit the Dojo and ExpoPay forms."),
        (name = "Inquiry", description = "Partner manager onboarding and contact requests.")
    )
)]
pub struct ApiDoc;

pub async fn run() -> std::io::Result<()> {
    dotenvy::dotenv().ok(); // Load .env file
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    let bind = (config.host.clone(), config.port);
    let allowed_origins = config.allowed_origins.clone();
    // base64 signatures inflate render requests by a third
    let json_limit = config.max_attachment_bytes * 2;

    let app_state = match AppState::new(config) {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("Failed to initialise the application state: {:#}", e);
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("dojo_forms_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
            .expose_headers(vec![
                header::CONTENT_DISPOSITION,
                header::HeaderName::from_static("x-session-id"),
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .app_data(web::JsonConfig::default().limit(json_limit))
            .service(
                web::scope("/api")
                    .configure(forms::handlers::config)
                    .configure(inquiry::handlers::config),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind)?
    .run()
    .await
}
