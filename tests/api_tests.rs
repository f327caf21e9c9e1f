mod common;

use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;

use dojo_forms_server::mail::MailEndpoint;
use dojo_forms_server::{forms, inquiry};

use common::{page_count, signature_png, test_state, MockMailTransport};

const BOUNDARY: &str = "----dojoformsboundary";

enum Part<'a> {
    Text(&'a str, String),
    File(&'a str, &'a str, &'a str, Vec<u8>),
}

fn multipart_body(parts: Vec<Part>) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_request(uri: &str, parts: Vec<Part>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}

macro_rules! app {
    ($mailer:expr) => {
        test::init_service(
            App::new().app_data(web::Data::new(test_state($mailer))).service(
                web::scope("/api")
                    .configure(forms::handlers::config)
                    .configure(inquiry::handlers::config),
            ),
        )
        .await
    };
}

#[actix_web::test]
async fn test_list_forms() {
    let app = app!(Arc::new(MockMailTransport::new()));

    let req = test::TestRequest::get().uri("/api/forms").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let forms = body.as_array().unwrap();
    assert_eq!(forms.len(), 2);
    assert_eq!(forms[0]["slug"], "dojo");
    assert_eq!(forms[0]["page_count"], 1);
    assert_eq!(forms[1]["slug"], "adesione");
    assert_eq!(forms[1]["signature_slots"], json!(["firmaManager", "firmaCliente"]));
    assert_eq!(
        forms[1]["sections"],
        json!(["visura-camerale", "documenti-identita", "documento-iban"])
    );
}

#[actix_web::test]
async fn test_render_returns_pdf() {
    let app = app!(Arc::new(MockMailTransport::new()));
    let signature = format!("data:image/png;base64,{}", STANDARD.encode(signature_png()));

    let req = test::TestRequest::post()
        .uri("/api/forms/dojo/render?download=true")
        .set_json(json!({
            "values": { "ragione": "Acme Srl", "leadCanoneZero": true },
            "signatures": { "firmaCliente": signature }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");
    let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("modulo_compilato.pdf"));

    let pdf = test::read_body(resp).await;
    assert!(pdf.starts_with(b"%PDF"));
    assert_eq!(page_count(&pdf), 1);
}

#[actix_web::test]
async fn test_render_inline_by_default() {
    let app = app!(Arc::new(MockMailTransport::new()));

    let req = test::TestRequest::post()
        .uri("/api/forms/adesione/render")
        .set_json(json!({ "values": {} }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap().to_str().unwrap();
    assert!(disposition.starts_with("inline"));
}

#[actix_web::test]
async fn test_render_unknown_form_is_404() {
    let app = app!(Arc::new(MockMailTransport::new()));

    let req = test::TestRequest::post()
        .uri("/api/forms/contratto/render")
        .set_json(json!({ "values": {} }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NotFound");
}

#[actix_web::test]
async fn test_render_bad_signature_is_400() {
    let app = app!(Arc::new(MockMailTransport::new()));

    let req = test::TestRequest::post()
        .uri("/api/forms/dojo/render")
        .set_json(json!({ "signatures": { "firmaCliente": "%%%" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_submit_multipart() {
    let mailer = Arc::new(MockMailTransport::new());
    let app = app!(mailer.clone());

    let metadata = json!({ "ragione": "Acme Srl", "email": "info@acme.it" }).to_string();
    let req = multipart_request(
        "/api/forms/dojo/submit",
        vec![
            Part::Text("metadata", metadata),
            Part::File("signature_firmaCliente", "firma.png", "image/png", signature_png()),
            Part::File("file_visura-camerale", "visura.pdf", "application/pdf", b"%PDF-1.4".to_vec()),
        ],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["form"], "dojo");
    assert_eq!(body["attachments"], 2);

    let calls = mailer.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, MailEndpoint::Compiler);
    assert_eq!(calls[0].1["attachments"][1]["filename"], "visura.pdf");
}

#[actix_web::test]
async fn test_submit_mail_failure_is_502() {
    let mailer = Arc::new(MockMailTransport::failing(503, "down"));
    let app = app!(mailer.clone());

    let req = multipart_request(
        "/api/forms/dojo/submit",
        vec![Part::Text("metadata", json!({ "ragione": "Acme" }).to_string())],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "HTTP 503 - down");
}

#[actix_web::test]
async fn test_submit_invalid_metadata_is_400() {
    let mailer = Arc::new(MockMailTransport::new());
    let app = app!(mailer.clone());

    let req = multipart_request(
        "/api/forms/dojo/submit",
        vec![Part::Text("metadata", "{ not json".to_string())],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(mailer.calls().await.is_empty());
}

#[actix_web::test]
async fn test_contact_requires_name_and_email() {
    let mailer = Arc::new(MockMailTransport::new());
    let app = app!(mailer.clone());

    let req = multipart_request(
        "/api/contact",
        vec![Part::Text("metadata", json!({ "nome": "Mario" }).to_string())],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["errors"][0]["field"], "email");
    assert!(mailer.calls().await.is_empty());
}

#[actix_web::test]
async fn test_contact_forwards_attachment() {
    let mailer = Arc::new(MockMailTransport::new());
    let app = app!(mailer.clone());

    let req = multipart_request(
        "/api/contact",
        vec![
            Part::Text(
                "metadata",
                json!({ "nome": "Mario", "email": "mario@email.it", "messaggio": "Ciao" }).to_string(),
            ),
            Part::File("file", "preventivo.pdf", "application/pdf", b"%PDF".to_vec()),
        ],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let calls = mailer.calls().await;
    assert_eq!(calls[0].0, MailEndpoint::Contact);
    assert_eq!(calls[0].1["allegati"][0]["filename"], "preventivo.pdf");
    assert_eq!(calls[0].1["allegati"][0]["base64"], "JVBERg==");
}

#[actix_web::test]
async fn test_partner_manager_reports_all_errors() {
    let mailer = Arc::new(MockMailTransport::new());
    let app = app!(mailer.clone());

    let req = multipart_request(
        "/api/partner-manager",
        vec![Part::Text("metadata", json!({ "ragioneSociale": "Acme", "cap": "123" }).to_string())],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"cap"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"codice_fiscale"));
    assert!(fields.contains(&"firma"));
    assert!(!fields.contains(&"ragioneSociale"));
}

macro_rules! render_session_id {
    ($app:expr, $slug:expr) => {{
        let req = test::TestRequest::post()
            .uri(&format!("/api/forms/{}/render", $slug))
            .set_json(json!({ "values": { "ragione": "Acme Srl", "email": "info@acme.it" } }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        resp.headers().get("X-Session-Id").unwrap().to_str().unwrap().to_string()
    }};
}

/// A part the parser ignores, for submissions without uploads.
fn no_uploads() -> Vec<Part<'static>> {
    vec![Part::Text("origine", "web".to_string())]
}

#[actix_web::test]
async fn test_rendered_session_is_submitted_once() {
    let mailer = Arc::new(MockMailTransport::new());
    let app = app!(mailer.clone());
    let id = render_session_id!(app, "dojo");

    let uri = format!("/api/forms/dojo/sessions/{}/submit", id);
    let req = multipart_request(
        &uri,
        vec![Part::File("file_visura-camerale", "visura.pdf", "application/pdf", b"%PDF-1.4".to_vec())],
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["attachments"], 2);

    let calls = mailer.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].1["nome"], "Acme Srl");
    assert_eq!(calls[0].1["attachments"][0]["filename"], "modulo.pdf");

    let req = multipart_request(&uri, no_uploads()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(mailer.calls().await.len(), 1);

    let req = test::TestRequest::get().uri(&format!("/api/sessions/{}", id)).to_request();
    let status: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(status["state"], "sent");
}

#[actix_web::test]
async fn test_submit_before_render_is_409() {
    let mailer = Arc::new(MockMailTransport::new());
    let app = app!(mailer.clone());

    let req = test::TestRequest::post().uri("/api/forms/adesione/sessions").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let session: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(session["state"], "draft");
    let id = session["id"].as_str().unwrap().to_string();

    let req = multipart_request(&format!("/api/forms/adesione/sessions/{}/submit", id), no_uploads()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "NotRendered");
    assert!(mailer.calls().await.is_empty());

    let req = test::TestRequest::post()
        .uri(&format!("/api/forms/adesione/sessions/{}/render?download=true", id))
        .set_json(json!({ "values": { "personaleManagerMail": "pm@expopay.it" } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("X-Session-Id").unwrap().to_str().unwrap(), id);

    let req = multipart_request(&format!("/api/forms/adesione/sessions/{}/submit", id), no_uploads()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(mailer.calls().await[0].1["to"], "pm@expopay.it");
}

#[actix_web::test]
async fn test_failed_session_reports_reason() {
    let mailer = Arc::new(MockMailTransport::failing(500, "no body"));
    let app = app!(mailer.clone());
    let id = render_session_id!(app, "dojo");

    let req = multipart_request(&format!("/api/forms/dojo/sessions/{}/submit", id), no_uploads()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let req = test::TestRequest::get().uri(&format!("/api/sessions/{}", id)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let status: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(status["state"], "failed");
    assert_eq!(status["reason"], "HTTP 500 - no body");
}

#[actix_web::test]
async fn test_session_lookups() {
    let app = app!(Arc::new(MockMailTransport::new()));

    let req = test::TestRequest::get()
        .uri("/api/sessions/00000000-0000-0000-0000-000000000000")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let id = render_session_id!(app, "dojo");
    let req = multipart_request(&format!("/api/forms/adesione/sessions/{}/submit", id), no_uploads()).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
