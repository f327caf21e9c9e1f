#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, Stream};
use tokio::sync::Mutex;

use dojo_forms_server::config::AppConfig;
use dojo_forms_server::error::FormError;
use dojo_forms_server::forms::{adesione, dojo, FormRegistry};
use dojo_forms_server::mail::{MailEndpoint, MailTransport};
use dojo_forms_server::pdf::{RenderError, TemplateSource};
use dojo_forms_server::AppState;

/// Blank A4 document with `pages` pages, each holding a short line.
pub fn template_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m 10 10 l S\n".to_vec()));
            Object::Reference(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
                "Contents" => content_id,
            }))
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => dictionary! {},
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

pub fn signature_png() -> Vec<u8> {
    let img = RgbaImage::from_pixel(8, 4, Rgba([0, 0, 80, 255]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn page_count(pdf: &[u8]) -> usize {
    Document::load_mem(pdf).unwrap().get_pages().len()
}

/// Operations of a page's combined content streams.
pub fn page_operations(pdf: &[u8], page: usize) -> Vec<lopdf::content::Operation> {
    let doc = Document::load_mem(pdf).unwrap();
    let page_id = *doc.get_pages().values().nth(page).unwrap();
    let content = doc.get_page_content(page_id).unwrap();
    Content::decode(&content).unwrap().operations
}

/// Strings shown with `Tj` on a page, decoded as Latin-1.
pub fn page_texts(pdf: &[u8], page: usize) -> Vec<String> {
    page_operations(pdf, page)
        .into_iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(bytes.iter().map(|&b| b as char).collect()),
            _ => None,
        })
        .collect()
}

pub fn page_has_image(pdf: &[u8], page: usize) -> bool {
    page_operations(pdf, page).iter().any(|op| op.operator == "Do")
}

/// Serves templates from memory.
pub struct MockTemplateSource {
    templates: HashMap<String, Vec<u8>>,
}

impl MockTemplateSource {
    pub fn with_builtin_templates() -> Self {
        let mut templates = HashMap::new();
        templates.insert(dojo::TEMPLATE.to_string(), template_pdf(1));
        templates.insert(adesione::TEMPLATE.to_string(), template_pdf(2));
        Self { templates }
    }

    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }
}

#[async_trait]
impl TemplateSource for MockTemplateSource {
    async fn load(&self, name: &str) -> Result<Vec<u8>, RenderError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::TemplateLoad(format!("template {} not found", name)))
    }
}

/// Records every delivery; optionally answers with an HTTP failure.
pub struct MockMailTransport {
    calls: Arc<Mutex<Vec<(MailEndpoint, serde_json::Value)>>>,
    failure: Option<(u16, String)>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    pub fn failing(status: u16, body: &str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failure: Some((status, body.to_string())),
        }
    }

    pub async fn calls(&self) -> Vec<(MailEndpoint, serde_json::Value)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn deliver(&self, endpoint: MailEndpoint, body: &serde_json::Value) -> Result<(), FormError> {
        self.calls.lock().await.push((endpoint, body.clone()));
        match &self.failure {
            Some((status, body)) => Err(FormError::Submission {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        max_attachment_bytes: 8 * 1024 * 1024,
        ..AppConfig::default()
    }
}

pub fn test_state(mailer: Arc<MockMailTransport>) -> AppState {
    AppState::new_with(
        test_config(),
        FormRegistry::builtin(),
        Arc::new(MockTemplateSource::with_builtin_templates()),
        mailer,
    )
}
