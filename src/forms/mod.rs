//! Compiler forms: PDF templates filled by the client and mailed to the
//! back office.
//!
//! Each variant supplies a layout table and a message composer; rendering
//! and submission are shared (`service`).

pub mod adesione;
pub mod dojo;
pub mod handlers;
pub mod registry;
pub mod service;
pub mod session;

pub use adesione::AdesioneForm;
pub use dojo::DojoForm;
pub use registry::{FormRegistry, RegisteredForm};
pub use session::{CompilerSession, SessionState, SessionStatus, SessionStore};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::mail::MailEnvelope;
use crate::pdf::{FormLayout, FormValues};
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Dojo,
    Adesione,
}

impl FormKind {
    pub const ALL: [FormKind; 2] = [FormKind::Dojo, FormKind::Adesione];

    pub fn slug(self) -> &'static str {
        match self {
            FormKind::Dojo => "dojo",
            FormKind::Adesione => "adesione",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.slug() == slug)
    }
}

/// One variant of the compiler page.
pub trait CompilerForm: Send + Sync {
    fn kind(&self) -> FormKind;

    fn title(&self) -> &'static str;

    /// Built-in placement table, replaceable through a layout file.
    fn default_layout(&self) -> FormLayout;

    /// Name offered when the user downloads the filled PDF.
    fn download_filename(&self) -> &'static str;

    /// Name of the filled PDF inside the submitted mail.
    fn attachment_filename(&self) -> &'static str;

    /// Sections uploaded documents can be filed under.
    fn sections(&self) -> &'static [&'static str];

    /// Builds recipient, subject and message for a submission.
    fn compose(&self, values: &FormValues) -> Result<MailEnvelope, ValidationErrors>;
}

/// Sections shared by both compiler variants.
pub const DOCUMENT_SECTIONS: &[&str] = &["visura-camerale", "documenti-identita", "documento-iban"];
