//! Input validation for submitted forms.
//!
//! Errors carry the field, a message and an optional hint, all in Italian
//! since they are shown to the person filling the form.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use utoipa::ToSchema;

lazy_static! {
    static ref CAP_RE: Regex = Regex::new(r"^\d{5}$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} è obbligatorio", label))
    }

    pub fn invalid_cap(field: &str) -> Self {
        Self::new(field, "CAP non valido").with_suggestion("Il CAP deve essere di 5 cifre, es. 20121")
    }

    pub fn invalid_email(field: &str) -> Self {
        Self::new(field, "Email non valida").with_suggestion("Inserisci un indirizzo come nome@dominio.it")
    }

    pub fn missing_attachment(field: &str, label: &str) -> Self {
        Self::new(field, format!("Carica {}", label))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn single(error: ValidationError) -> Self {
        Self { errors: vec![error] }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// One line per error, as shown to the user.
    pub fn to_message(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_message())
    }
}

pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

pub fn validate_cap(value: &str, field: &str, errors: &mut ValidationErrors) {
    if !CAP_RE.is_match(value.trim()) {
        errors.add(ValidationError::invalid_cap(field));
    }
}

/// Loose check: the address only needs an `@`.
pub fn validate_email(value: &str, field: &str, errors: &mut ValidationErrors) {
    if !value.contains('@') {
        errors.add(ValidationError::invalid_email(field));
    }
}
