//! Values fed into a layout: field values and captured signatures.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use super::RenderError;

/// A single form value as submitted by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Number(serde_json::Number),
}

impl FieldValue {
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Number(n) => n.to_string(),
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            FieldValue::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "si" | "sì" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            FieldValue::Number(_) => None,
        }
    }
}

/// Field name to value, ordered by name. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(BTreeMap<String, FieldValue>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_text(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_string(), FieldValue::Text(value.into()));
    }

    pub fn insert_flag(&mut self, name: &str, value: bool) {
        self.0.insert(name.to_string(), FieldValue::Flag(value));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    /// Textual value, empty when the field is absent.
    pub fn text(&self, name: &str) -> String {
        self.0.get(name).map(FieldValue::as_text).unwrap_or_default()
    }

    /// Trimmed text, `None` when absent or blank.
    pub fn non_blank(&self, name: &str) -> Option<String> {
        let text = self.text(name);
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(FieldValue::as_flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// State of one signature pad.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SignatureSlot {
    #[default]
    Empty,
    Captured(Vec<u8>),
}

impl SignatureSlot {
    pub fn is_captured(&self) -> bool {
        matches!(self, SignatureSlot::Captured(_))
    }

    pub fn png(&self) -> Option<&[u8]> {
        match self {
            SignatureSlot::Captured(bytes) => Some(bytes),
            SignatureSlot::Empty => None,
        }
    }
}

const EMPTY_SLOT: SignatureSlot = SignatureSlot::Empty;

/// Signature pads of a form keyed by slot name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureSet(BTreeMap<String, SignatureSlot>);

impl SignatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores PNG bytes for a slot; an empty buffer clears it.
    pub fn capture(&mut self, slot: &str, png: Vec<u8>) {
        let state = if png.is_empty() {
            SignatureSlot::Empty
        } else {
            SignatureSlot::Captured(png)
        };
        self.0.insert(slot.to_string(), state);
    }

    pub fn clear(&mut self, slot: &str) {
        self.0.insert(slot.to_string(), SignatureSlot::Empty);
    }

    pub fn get(&self, slot: &str) -> &SignatureSlot {
        self.0.get(slot).unwrap_or(&EMPTY_SLOT)
    }

    pub fn captured_slots(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, state)| state.is_captured())
            .map(|(name, _)| name.as_str())
    }

    /// Builds the set from base64 strings, accepting `data:image/png;base64,`
    /// URLs as exported by browser signature pads.
    pub fn from_encoded(encoded: &BTreeMap<String, String>) -> Result<Self, RenderError> {
        let mut set = Self::new();
        for (slot, value) in encoded {
            let png = decode_data_url(value).map_err(|e| {
                RenderError::ImageDecode(format!("signature '{}' is not valid base64: {}", slot, e))
            })?;
            set.capture(slot, png);
        }
        Ok(set)
    }
}

pub fn decode_data_url(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match value.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => value,
    };
    STANDARD.decode(payload.trim())
}
