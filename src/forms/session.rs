//! Lifecycle of one compiler submission.
//!
//! `Draft -> Rendered -> Submitting -> Sent | Failed`. A document has to be
//! rendered before it can be submitted, and a session that is already
//! submitting cannot be submitted again. Sent and failed sessions need a new
//! render before another attempt.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::Serialize;
use tokio::sync::Mutex;
use utoipa::ToSchema;
use uuid::Uuid;

use super::FormKind;
use crate::error::FormError;
use crate::pdf::FormValues;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Draft,
    Rendered { pdf: Vec<u8>, values: FormValues },
    Submitting,
    Sent,
    Failed { reason: String },
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            SessionState::Draft => "draft",
            SessionState::Rendered { .. } => "rendered",
            SessionState::Submitting => "submitting",
            SessionState::Sent => "sent",
            SessionState::Failed { .. } => "failed",
        }
    }
}

/// Snapshot of a session as reported to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub id: Uuid,
    pub form: FormKind,
    /// `draft`, `rendered`, `submitting`, `sent` or `failed`.
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct CompilerSession {
    pub id: Uuid,
    pub kind: FormKind,
    pub created_at: DateTime<Utc>,
    state: SessionState,
}

impl CompilerSession {
    pub fn new(kind: FormKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            created_at: Utc::now(),
            state: SessionState::Draft,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            id: self.id,
            form: self.kind,
            state: self.state.label().to_string(),
            reason: match &self.state {
                SessionState::Failed { reason } => Some(reason.clone()),
                _ => None,
            },
            created_at: self.created_at,
        }
    }

    /// Refuses a session opened for another form.
    pub fn ensure_form(&self, kind: FormKind) -> Result<(), FormError> {
        if self.kind != kind {
            return Err(FormError::InvalidRequest(format!(
                "session {} belongs to '{}'",
                self.id,
                self.kind.slug()
            )));
        }
        Ok(())
    }

    /// Stores a freshly rendered document with the values it was filled
    /// from. Rendering again replaces it.
    pub fn rendered(&mut self, pdf: Vec<u8>, values: FormValues) -> Result<(), FormError> {
        if matches!(self.state, SessionState::Submitting) {
            return Err(FormError::SubmissionInProgress);
        }
        self.state = SessionState::Rendered { pdf, values };
        Ok(())
    }

    /// Moves to `Submitting` and hands out the rendered document and its
    /// values.
    pub fn begin_submit(&mut self) -> Result<(Vec<u8>, FormValues), FormError> {
        match std::mem::replace(&mut self.state, SessionState::Submitting) {
            SessionState::Rendered { pdf, values } => {
                log::debug!("session {} submitting {} bytes", self.id, pdf.len());
                Ok((pdf, values))
            }
            SessionState::Submitting => Err(FormError::SubmissionInProgress),
            other => {
                self.state = other;
                Err(FormError::NotRendered)
            }
        }
    }

    pub fn finish<T>(&mut self, outcome: &Result<T, FormError>) {
        self.state = match outcome {
            Ok(_) => SessionState::Sent,
            Err(e) => SessionState::Failed { reason: e.to_string() },
        };
        log::info!("session {} for {} finished: {}", self.id, self.kind.slug(), self.state.label());
    }
}

pub type SharedSession = Arc<Mutex<CompilerSession>>;

/// Open sessions by id. Entries expire after the configured time to live.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, SharedSession>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Cache::builder().time_to_live(ttl).max_capacity(10_000).build(),
        }
    }

    pub async fn insert(&self, session: CompilerSession) -> SharedSession {
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, shared.clone()).await;
        shared
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession, FormError> {
        self.sessions.get(&id).await.ok_or(FormError::UnknownSession(id))
    }
}
