//! Render and submit flows shared by every compiler variant.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{CompilerForm, CompilerSession, FormKind, SessionStatus};
use crate::error::FormError;
use crate::mail::attachments::ensure_within_limit;
use crate::mail::{AttachmentSet, MailEndpoint, MailEnvelope, UploadedFile};
use crate::pdf::{FormRenderer, FormValues, RenderedDocument, SignatureSet};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub form: FormKind,
    pub attachments: usize,
    pub total_bytes: usize,
}

/// Loads the variant's template and fills it.
pub async fn render_form(
    state: &AppState,
    slug: &str,
    values: &FormValues,
    signatures: &SignatureSet,
) -> Result<RenderedDocument, FormError> {
    let entry = state.forms.by_slug(slug)?;
    let template = state.templates.load(&entry.layout.template).await?;
    let pdf = FormRenderer::render(&template, &entry.layout, values, signatures)?;
    log::info!("rendered '{}' ({} bytes)", slug, pdf.len());
    Ok(RenderedDocument {
        filename: entry.form.download_filename().to_string(),
        pdf,
    })
}

/// Opens an empty session for `slug`.
pub async fn create_session(state: &AppState, slug: &str) -> Result<SessionStatus, FormError> {
    let entry = state.forms.by_slug(slug)?;
    let session = state.sessions.insert(CompilerSession::new(entry.form.kind())).await;
    let status = session.lock().await.status();
    log::info!("opened session {} for '{}'", status.id, slug);
    Ok(status)
}

/// Renders the form into session `id`, replacing any earlier render.
pub async fn render_session(
    state: &AppState,
    slug: &str,
    id: Uuid,
    values: FormValues,
    signatures: &SignatureSet,
) -> Result<RenderedDocument, FormError> {
    let entry = state.forms.by_slug(slug)?;
    let shared = state.sessions.get(id).await?;
    shared.lock().await.ensure_form(entry.form.kind())?;

    let document = render_form(state, slug, &values, signatures).await?;
    shared.lock().await.rendered(document.pdf.clone(), values)?;
    Ok(document)
}

/// Opens a session and renders into it, so the document can be submitted
/// later by id.
pub async fn open_session(
    state: &AppState,
    slug: &str,
    values: FormValues,
    signatures: &SignatureSet,
) -> Result<(Uuid, RenderedDocument), FormError> {
    let id = create_session(state, slug).await?.id;
    let document = render_session(state, slug, id, values, signatures).await?;
    Ok((id, document))
}

pub async fn session_status(state: &AppState, id: Uuid) -> Result<SessionStatus, FormError> {
    let session = state.sessions.get(id).await?;
    let status = session.lock().await.status();
    Ok(status)
}

fn check_sections(form: &dyn CompilerForm, uploads: &AttachmentSet) -> Result<(), FormError> {
    for upload in uploads.iter() {
        if !form.sections().contains(&upload.section.as_str()) {
            return Err(FormError::InvalidRequest(format!(
                "unknown document section '{}'",
                upload.section
            )));
        }
    }
    Ok(())
}

/// Validates, renders, checks the attachment ceiling and posts the
/// submission in one go. The filled PDF is always the first attachment.
pub async fn submit_form(
    state: &AppState,
    slug: &str,
    values: &FormValues,
    signatures: &SignatureSet,
    uploads: &AttachmentSet,
) -> Result<SubmissionReceipt, FormError> {
    let entry = state.forms.by_slug(slug)?;
    let form = entry.form.as_ref();

    let envelope = form.compose(values)?;
    check_sections(form, uploads)?;

    let mut session = CompilerSession::new(form.kind());
    let rendered = render_form(state, slug, values, signatures).await?;
    session.rendered(rendered.pdf, values.clone())?;
    let (pdf, _) = session.begin_submit()?;

    let outcome = deliver(state, form.attachment_filename(), pdf, envelope, uploads).await;
    session.finish(&outcome);
    let (attachments, total_bytes) = outcome?;

    Ok(SubmissionReceipt {
        id: session.id,
        form: form.kind(),
        attachments,
        total_bytes,
    })
}

/// Submits the document rendered in session `id`. The session stays in
/// `Submitting` while the mail is posted, so a second submit is refused.
pub async fn submit_session(
    state: &AppState,
    slug: &str,
    id: Uuid,
    uploads: &AttachmentSet,
) -> Result<SubmissionReceipt, FormError> {
    let entry = state.forms.by_slug(slug)?;
    let form = entry.form.as_ref();
    check_sections(form, uploads)?;

    let shared = state.sessions.get(id).await?;
    let (pdf, values) = {
        let mut session = shared.lock().await;
        session.ensure_form(form.kind())?;
        session.begin_submit()?
    };

    let outcome = match form.compose(&values) {
        Ok(envelope) => deliver(state, form.attachment_filename(), pdf, envelope, uploads).await,
        Err(errors) => Err(errors.into()),
    };
    shared.lock().await.finish(&outcome);
    let (attachments, total_bytes) = outcome?;

    Ok(SubmissionReceipt {
        id,
        form: form.kind(),
        attachments,
        total_bytes,
    })
}

async fn deliver(
    state: &AppState,
    attachment_filename: &str,
    pdf: Vec<u8>,
    envelope: MailEnvelope,
    uploads: &AttachmentSet,
) -> Result<(usize, usize), FormError> {
    let rendered = UploadedFile::pdf(attachment_filename, pdf);
    let files: Vec<&UploadedFile> = std::iter::once(&rendered)
        .chain(uploads.iter().map(|a| &a.file))
        .collect();

    let total_bytes = ensure_within_limit(files.iter().copied(), state.config.max_attachment_bytes)?;
    let attachments: Vec<_> = files.iter().map(|f| f.encode(false)).collect();
    let count = attachments.len();

    let body = serde_json::to_value(envelope.into_payload(attachments))
        .map_err(|e| FormError::InvalidRequest(e.to_string()))?;
    state.mailer.deliver(MailEndpoint::Compiler, &body).await?;
    Ok((count, total_bytes))
}
