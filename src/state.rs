use std::sync::Arc;

use crate::config::AppConfig;
use crate::forms::{FormRegistry, SessionStore};
use crate::mail::{HttpMailTransport, MailTransport};
use crate::pdf::{FsTemplateSource, TemplateSource};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub forms: Arc<FormRegistry>,
    pub templates: Arc<dyn TemplateSource + Send + Sync>,
    pub mailer: Arc<dyn MailTransport + Send + Sync>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Wires the filesystem template source, the HTTP mail transport and
    /// any layout overrides from the configuration.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(900))
            .user_agent("dojo-forms-server/1.0")
            .build()?;

        let forms = FormRegistry::load(config.layout_dir.as_deref())?;
        let templates = Arc::new(FsTemplateSource::new(config.template_dir.clone()));
        let mailer = Arc::new(HttpMailTransport::new(http_client, config.mail.clone()));

        Ok(Self::new_with(config, forms, templates, mailer))
    }

    pub fn new_with(
        config: AppConfig,
        forms: FormRegistry,
        templates: Arc<dyn TemplateSource + Send + Sync>,
        mailer: Arc<dyn MailTransport + Send + Sync>,
    ) -> Self {
        let sessions = SessionStore::new(std::time::Duration::from_secs(config.session_ttl_secs));
        Self {
            config: Arc::new(config),
            forms: Arc::new(forms),
            templates,
            mailer,
            sessions,
        }
    }
}
