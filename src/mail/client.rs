use async_trait::async_trait;

use super::{MailEndpoint, MailTransport};
use crate::config::MailConfig;
use crate::error::FormError;

/// `MailTransport` over reqwest. No retries: a failed POST surfaces as is.
pub struct HttpMailTransport {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailTransport {
    pub fn new(client: reqwest::Client, config: MailConfig) -> Self {
        Self { client, config }
    }

    pub fn url_for(&self, endpoint: MailEndpoint) -> &str {
        match endpoint {
            MailEndpoint::Compiler => &self.config.compiler_url,
            MailEndpoint::Contact => &self.config.contact_url,
            MailEndpoint::PartnerManager => &self.config.partner_url,
        }
    }
}

#[async_trait]
impl MailTransport for HttpMailTransport {
    async fn deliver(&self, endpoint: MailEndpoint, body: &serde_json::Value) -> Result<(), FormError> {
        let url = self.url_for(endpoint);
        log::info!("posting {:?} submission to {}", endpoint, url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| FormError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let body = if text.trim().is_empty() {
                "no body".to_string()
            } else {
                text
            };
            return Err(FormError::Submission {
                status: status.as_u16(),
                body,
            });
        }

        log::info!("{:?} submission accepted with status {}", endpoint, status);
        Ok(())
    }
}
