//! Runtime configuration read from the environment (and `.env`).

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_COMPILER_URL: &str = "https://bc.davveroo.it/api/sendToClient";
pub const DEFAULT_CONTACT_URL: &str = "https://emailsender-68kp.onrender.com/api/sendToClient";
pub const DEFAULT_PARTNER_URL: &str = "https://emailsender-68kp.onrender.com/api/diventa-partner-manager";
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 8 * 1024 * 1024;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct MailConfig {
    pub compiler_url: String,
    pub contact_url: String,
    pub partner_url: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            compiler_url: DEFAULT_COMPILER_URL.to_string(),
            contact_url: DEFAULT_CONTACT_URL.to_string(),
            partner_url: DEFAULT_PARTNER_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub template_dir: PathBuf,
    /// Optional directory of `<slug>.json` layout overrides.
    pub layout_dir: Option<PathBuf>,
    pub mail: MailConfig,
    pub max_attachment_bytes: usize,
    /// How long a rendered session waits for its submission.
    pub session_ttl_secs: u64,
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            template_dir: PathBuf::from("./templates"),
            layout_dir: None,
            mail: MailConfig::default(),
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; unset keys keep their
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(p) => p.trim().parse().with_context(|| format!("PORT is not a valid port: {}", p))?,
            None => defaults.port,
        };
        let max_attachment_bytes = match get("MAX_ATTACHMENT_BYTES") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("MAX_ATTACHMENT_BYTES is not a number: {}", v))?,
            None => defaults.max_attachment_bytes,
        };
        let session_ttl_secs = match get("SESSION_TTL_SECS") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("SESSION_TTL_SECS is not a number: {}", v))?,
            None => defaults.session_ttl_secs,
        };
        let allowed_origins = match get("ALLOWED_ORIGINS") {
            Some(v) => v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.allowed_origins,
        };

        Ok(Self {
            host: get("BIND_ADDRESS").unwrap_or(defaults.host),
            port,
            template_dir: get("TEMPLATE_DIR").map(PathBuf::from).unwrap_or(defaults.template_dir),
            layout_dir: get("LAYOUT_DIR").map(PathBuf::from),
            mail: MailConfig {
                compiler_url: get("MAIL_API_URL").unwrap_or(defaults.mail.compiler_url),
                contact_url: get("CONTACT_API_URL").unwrap_or(defaults.mail.contact_url),
                partner_url: get("PARTNER_API_URL").unwrap_or(defaults.mail.partner_url),
            },
            max_attachment_bytes,
            session_ttl_secs,
            allowed_origins,
        })
    }
}
