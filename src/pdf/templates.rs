use std::path::PathBuf;

use async_trait::async_trait;
use sanitize_filename::sanitize;

use super::RenderError;

/// Where template PDFs come from. Every call returns a fresh copy.
#[async_trait]
pub trait TemplateSource {
    async fn load(&self, name: &str) -> Result<Vec<u8>, RenderError>;
}

/// Templates read from a directory on disk.
pub struct FsTemplateSource {
    root: PathBuf,
}

impl FsTemplateSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(sanitize(name))
    }
}

#[async_trait]
impl TemplateSource for FsTemplateSource {
    async fn load(&self, name: &str) -> Result<Vec<u8>, RenderError> {
        let path = self.path_for(name);
        log::debug!("loading template {}", path.display());
        tokio::fs::read(&path).await.map_err(|e| {
            log::error!("failed to read template {}: {}", path.display(), e);
            RenderError::TemplateLoad(format!("{}: {}", name, e))
        })
    }
}
