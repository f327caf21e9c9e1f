use std::fs;
use std::path::Path;

use anyhow::{bail, Context};

use super::{AdesioneForm, CompilerForm, DojoForm, FormKind};
use crate::error::FormError;
use crate::pdf::FormLayout;

/// A form variant together with the layout currently in use for it.
pub struct RegisteredForm {
    pub form: Box<dyn CompilerForm>,
    pub layout: FormLayout,
}

pub struct FormRegistry {
    forms: Vec<RegisteredForm>,
}

impl FormRegistry {
    /// Both variants with their built-in layouts.
    pub fn builtin() -> Self {
        let forms: Vec<Box<dyn CompilerForm>> = vec![Box::new(DojoForm), Box::new(AdesioneForm)];
        Self {
            forms: forms
                .into_iter()
                .map(|form| RegisteredForm {
                    layout: form.default_layout(),
                    form,
                })
                .collect(),
        }
    }

    /// Built-in layouts, replaced by `<slug>.json` files found in
    /// `layout_dir`.
    pub fn load(layout_dir: Option<&Path>) -> anyhow::Result<Self> {
        let mut registry = Self::builtin();
        let Some(dir) = layout_dir else {
            return Ok(registry);
        };

        for kind in FormKind::ALL {
            let path = dir.join(format!("{}.json", kind.slug()));
            if !path.exists() {
                log::debug!("no layout override for '{}' at {}", kind.slug(), path.display());
                continue;
            }
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read layout {}", path.display()))?;
            let layout: FormLayout = serde_json::from_str(&raw)
                .with_context(|| format!("invalid layout {}", path.display()))?;
            registry = registry.with_layout(kind, layout)?;
            log::info!("loaded layout override for '{}' from {}", kind.slug(), path.display());
        }
        Ok(registry)
    }

    pub fn with_layout(mut self, kind: FormKind, layout: FormLayout) -> anyhow::Result<Self> {
        if let Err((page, pages)) = layout.check_pages() {
            bail!(
                "layout for '{}' places content on page {} but declares {} page(s)",
                kind.slug(),
                page,
                pages
            );
        }
        if let Some(entry) = self.forms.iter_mut().find(|f| f.form.kind() == kind) {
            entry.layout = layout;
        }
        Ok(self)
    }

    pub fn get(&self, kind: FormKind) -> Option<&RegisteredForm> {
        self.forms.iter().find(|f| f.form.kind() == kind)
    }

    pub fn by_slug(&self, slug: &str) -> Result<&RegisteredForm, FormError> {
        FormKind::from_slug(slug)
            .and_then(|kind| self.get(kind))
            .ok_or_else(|| FormError::UnknownForm(slug.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredForm> {
        self.forms.iter()
    }
}
