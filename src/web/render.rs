//! Page rendering.
//!
//! Templates live under the web root at the path produced by the view
//! resolver. Two placeholders are understood:
//!
//! - `#{message.key}`: replaced by the catalog message for the request locale
//! - `${name}`: replaced by the HTML-escaped model attribute, or nothing

use crate::i18n::{Locale, MessageCatalog};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Attributes a handler exposes to its view.
pub type Model = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template not found: {path}")]
    TemplateNotFound { path: String },

    #[error("failed to read template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Turns a resolved template path and a model into a page body.
pub trait Renderer: Send + Sync {
    fn render(&self, template_path: &str, model: &Model, locale: &Locale) -> Result<String, RenderError>;
}

/// Renders templates from disk with message and model substitution.
pub struct TemplateRenderer {
    web_root: PathBuf,
    catalog: Arc<MessageCatalog>,
}

impl TemplateRenderer {
    pub fn new(web_root: impl Into<PathBuf>, catalog: Arc<MessageCatalog>) -> Self {
        Self {
            web_root: web_root.into(),
            catalog,
        }
    }

    /// Substitute placeholders in `template`.
    pub fn render_str(&self, template: &str, model: &Model, locale: &Locale) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures| {
                let name = &caps[2];
                if &caps[1] == "#" {
                    self.catalog.message(name, locale)
                } else {
                    model.get(name).map(|v| escape_html(v)).unwrap_or_default()
                }
            })
            .into_owned()
    }

    fn template_file(&self, template_path: &str) -> Option<PathBuf> {
        let relative = Path::new(template_path.trim_start_matches('/'));
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        plain.then(|| self.web_root.join(relative))
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, template_path: &str, model: &Model, locale: &Locale) -> Result<String, RenderError> {
        let not_found = || RenderError::TemplateNotFound {
            path: template_path.to_string(),
        };

        let file = self.template_file(template_path).ok_or_else(not_found)?;
        if !file.is_file() {
            return Err(not_found());
        }

        let template = std::fs::read_to_string(&file).map_err(|source| RenderError::Io {
            path: template_path.to_string(),
            source,
        })?;

        Ok(self.render_str(&template, model, locale))
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([#$])\{([A-Za-z0-9_.\-]+)\}").expect("valid regex"))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
