//! Session-backed locale resolution.

use crate::i18n::Locale;
use crate::session::{Session, SessionStore};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::debug;

/// Resolves the active locale of a request from its session.
///
/// A locale stored in the session always wins. Otherwise the configured
/// default is used; when no default is configured, the best-weighted
/// parseable `Accept-Language` tag, and finally English.
pub struct SessionLocaleResolver {
    store: Arc<SessionStore>,
    default_locale: Option<Locale>,
}

impl SessionLocaleResolver {
    pub fn new(store: Arc<SessionStore>, default_locale: Option<Locale>) -> Self {
        Self {
            store,
            default_locale,
        }
    }

    pub fn default_locale(&self) -> Option<&Locale> {
        self.default_locale.as_ref()
    }

    /// Resolve the locale for a request. Never fails: absence of a session
    /// locale is the normal path.
    pub fn resolve(&self, session: &Session, headers: &HeaderMap) -> Locale {
        self.store
            .locale(&session.id)
            .unwrap_or_else(|| self.determine_default(headers))
    }

    /// Persist `locale` into the session; `None` restores the default.
    pub fn set_locale(&self, session: &mut Session, locale: Option<Locale>) {
        if !self.store.set_locale(&session.id, locale.clone()) {
            debug!("Session vanished before its locale could be stored");
        }
        session.locale = locale;
    }

    fn determine_default(&self, headers: &HeaderMap) -> Locale {
        if let Some(locale) = &self.default_locale {
            return locale.clone();
        }
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_accept_language)
            .unwrap_or_else(Locale::english)
    }
}

/// Highest-weighted parseable tag of an `Accept-Language` value.
fn parse_accept_language(value: &str) -> Option<Locale> {
    let mut weighted: Vec<(u16, Locale)> = value
        .split(',')
        .filter_map(|part| {
            let (tag, quality) = parse_language_range(part)?;
            let locale = Locale::parse(tag).ok()?;
            Some((quality, locale))
        })
        .collect();

    // Stable sort keeps header order among equal weights
    weighted.sort_by(|a, b| b.0.cmp(&a.0));
    weighted.into_iter().next().map(|(_, locale)| locale)
}

/// Split `fr-CH;q=0.9` into its tag and a quality in thousandths. Wildcards
/// and ranges with zero quality are dropped.
fn parse_language_range(part: &str) -> Option<(&str, u16)> {
    let mut pieces = part.split(';');
    let tag = pieces.next()?.trim();
    if tag.is_empty() || tag == "*" {
        return None;
    }
    let quality = pieces
        .filter_map(|param| param.trim().strip_prefix("q="))
        .find_map(parse_quality)
        .unwrap_or(1000);
    (quality > 0).then_some((tag, quality))
}

fn parse_quality(value: &str) -> Option<u16> {
    let quality = value.trim().parse::<f32>().ok()?;
    if !quality.is_finite() {
        return None;
    }
    Some((quality.clamp(0.0, 1.0) * 1000.0) as u16)
}
