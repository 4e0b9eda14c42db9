//! Locale switching through a request parameter.

use crate::i18n::{Locale, SessionLocaleResolver};
use crate::interceptor::{Interceptor, RequestInfo};
use crate::session::Session;
use axum::http::Method;
use std::sync::Arc;
use tracing::{info, warn};

/// Reads the locale parameter (default `lang`) before handler dispatch and,
/// when present and valid, stores it in the session through the resolver.
///
/// A blank or absent parameter is a no-op. An unparseable value is logged
/// and ignored, leaving the previous locale in place.
pub struct LocaleChangeInterceptor {
    param_name: String,
    http_methods: Vec<Method>,
    resolver: Arc<SessionLocaleResolver>,
}

impl LocaleChangeInterceptor {
    pub fn new(param_name: impl Into<String>, resolver: Arc<SessionLocaleResolver>) -> Self {
        Self {
            param_name: param_name.into(),
            http_methods: Vec::new(),
            resolver,
        }
    }

    /// Only react to these methods. Empty means every method.
    pub fn with_http_methods(mut self, methods: Vec<Method>) -> Self {
        self.http_methods = methods;
        self
    }

    pub fn param_name(&self) -> &str {
        &self.param_name
    }

    fn applies_to(&self, method: &Method) -> bool {
        self.http_methods.is_empty() || self.http_methods.contains(method)
    }
}

impl Interceptor for LocaleChangeInterceptor {
    fn name(&self) -> &'static str {
        "locale-change"
    }

    fn pre_handle(&self, request: &RequestInfo<'_>, session: &mut Session) {
        if !self.applies_to(request.method) {
            return;
        }

        let Some(value) = request
            .params
            .get(&self.param_name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
        else {
            return;
        };

        match Locale::parse(value) {
            Ok(locale) => {
                info!("Session {} switched locale to {}", session.id, locale);
                self.resolver.set_locale(session, Some(locale));
            }
            Err(e) => {
                warn!(
                    "Ignoring invalid {} parameter '{}': {}",
                    self.param_name, value, e
                );
            }
        }
    }
}
