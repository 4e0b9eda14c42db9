//! Hooks that run between session lookup and handler dispatch.
//!
//! Interceptors see a read-only view of the request and may change the
//! session. The HTTP layer builds the view before any handler runs.

use crate::params::RequestParams;
use crate::session::Session;
use axum::http::{HeaderMap, Method};
use std::sync::Arc;
use tracing::debug;

/// What interceptors get to see of a request.
#[derive(Debug, Clone, Copy)]
pub struct RequestInfo<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
    pub params: &'a RequestParams,
}

/// Hook that runs before handler dispatch and may mutate the session.
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &'static str;

    fn pre_handle(&self, request: &RequestInfo<'_>, session: &mut Session);
}

/// Interceptors in registration order.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn pre_handle(&self, request: &RequestInfo<'_>, session: &mut Session) {
        for interceptor in &self.interceptors {
            debug!("Running interceptor {}", interceptor.name());
            interceptor.pre_handle(request, session);
        }
    }
}
