//! HTTP surface.
//!
//! Page routes run behind the locale pipeline; static assets and the health
//! check bypass it so they never create sessions.

mod error;
pub mod handlers;
pub mod pipeline;
pub mod render;
mod state;

pub use crate::interceptor::{Interceptor, InterceptorChain, RequestInfo};
pub use crate::params::RequestParams;
pub use error::WebError;
pub use state::AppState;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::collections::HashSet;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let pages: Router<AppState> = Router::new()
        .route("/", get(handlers::index))
        .route("/:view", get(handlers::page))
        .route("/captcha/validate", post(handlers::validate_captcha))
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            pipeline::locale_pipeline,
        ));

    let mut assets: Router<AppState> = Router::new().route("/health", get(handlers::health));
    let mut mounted = HashSet::new();
    for route in state.static_routes.routes() {
        let path = axum_path(route.pattern());
        if mounted.insert(path.clone()) {
            debug!("Mounting static route {} at {}", route.pattern(), path);
            assets = assets.route(&path, get(handlers::serve_static));
        }
    }

    pages
        .merge(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router path for a static pattern. Wildcards become a catch-all; the
/// route table does the precise matching.
fn axum_path(pattern: &str) -> String {
    match pattern.strip_suffix("**").or_else(|| pattern.strip_suffix('*')) {
        Some(prefix) => format!("{}*path", prefix),
        None => pattern.to_string(),
    }
}
