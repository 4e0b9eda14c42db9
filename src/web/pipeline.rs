//! Per-request pipeline that runs before every page handler.
//!
//! Order is fixed: open the session from its cookie, run the interceptor
//! chain (which may change the session locale), resolve the active locale,
//! then dispatch. On the way out the response gets `Content-Language` and,
//! for a freshly created session, its cookie.

use crate::i18n::Locale;
use crate::interceptor::RequestInfo;
use crate::params::RequestParams;
use crate::session::Session;
use crate::web::{AppState, WebError};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header::{CONTENT_LANGUAGE, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cookie::{Cookie, SameSite};
use tracing::{debug, warn};

/// Largest url-encoded form body the pipeline will buffer.
pub const MAX_FORM_BYTES: usize = 1024 * 1024;

/// Per-request context handed to page handlers as a request extension.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session: Session,
    pub locale: Locale,
    pub params: RequestParams,
}

/// Middleware running the locale pipeline around a page handler.
pub async fn locale_pipeline(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let cookie_id = session_id_from_cookies(&parts.headers, &state.config.session_cookie);
    let mut session = state.sessions.open(cookie_id.as_deref());

    let mut params = RequestParams::from_query(parts.uri.query());
    let body = if is_form(&parts.headers) {
        match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
            Ok(bytes) => {
                params.extend_from_urlencoded(&bytes);
                Body::from(bytes)
            }
            Err(e) => {
                warn!("Failed to buffer form body: {}", e);
                return WebError::PayloadTooLarge.into_response();
            }
        }
    } else {
        body
    };

    let info = RequestInfo {
        method: &parts.method,
        path: parts.uri.path(),
        headers: &parts.headers,
        params: &params,
    };
    state.interceptors.pre_handle(&info, &mut session);

    let locale = state.locale_resolver.resolve(&session, &parts.headers);
    debug!(
        "{} {} resolved locale {} (session {})",
        parts.method,
        parts.uri.path(),
        locale,
        session.id
    );

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(RequestContext {
        session: session.clone(),
        locale: locale.clone(),
        params,
    });

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&locale.to_tag()) {
        response.headers_mut().insert(CONTENT_LANGUAGE, value);
    }

    // A handler that set its own cookie (logout) owns the session header.
    if session.is_new && !response.headers().contains_key(SET_COOKIE) {
        let cookie = session_cookie(&state.config.session_cookie, &session.id);
        if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }

    response
}

/// Session id carried by the request's `Cookie` headers, if any.
pub fn session_id_from_cookies(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value.to_string()))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|id| !id.is_empty())
}

/// The cookie that binds a user agent to its session.
pub fn session_cookie(cookie_name: &str, id: &str) -> Cookie<'static> {
    Cookie::build((cookie_name.to_string(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// A cookie that makes the user agent drop its session cookie.
pub fn expired_session_cookie(cookie_name: &str) -> Cookie<'static> {
    let mut cookie = session_cookie(cookie_name, "");
    cookie.make_removal();
    cookie
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}
