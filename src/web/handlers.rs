use crate::i18n::MetricsReport;
use crate::validation::constraints::{not_blank, pattern, size};
use crate::validation::{ConstraintViolation, Validate, Violation};
use crate::view::View;
use crate::web::pipeline::{expired_session_cookie, RequestContext};
use crate::web::render::Model;
use crate::web::{AppState, WebError};
use axum::body::Body;
use axum::extract::{Path, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Redirect, Response};
use axum::{Extension, Form};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, info};

/// Logical view names a URL may select directly.
fn view_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid regex"))
}

fn captcha_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z0-9-]+").expect("valid regex"))
}

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Response, WebError> {
    render_view(&state, &ctx, "index", base_model(&ctx))
}

/// `GET /:view`
pub async fn page(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(view): Path<String>,
) -> Result<Response, WebError> {
    if !view_name_regex().is_match(&view) {
        return Err(WebError::NotFound);
    }
    render_view(&state, &ctx, &view, base_model(&ctx))
}

/// Answer submitted for a challenge.
#[derive(Debug, Default, Deserialize)]
pub struct CaptchaForm {
    #[serde(rename = "captchaId", default)]
    pub captcha_id: String,

    #[serde(default)]
    pub answer: String,
}

impl Validate for CaptchaForm {
    fn validate(&self) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        match not_blank("captchaId", &self.captcha_id) {
            Some(v) => violations.push(v.with_template("{captcha.id.required}")),
            None => violations.extend(pattern("captchaId", &self.captcha_id, captcha_id_regex())),
        }

        match not_blank("answer", &self.answer) {
            Some(v) => violations.push(v.with_template("{captcha.answer.required}")),
            None => violations.extend(size("answer", &self.answer, 1, 32)),
        }

        violations
    }
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub valid: bool,

    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub violations: BTreeSet<Violation>,
}

/// `POST /captcha/validate`: 200 when the form is well-formed, 422 with
/// localized violations otherwise.
pub async fn validate_captcha(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Form(form): Form<CaptchaForm>,
) -> Response {
    let violations = state.validator.validate(&form, &ctx.locale);
    let valid = violations.is_empty();
    debug!(
        "Captcha form for session {}: {} violation(s)",
        ctx.session.id,
        violations.len()
    );

    let status = if valid {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(ValidationResponse { valid, violations })).into_response()
}

/// `POST /logout`: drop the session and send the client home.
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Response, WebError> {
    if state.sessions.invalidate(&ctx.session.id) {
        info!("Session {} logged out", ctx.session.id);
    }

    let mut response = render_view(&state, &ctx, "redirect:/", Model::new())?;
    let cookie = expired_session_cookie(&state.config.session_cookie);
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    Ok(response)
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub default_locale: Option<String>,
    pub locales: Vec<String>,
    pub messages: MetricsReport,
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.len(),
        default_locale: state.locale_resolver.default_locale().map(|l| l.to_tag()),
        locales: state
            .catalog
            .locales()
            .iter()
            .map(|locale| locale.to_tag())
            .collect(),
        messages: state.catalog.metrics().report(),
    })
}

/// Serve a file from the static route table, or 404.
pub async fn serve_static(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let Some(resource) = state.static_routes.route(&path) else {
        debug!("No static resource for {}", path);
        return StatusCode::NOT_FOUND.into_response();
    };

    debug!("Serving {} from {}", path, resource.location);
    match ServeFile::new(&resource.file).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

fn base_model(ctx: &RequestContext) -> Model {
    let mut model = Model::new();
    model.insert("lang".to_string(), ctx.locale.to_tag());
    model
}

/// Turn a logical view name into a response.
///
/// `redirect:` answers with a 303 to the target; `forward:` renders the view
/// named by the target path without a round trip.
pub fn render_view(
    state: &AppState,
    ctx: &RequestContext,
    logical_name: &str,
    model: Model,
) -> Result<Response, WebError> {
    match state.views.resolve_view(logical_name) {
        View::Template(path) => {
            let html = state.renderer.render(&path, &model, &ctx.locale)?;
            Ok(Html(html).into_response())
        }
        View::Redirect(url) => Ok(Redirect::to(&url).into_response()),
        View::Forward(path) => {
            let target = path.trim_start_matches('/');
            let target = if target.is_empty() { "index" } else { target };
            let template = state.views.resolve(target);
            let html = state.renderer.render(&template, &model, &ctx.locale)?;
            Ok(Html(html).into_response())
        }
    }
}
