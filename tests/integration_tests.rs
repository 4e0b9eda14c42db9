//! Integration tests for the EU CAPTCHA web front end
//!
//! These tests drive the full router against a temporary web root: session
//! cookies, locale switching through the `lang` parameter, view rendering,
//! localized validation and static asset routing.

use axum::body::Body;
use axum::http::header::{
    ACCEPT_LANGUAGE, CONTENT_LANGUAGE, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE,
};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use eucaptcha_web::config::Config;
use eucaptcha_web::i18n::MessageCatalog;
use eucaptcha_web::web::{build_router, AppState};
use http_body_util::BodyExt;
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;

// ==================== Test Helpers ====================

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Create a web root with pages, assets and message bundles
fn create_web_root() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let root = dir.path();

    write(
        root,
        "WEB-INF/classes/messages.properties",
        "title=EU CAPTCHA\n\
         greeting=Hello\n\
         captcha.id.required=The challenge is missing\n\
         captcha.answer.required=Please type the characters you see\n\
         validation.size=must be between {min} and {max} characters\n",
    );
    write(
        root,
        "WEB-INF/classes/messages_fr.properties",
        "greeting=Bonjour\n\
         captcha.answer.required=Veuillez saisir les caract\\u00e8res affich\u{e9}s\n",
    );
    write(root, "WEB-INF/classes/messages_es.properties", "greeting=Hola\n");

    write(
        root,
        "WEB-INF/pages/index.jsp",
        "<html lang=\"${lang}\"><h1>#{title}</h1><p>#{greeting}</p></html>",
    );
    write(root, "WEB-INF/pages/about.jsp", "<p>#{greeting}</p>");
    write(root, "WEB-INF/pages/css/app.css", "body { color: black; }");
    write(root, "WEB-INF/pages/js/app.js", "console.log('ok');");
    write(root, "webjars/jquery/3.7.1/jquery.min.js", "/* jquery */");
    write(root, "WEB-INF/secret.txt", "do not serve");

    dir
}

struct TestApp {
    _dir: TempDir,
    router: Router,
    state: AppState,
}

fn create_test_app() -> TestApp {
    create_test_app_with(|_| {})
}

fn create_test_app_with(customize: impl FnOnce(&mut Config)) -> TestApp {
    let dir = create_web_root();
    let mut config = Config::with_web_root(dir.path());
    customize(&mut config);

    let catalog = MessageCatalog::load(
        &config.messages_dir,
        &config.messages_basename,
        config.fallback_locale(),
    )
    .expect("Failed to load catalog");

    let state = AppState::new(config, catalog);
    TestApp {
        _dir: dir,
        router: build_router(state.clone()),
        state,
    }
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    fn header(&self, name: axum::http::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// `NAME=value` part of the Set-Cookie header, ready to send back
    fn session_cookie(&self) -> Option<String> {
        self.header(SET_COOKIE)
            .and_then(|v| v.split(';').next())
            .map(|v| v.to_string())
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Response is not JSON")
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::get(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap()).await
    }
}

// ==================== Locale Pipeline Tests ====================

#[tokio::test]
async fn test_first_visit_uses_default_locale() {
    let app = create_test_app();

    let response = app.get("/", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<h1>EU CAPTCHA</h1>"));
    assert!(response.body.contains("<p>Hello</p>"));
    assert!(response.body.contains("lang=\"en\""));
    assert_eq!(response.header(CONTENT_LANGUAGE), Some("en"));

    let set_cookie = response.header(SET_COOKIE).expect("New session sets a cookie");
    assert!(set_cookie.starts_with("EUCAPTCHA_SESSION="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_lang_param_switches_and_sticks() {
    let app = create_test_app();

    let first = app.get("/?lang=fr", None).await;
    assert!(first.body.contains("<p>Bonjour</p>"));
    assert_eq!(first.header(CONTENT_LANGUAGE), Some("fr"));
    let cookie = first.session_cookie().unwrap();

    let second = app.get("/", Some(&cookie)).await;
    assert!(second.body.contains("<p>Bonjour</p>"));
    assert_eq!(second.header(CONTENT_LANGUAGE), Some("fr"));
    assert!(second.header(SET_COOKIE).is_none(), "Existing session keeps its cookie");
}

#[tokio::test]
async fn test_missing_key_in_locale_falls_back_to_base_bundle() {
    let app = create_test_app();

    let response = app.get("/?lang=fr", None).await;

    assert!(response.body.contains("<h1>EU CAPTCHA</h1>"));
}

#[tokio::test]
async fn test_locale_without_bundle_renders_default_messages() {
    let app = create_test_app();

    let response = app.get("/?lang=de", None).await;

    assert!(response.body.contains("<p>Hello</p>"));
    assert_eq!(response.header(CONTENT_LANGUAGE), Some("de"));
}

#[tokio::test]
async fn test_invalid_lang_keeps_previous_locale() {
    let app = create_test_app();
    let cookie = app.get("/?lang=es", None).await.session_cookie().unwrap();

    let response = app.get("/?lang=1234", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("<p>Hola</p>"));
}

#[tokio::test]
async fn test_blank_lang_is_ignored() {
    let app = create_test_app();
    let cookie = app.get("/?lang=es", None).await.session_cookie().unwrap();

    let response = app.get("/?lang=", Some(&cookie)).await;

    assert!(response.body.contains("<p>Hola</p>"));
}

#[tokio::test]
async fn test_unknown_session_cookie_starts_new_session() {
    let app = create_test_app();

    let response = app.get("/", Some("EUCAPTCHA_SESSION=forged")).await;

    let cookie = response.session_cookie().unwrap();
    assert_ne!(cookie, "EUCAPTCHA_SESSION=forged");
    assert!(response.body.contains("<p>Hello</p>"));
}

#[tokio::test]
async fn test_accept_language_used_without_default_locale() {
    let app = create_test_app_with(|config| config.default_locale = None);

    let request = Request::get("/")
        .header(ACCEPT_LANGUAGE, "fr-CH, fr;q=0.9, en;q=0.8")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert!(response.body.contains("<p>Bonjour</p>"));
    assert_eq!(response.header(CONTENT_LANGUAGE), Some("fr-CH"));
}

#[tokio::test]
async fn test_configured_default_ignores_accept_language() {
    let app = create_test_app();

    let request = Request::get("/")
        .header(ACCEPT_LANGUAGE, "fr")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert!(response.body.contains("<p>Hello</p>"));
}

#[tokio::test]
async fn test_custom_locale_param() {
    let app = create_test_app_with(|config| config.locale_param = "locale".to_string());

    assert!(app.get("/?lang=fr", None).await.body.contains("Hello"));
    assert!(app.get("/?locale=fr", None).await.body.contains("Bonjour"));
}

// ==================== View Tests ====================

#[tokio::test]
async fn test_named_page_renders_its_template() {
    let app = create_test_app();

    let response = app.get("/about?lang=es", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "<p>Hola</p>");
}

#[tokio::test]
async fn test_page_without_template_is_server_error() {
    let app = create_test_app();

    let response = app.get("/nope", None).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.body.contains("nope.jsp"));
}

#[tokio::test]
async fn test_malformed_view_name_is_not_found() {
    let app = create_test_app();

    assert_eq!(app.get("/a.b", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_index_template_is_server_error() {
    let app = create_test_app();
    std::fs::remove_file(app.state.config.web_root.join("WEB-INF/pages/index.jsp")).unwrap();

    let response = app.get("/", None).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!response.body.contains("index.jsp"));
}

#[tokio::test]
async fn test_custom_view_layout() {
    let app = create_test_app_with(|config| {
        config.view_prefix = "/templates/".to_string();
        config.view_suffix = ".html".to_string();
    });
    std::fs::create_dir_all(app.state.config.web_root.join("templates")).unwrap();
    std::fs::write(
        app.state.config.web_root.join("templates/index.html"),
        "#{greeting} from html",
    )
    .unwrap();

    let response = app.get("/", None).await;

    assert_eq!(response.body, "Hello from html");
}

// ==================== Static Resource Tests ====================

#[tokio::test]
async fn test_css_served_after_lang_switch() {
    let app = create_test_app();
    let cookie = app.get("/about?lang=es", None).await.session_cookie().unwrap();

    let response = app.get("/css/app.css", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "body { color: black; }");
    assert!(response.header(CONTENT_TYPE).unwrap().starts_with("text/css"));

    // Static requests leave the session untouched
    let page = app.get("/", Some(&cookie)).await;
    assert!(page.body.contains("<p>Hola</p>"));
}

#[tokio::test]
async fn test_js_and_webjars_served() {
    let app = create_test_app();

    let js = app.get("/js/app.js", None).await;
    assert_eq!(js.status, StatusCode::OK);
    assert_eq!(js.body, "console.log('ok');");

    let jquery = app.get("/webjars/jquery/3.7.1/jquery.min.js", None).await;
    assert_eq!(jquery.status, StatusCode::OK);
    assert_eq!(jquery.body, "/* jquery */");
}

#[tokio::test]
async fn test_static_requests_do_not_create_sessions() {
    let app = create_test_app();

    let response = app.get("/css/app.css", None).await;

    assert!(response.header(SET_COOKIE).is_none());
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn test_missing_asset_is_not_found() {
    let app = create_test_app();

    assert_eq!(app.get("/css/missing.css", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/webjars/none/x.js", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_traversal_is_not_found() {
    let app = create_test_app();

    let response = app.get("/css/%2e%2e/%2e%2e/secret.txt", None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(!response.body.contains("do not serve"));
}

// ==================== Validation Tests ====================

#[tokio::test]
async fn test_valid_captcha_form() {
    let app = create_test_app();

    let response = app
        .post_form("/captcha/validate", "captchaId=c-42&answer=x7k2", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json(), serde_json::json!({ "valid": true }));
}

#[tokio::test]
async fn test_violations_are_localized_for_session_locale() {
    let app = create_test_app();
    let cookie = app.get("/?lang=fr", None).await.session_cookie().unwrap();

    let response = app
        .post_form("/captcha/validate", "captchaId=c-42&answer=", Some(&cookie))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let json = response.json();
    assert_eq!(json["valid"], false);
    let violation = &json["violations"][0];
    assert_eq!(violation["field"], "answer");
    assert_eq!(violation["message_key"], "captcha.answer.required");
    assert_eq!(
        violation["resolved_message"],
        "Veuillez saisir les caractères affichés"
    );
}

#[tokio::test]
async fn test_lang_in_form_body_switches_locale() {
    let app = create_test_app();

    let response = app
        .post_form("/captcha/validate", "lang=fr&captchaId=c-42&answer=", None)
        .await;

    assert_eq!(response.header(CONTENT_LANGUAGE), Some("fr"));
    assert_eq!(
        response.json()["violations"][0]["resolved_message"],
        "Veuillez saisir les caractères affichés"
    );
}

#[tokio::test]
async fn test_violation_falls_back_to_base_message() {
    let app = create_test_app();
    let long_answer = "a".repeat(40);

    let response = app
        .post_form(
            "/captcha/validate?lang=es",
            &format!("captchaId=&answer={}", long_answer),
            None,
        )
        .await;

    let json = response.json();
    let messages: Vec<&str> = json["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["resolved_message"].as_str().unwrap())
        .collect();

    assert!(messages.contains(&"must be between 1 and 32 characters"));
    assert!(messages.contains(&"The challenge is missing"));
}

// ==================== Session Lifecycle Tests ====================

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = create_test_app();
    let cookie = app.get("/?lang=fr", None).await.session_cookie().unwrap();
    assert_eq!(app.state.sessions.len(), 1);

    let response = app.post_form("/logout", "", Some(&cookie)).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header(LOCATION), Some("/"));
    assert!(response.header(SET_COOKIE).unwrap().contains("Max-Age=0"));
    assert!(app.state.sessions.is_empty());

    let after = app.get("/", Some(&cookie)).await;
    assert!(after.body.contains("<p>Hello</p>"));
    assert!(after.session_cookie().is_some());
}

// ==================== Health Tests ====================

#[tokio::test]
async fn test_health() {
    let app = create_test_app();
    app.get("/?lang=fr", None).await;

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header(SET_COOKIE).is_none());
    let json = response.json();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions"], 1);
    assert_eq!(json["default_locale"], "en");
    assert_eq!(json["locales"], serde_json::json!(["es", "fr"]));
    assert!(json["messages"]["lookups"].as_u64().unwrap() >= 2);
}
