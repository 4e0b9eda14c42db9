use crate::web::render::RenderError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{error, warn};

/// Failures a page handler can surface to the client.
#[derive(Debug, Error)]
pub enum WebError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("not found")]
    NotFound,
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        // Internal details stay in the log
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}
