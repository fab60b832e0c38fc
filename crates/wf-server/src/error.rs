use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Map, Value};
use thiserror::Error;

use wf_sdk::SdkError;
use wf_store::StoreError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("API key required")]
    AuthRequired,

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::InvalidApiKey => "INVALID_API_KEY",
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::Sdk(e) => e.code(),
            _ => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code() {
            "INVALID_INPUT" | "INVALID_REF" | "MALFORMED_POINTER" => StatusCode::BAD_REQUEST,
            "AUTH_REQUIRED" | "INVALID_API_KEY" => StatusCode::UNAUTHORIZED,
            "WORLD_NOT_FOUND" | "BRANCH_NOT_FOUND" | "COMMIT_NOT_FOUND" | "UNIT_NOT_FOUND" => {
                StatusCode::NOT_FOUND
            }
            "HEAD_CHANGED" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The wire payload for this error.
    pub fn body(&self) -> Value {
        let mut error = Map::new();
        error.insert("code".into(), json!(self.code()));
        error.insert("message".into(), json!(self.to_string()));
        if let Self::Sdk(e) = self {
            if let Some(details) = e.details() {
                error.insert("details".into(), details);
            }
        }
        json!({ "error": error })
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
