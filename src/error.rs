use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required form field was empty. Raised before any I/O happens.
    #[error("missing required field: {0}")]
    Validation(&'static str),

    /// A form field was filled in with something that is not a day or a date.
    #[error("invalid value for field: {0}")]
    Invalid(&'static str),

    #[error("no active user")]
    NoSession,

    /// Rejection from the auth provider or the data store, or a transport failure.
    #[error("{0}")]
    Remote(String),

    #[error("malformed row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("browser session: {0}")]
    Session(String),

    #[error("template: {0}")]
    Render(#[from] askama::Error),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Remote(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        AppError::Session(err.to_string())
    }
}

/// Only the page plumbing reaches here; schedule failures are shown to the
/// user as notifications instead.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!(err = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Error interno del servidor").into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
