//! Custom error types for the control service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{session::SessionError, verifier::VerifyError};

/// Errors raised while handling a front-controller request
#[derive(Error, Debug)]
pub enum ControlError {
    /// Path does not follow the `.../<action>.do` convention
    #[error("Malformed action path: {0}")]
    MalformedActionPath(String),

    /// Credential lookup could not be performed
    #[error("Credential lookup unavailable: {0}")]
    DependencyUnavailable(#[from] VerifyError),

    /// Session backend failed
    #[error("Session store error: {0}")]
    SessionStore(#[from] SessionError),

    /// Selected view could not be rendered
    #[error("View rendering failed: {0}")]
    View(#[from] minijinja::Error),
}

impl ControlError {
    pub fn status(&self) -> StatusCode {
        match self {
            ControlError::MalformedActionPath(_) => StatusCode::BAD_REQUEST,
            ControlError::DependencyUnavailable(_) | ControlError::SessionStore(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ControlError::View(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ControlError::MalformedActionPath(path) => format!("Malformed action path: {path}"),
            ControlError::DependencyUnavailable(_) => "Credential lookup unavailable".to_string(),
            ControlError::SessionStore(_) => "Session store unavailable".to_string(),
            ControlError::View(_) => "Internal server error".to_string(),
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for control results
pub type ControlResult<T> = Result<T, ControlError>;
