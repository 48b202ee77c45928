use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Failures of the web layer that the visitor cannot fix by editing a form.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_as_500_without_details() {
        let response = AppError::Auth(AuthError::UserNotFound(3)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
