use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shrinkray_core::ShortenerError;
use tracing::{debug, error};

use crate::model::ApiResponse;

pub type Result<T> = std::result::Result<T, AppError>;

pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method is not allowed";
pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const INVALID_URL_MESSAGE: &str = "Invalid URL";

#[derive(Debug)]
pub enum AppError {
    Shortener(ShortenerError),
    MethodNotAllowed,
    RouteNotFound,
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        AppError::Shortener(value)
    }
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                METHOD_NOT_ALLOWED_MESSAGE.to_string(),
            ),
            AppError::RouteNotFound | AppError::Shortener(ShortenerError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE.to_string())
            }
            AppError::Shortener(ShortenerError::InvalidInput(_)) => {
                (StatusCode::BAD_REQUEST, INVALID_URL_MESSAGE.to_string())
            }
            AppError::Shortener(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        match &self {
            AppError::Shortener(err) if status.is_server_error() => {
                error!(error = %err, "request failed");
            }
            AppError::Shortener(err) => debug!(error = %err, "request rejected"),
            _ => {}
        }

        (status, Json(ApiResponse::new(status.as_u16(), message))).into_response()
    }
}
