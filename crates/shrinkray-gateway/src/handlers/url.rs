use crate::error::{AppError, Result};
use crate::model::ApiResponse;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use shrinkray_core::ShortenerError;
use tracing::debug;

/// Shortens the URL sent as the raw request body.
///
/// Answers `201` when a token was issued and `200` when the URL already had
/// one; the token is the `message` of the JSON body.
pub async fn create_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<ApiResponse>)> {
    let full_url = std::str::from_utf8(&body).map_err(|e| {
        ShortenerError::InvalidInput(format!("request body is not valid UTF-8: {e}"))
    })?;
    debug!(%full_url, "create short url");

    let shortened = state.shortener().shorten(full_url).await?;
    let status = if shortened.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(ApiResponse::new(status.as_u16(), shortened.token.into_string())),
    ))
}

/// Redirects to the URL behind `token` with `302 Found`.
pub async fn redirect_handler(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response> {
    debug!(%token, "resolve token");

    let record = state.shortener().resolve(&token).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, record.full_url)]).into_response())
}

pub async fn method_not_allowed_handler() -> AppError {
    AppError::MethodNotAllowed
}

pub async fn not_found_handler() -> AppError {
    AppError::RouteNotFound
}
