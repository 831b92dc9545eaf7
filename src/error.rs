// Crate-wide error type and its conversion into HTTP responses.
// Handlers return Result<_, AppError>; the IntoResponse impl is the
// error boundary: it logs and falls back to a static page without
// exposing internal detail.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
    #[error("not found")]
    NotFound,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate;

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate;

// Renders the not-found page; shared with the router fallback.
pub fn not_found_response() -> Response {
    match (NotFoundTemplate {}).render() {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Failed to render not-found template: {}", e);
            (StatusCode::NOT_FOUND, "Page not found").into_response()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(e) => {
                // Log the detailed error; the client only sees the fallback page
                tracing::error!("Internal server error: {:?}", e);
                match (ErrorTemplate {}).render() {
                    Ok(html) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
                    }
                    Err(render_err) => {
                        tracing::error!("Failed to render error template: {}", render_err);
                        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
                            .into_response()
                    }
                }
            }
            AppError::NotFound => not_found_response(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
