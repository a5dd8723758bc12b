//! Error handling

use axum::response::{IntoResponse, Redirect};
use tracing::info;

use crate::gemini::GenerationError;

/// definitions for the heroshot web application.
#[derive(Debug)]
pub enum HeroshotError {
    /// When you didn't do the right thing
    BadRequest,
    /// Missing or invalid session / CSRF token
    Unauthorized,
    /// No API key has been entered for this session yet
    MissingApiKey,
    /// A generation or polish is already running for this workspace
    Busy,
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
    /// The provider failed or returned nothing usable
    Generation(GenerationError),
}

impl std::fmt::Display for HeroshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::MissingApiKey => write!(f, "no API key configured"),
            Self::Busy => write!(f, "already running"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::InternalServerError(message) => write!(f, "internal error: {message}"),
            Self::Generation(err) => write!(f, "generation failed: {err}"),
        }
    }
}

impl std::error::Error for HeroshotError {}

impl From<std::io::Error> for HeroshotError {
    fn from(err: std::io::Error) -> Self {
        HeroshotError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for HeroshotError {
    fn from(err: axum::http::Error) -> Self {
        HeroshotError::InternalServerError(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for HeroshotError {
    fn from(err: tower_sessions::session::Error) -> Self {
        HeroshotError::InternalServerError(err.to_string())
    }
}

impl From<GenerationError> for HeroshotError {
    fn from(err: GenerationError) -> Self {
        HeroshotError::Generation(err)
    }
}

fn plain_response(status: axum::http::StatusCode, body: &'static str) -> axum::response::Response {
    let mut response = axum::response::Response::new(axum::body::Body::from(body));
    *response.status_mut() = status;
    response
}

impl IntoResponse for HeroshotError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HeroshotError::MissingApiKey => Redirect::to("/").into_response(),
            HeroshotError::Busy => {
                info!("Rejected overlapping request");
                plain_response(axum::http::StatusCode::CONFLICT, "Already running")
            }
            HeroshotError::BadRequest => {
                info!("Bad request received");
                plain_response(axum::http::StatusCode::BAD_REQUEST, "Bad Request")
            }
            HeroshotError::Unauthorized => {
                info!("Unauthorized request received");
                plain_response(
                    axum::http::StatusCode::UNAUTHORIZED,
                    "Unauthorized: invalid or missing session.",
                )
            }
            HeroshotError::NotFound(url) => {
                tracing::error!("404 {url}");
                plain_response(axum::http::StatusCode::NOT_FOUND, "Not Found")
            }
            HeroshotError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                plain_response(
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                )
            }
            HeroshotError::Generation(err) => {
                tracing::error!("Generation error: {}", err);
                plain_response(axum::http::StatusCode::BAD_GATEWAY, "Generation failed")
            }
        }
    }
}
