pub(crate) use crate::error::HeroshotError;
pub(crate) use crate::web::AppState;
pub(crate) use crate::web::middleware::CurrentWorkspace;
pub(crate) use askama::Template;
pub(crate) use askama_web::WebTemplate;
pub(crate) use axum::extract::{Form, Path, State};
pub(crate) use axum::response::{IntoResponse, Redirect, Response};
pub(crate) use serde::Deserialize;
pub(crate) use tower_sessions::Session;
pub(crate) use tracing::{debug, error, info};
