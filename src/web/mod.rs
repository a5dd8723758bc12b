//! The editor as a small server-rendered web app.

use std::num::NonZeroU16;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::{error, info};

use crate::constants::{MAX_UPLOAD_BYTES, SESSION_IDLE_HOURS};
use crate::export::Exporter;
use crate::gemini::GeminiClient;

mod csrf;
mod editor;
mod flash;
mod generation;
mod images;
mod middleware;
mod prelude;
mod views;
mod workspace;

use workspace::Workspaces;

#[derive(Clone, Debug)]
pub(crate) struct AppState {
    workspaces: Workspaces,
    gemini: GeminiClient,
    exporter: Exporter,
}

impl AppState {
    fn new(gemini: GeminiClient, exporter: Exporter) -> Self {
        Self {
            workspaces: Workspaces::default(),
            gemini,
            exporter,
        }
    }
}

fn create_router() -> Router<AppState> {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            SESSION_IDLE_HOURS,
        )));
    let static_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

    Router::new()
        .route("/", get(views::root_handler))
        .route("/key", post(editor::set_key_handler))
        .route("/key/forget", post(editor::forget_key_handler))
        .route("/content", post(editor::content_handler))
        .route("/settings", post(editor::settings_handler))
        .route("/prompt", post(editor::prompt_handler))
        .route("/styles", post(editor::add_style_handler))
        .route("/styles/select", post(editor::select_style_handler))
        .route("/styles/{id}/delete", post(editor::delete_style_handler))
        .route(
            "/assets",
            post(editor::assets_handler).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/view", post(editor::view_handler))
        .route("/generate", post(generation::generate_handler))
        .route("/polish", post(generation::polish_handler))
        .route("/magic", post(generation::magic_handler))
        .route("/image/generated", get(images::generated_image_handler))
        .route("/export", get(images::export_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

/// Serves the editor until the process is stopped.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    gemini: GeminiClient,
    exporter: Exporter,
) -> Result<(), anyhow::Error> {
    let app = create_router().with_state(AppState::new(gemini, exporter));

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
