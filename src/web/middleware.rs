use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use tower_sessions::Session;

use super::AppState;
use super::csrf::generate_token;

const WORKSPACE_ID_KEY: &str = "workspace_id";

/// The caller's workspace id, created on first visit, plus their session.
#[derive(Debug, Clone)]
pub(crate) struct CurrentWorkspace {
    pub(crate) id: String,
    pub(crate) session: Session,
}

impl FromRequestParts<AppState> for CurrentWorkspace {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        let existing = session
            .get::<String>(WORKSPACE_ID_KEY)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Session store unavailable"))?;
        let id = match existing {
            Some(id) => id,
            None => {
                let id = generate_token();
                session
                    .insert(WORKSPACE_ID_KEY, id.clone())
                    .await
                    .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Session store unavailable"))?;
                id
            }
        };
        state.workspaces.touch(&id).await;
        Ok(Self { id, session })
    }
}
