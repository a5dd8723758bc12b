//! In-memory editor state, one entry per browser session.
//!
//! Nothing here is persisted: the credential and every image live only as
//! long as the process and the session do.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::constants::SESSION_IDLE_HOURS;
use crate::cover::{CoverAction, CoverState, reduce};
use crate::error::HeroshotError;
use crate::gemini::ApiKey;

#[derive(Debug)]
pub(crate) struct Workspace {
    pub(crate) cover: CoverState,
    pub(crate) api_key: Option<ApiKey>,
    /// when the current background arrived, for cache validators
    pub(crate) generated_at: Option<SystemTime>,
    last_seen: Instant,
}

impl Workspace {
    fn new() -> Self {
        Self {
            cover: CoverState::default(),
            api_key: None,
            generated_at: None,
            last_seen: Instant::now(),
        }
    }

    /// Runs `action` through the reducer.
    pub(crate) fn apply(&mut self, action: CoverAction) {
        match &action {
            CoverAction::SetGeneratedImage(Some(_)) => self.generated_at = Some(SystemTime::now()),
            CoverAction::SetGeneratedImage(None) => self.generated_at = None,
            _ => {}
        }
        let current = std::mem::take(&mut self.cover);
        self.cover = reduce(current, action);
    }

    fn is_busy(&self) -> bool {
        self.cover.is_generating || self.cover.is_polishing
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Workspaces {
    inner: Arc<RwLock<HashMap<String, Workspace>>>,
}

impl Workspaces {
    /// Creates the workspace on first sight and drops idle ones.
    pub(crate) async fn touch(&self, id: &str) {
        let idle_limit = Duration::from_secs(SESSION_IDLE_HOURS.unsigned_abs() * 3600);
        let mut workspaces = self.inner.write().await;
        if let Some(workspace) = workspaces.get_mut(id) {
            workspace.last_seen = Instant::now();
            return;
        }

        let before = workspaces.len();
        workspaces.retain(|_, workspace| {
            workspace.is_busy() || workspace.last_seen.elapsed() < idle_limit
        });
        if workspaces.len() < before {
            info!("Dropped {} idle workspaces", before - workspaces.len());
        }
        workspaces.insert(id.to_string(), Workspace::new());
        debug!("Created workspace, {} live", workspaces.len());
    }

    /// Runs `f` against the workspace under the write lock.
    pub(crate) async fn with_workspace<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Workspace) -> Result<T, HeroshotError>,
    ) -> Result<T, HeroshotError> {
        let mut workspaces = self.inner.write().await;
        let workspace = workspaces
            .get_mut(id)
            .ok_or_else(|| HeroshotError::NotFound(format!("workspace {id}")))?;
        f(workspace)
    }

    /// Applies `actions` in order, atomically.
    pub(crate) async fn dispatch(
        &self,
        id: &str,
        actions: impl IntoIterator<Item = CoverAction>,
    ) -> Result<(), HeroshotError> {
        self.with_workspace(id, |workspace| {
            for action in actions {
                workspace.apply(action);
            }
            Ok(())
        })
        .await
    }

    pub(crate) async fn cover(&self, id: &str) -> Result<CoverState, HeroshotError> {
        self.with_workspace(id, |workspace| Ok(workspace.cover.clone()))
            .await
    }

    #[cfg(test)]
    pub(crate) async fn only(&self) -> Option<(CoverState, bool)> {
        let workspaces = self.inner.read().await;
        workspaces
            .values()
            .next()
            .map(|workspace| (workspace.cover.clone(), workspace.api_key.is_some()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dispatch_requires_a_known_workspace() {
        let workspaces = Workspaces::default();
        let err = workspaces
            .dispatch("missing", [CoverAction::SetTitle("x".to_string())])
            .await
            .expect_err("unknown id");
        assert!(matches!(err, HeroshotError::NotFound(_)));

        workspaces.touch("abc").await;
        workspaces
            .dispatch(
                "abc",
                [
                    CoverAction::SetTitle("x".to_string()),
                    CoverAction::SetGeneratedImage(Some("data:image/png;base64,AA==".to_string())),
                ],
            )
            .await
            .expect("dispatch");
        let generated_at = workspaces
            .with_workspace("abc", |workspace| Ok(workspace.generated_at))
            .await
            .expect("read");
        assert!(generated_at.is_some());
        assert_eq!(workspaces.cover("abc").await.expect("cover").title, "x");
    }

    #[tokio::test]
    async fn touching_twice_keeps_state() {
        let workspaces = Workspaces::default();
        workspaces.touch("abc").await;
        workspaces
            .dispatch("abc", [CoverAction::SetFooter("kept".to_string())])
            .await
            .expect("dispatch");
        workspaces.touch("abc").await;
        assert_eq!(workspaces.cover("abc").await.expect("cover").footer, "kept");
    }
}
