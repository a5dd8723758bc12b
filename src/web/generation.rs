//! Handlers that call the provider: background generation, title polish and
//! magic edits.
//!
//! A workspace runs at most one generation and one polish at a time; an
//! overlapping request is refused with [`HeroshotError::Busy`]. Provider calls
//! run in a spawned task, so the busy flag is cleared even when the browser
//! gives up on the request.

use super::csrf::validate_csrf;
use super::flash::{self, set_flash};
use super::prelude::*;
use crate::cover::{CoverAction, ViewMode};
use crate::gemini::{ApiKey, GenerationRequest};

#[derive(Deserialize)]
pub(crate) struct ActionForm {
    csrf_token: String,
}

#[derive(Deserialize)]
pub(crate) struct MagicForm {
    csrf_token: String,
    command: String,
}

impl AppState {
    /// Marks the workspace as generating and snapshots the request.
    async fn begin_generation(
        &self,
        id: &str,
        prompt: Option<String>,
    ) -> Result<(ApiKey, GenerationRequest), HeroshotError> {
        self.workspaces
            .with_workspace(id, |workspace| {
                let api_key = workspace
                    .api_key
                    .clone()
                    .ok_or(HeroshotError::MissingApiKey)?;
                if workspace.cover.is_generating {
                    return Err(HeroshotError::Busy);
                }
                if let Some(prompt) = prompt {
                    workspace.apply(CoverAction::SetActivePrompt(prompt));
                }
                workspace.apply(CoverAction::SetIsGenerating(true));
                workspace.apply(CoverAction::SetViewMode(ViewMode::Result));
                Ok((api_key, GenerationRequest::from_state(&workspace.cover)))
            })
            .await
    }

    /// Generates a new background, optionally adopting `prompt` first.
    pub(crate) async fn run_generation(
        &self,
        id: &str,
        prompt: Option<String>,
    ) -> Result<(), HeroshotError> {
        let (api_key, request) = self.begin_generation(id, prompt).await?;

        let state = self.clone();
        let id = id.to_string();
        let task = tokio::spawn(async move {
            let result = state.gemini.generate_cover_image(&api_key, &request).await;
            let mut actions = Vec::with_capacity(2);
            let outcome = match result {
                Ok(image) => {
                    actions.push(CoverAction::SetGeneratedImage(Some(image)));
                    Ok(())
                }
                Err(err) => Err(err),
            };
            actions.push(CoverAction::SetIsGenerating(false));
            if let Err(err) = state.workspaces.dispatch(&id, actions).await {
                debug!("Workspace went away during generation: {}", err);
            }
            outcome
        });

        task.await
            .map_err(|err| HeroshotError::InternalServerError(err.to_string()))??;
        Ok(())
    }

    /// Rewrites the title. An empty title is left alone.
    pub(crate) async fn run_polish(&self, id: &str) -> Result<(), HeroshotError> {
        let started = self
            .workspaces
            .with_workspace(id, |workspace| {
                let api_key = workspace
                    .api_key
                    .clone()
                    .ok_or(HeroshotError::MissingApiKey)?;
                if workspace.cover.title.trim().is_empty() {
                    return Ok(None);
                }
                if workspace.cover.is_polishing {
                    return Err(HeroshotError::Busy);
                }
                workspace.apply(CoverAction::SetIsPolishing(true));
                Ok(Some((api_key, workspace.cover.title.clone())))
            })
            .await?;
        let Some((api_key, title)) = started else {
            return Ok(());
        };

        let state = self.clone();
        let id = id.to_string();
        let task = tokio::spawn(async move {
            let result = state.gemini.polish_title(&api_key, &title).await;
            let mut actions = Vec::with_capacity(2);
            let outcome = match result {
                Ok(polished) => {
                    actions.push(CoverAction::SetTitle(polished));
                    Ok(())
                }
                Err(err) => {
                    error!("Title polish failed: {}", err);
                    Err(err)
                }
            };
            actions.push(CoverAction::SetIsPolishing(false));
            if let Err(err) = state.workspaces.dispatch(&id, actions).await {
                debug!("Workspace went away during polish: {}", err);
            }
            outcome
        });

        task.await
            .map_err(|err| HeroshotError::InternalServerError(err.to_string()))??;
        Ok(())
    }

    /// Interprets `command` and applies it. Unrecognised commands do nothing.
    pub(crate) async fn run_magic_edit(&self, id: &str, command: &str) -> Result<(), HeroshotError> {
        let command = command.trim();
        if command.is_empty() {
            return Ok(());
        }
        let (api_key, current_prompt, current_scale) = self
            .workspaces
            .with_workspace(id, |workspace| {
                let api_key = workspace
                    .api_key
                    .clone()
                    .ok_or(HeroshotError::MissingApiKey)?;
                Ok((
                    api_key,
                    workspace.cover.active_prompt.clone(),
                    workspace.cover.text_scale,
                ))
            })
            .await?;

        let intent = self
            .gemini
            .interpret_edit_command(&api_key, command, &current_prompt, current_scale)
            .await;
        info!("Magic edit interpreted as {:?}", intent);
        match intent.regeneration_prompt() {
            Some(prompt) => self.run_generation(id, Some(prompt.to_string())).await,
            None => self.workspaces.dispatch(id, intent.actions()).await,
        }
    }
}

/// Turns the expected failures into a notice on the editor page.
async fn redirect_with_notice(
    session: &Session,
    outcome: Result<(), HeroshotError>,
    failure_flag: u16,
) -> Result<Redirect, HeroshotError> {
    let flag = match outcome {
        Ok(()) => return Ok(Redirect::to("/")),
        Err(HeroshotError::MissingApiKey) => flash::FLASH_MISSING_KEY,
        Err(HeroshotError::Busy) => flash::FLASH_BUSY,
        Err(HeroshotError::Generation(_)) => failure_flag,
        Err(err) => return Err(err),
    };
    set_flash(session, flag).await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn generate_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    let outcome = state.run_generation(&workspace.id, None).await;
    redirect_with_notice(&workspace.session, outcome, flash::FLASH_GENERATION_FAILED).await
}

pub(crate) async fn polish_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<ActionForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    let outcome = state.run_polish(&workspace.id).await;
    redirect_with_notice(&workspace.session, outcome, flash::FLASH_POLISH_FAILED).await
}

pub(crate) async fn magic_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<MagicForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    let outcome = state.run_magic_edit(&workspace.id, &form.command).await;
    redirect_with_notice(&workspace.session, outcome, flash::FLASH_GENERATION_FAILED).await
}
