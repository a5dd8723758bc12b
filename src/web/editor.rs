//! Form handlers that only touch the workspace: no provider calls here.

use axum::extract::Multipart;

use super::csrf::validate_csrf;
use super::flash::{self, set_flash};
use super::prelude::*;
use crate::cover::{AspectRatio, CoverAction, ThemeMode, ToolMode, ViewMode, ViralLayout};
use crate::datauri::normalize_upload;
use crate::export::parse_hex_color;
use crate::gemini::ApiKey;

const MIN_TEXT_SCALE: f32 = 0.5;
const MAX_TEXT_SCALE: f32 = 2.0;

#[derive(Deserialize)]
pub(crate) struct CsrfForm {
    csrf_token: String,
}

#[derive(Deserialize)]
pub(crate) struct KeyForm {
    csrf_token: String,
    api_key: String,
}

#[derive(Deserialize)]
pub(crate) struct ContentForm {
    csrf_token: String,
    title: String,
    subtitle: String,
    footer: String,
}

/// Every field but the token is optional so small forms can post one setting.
#[derive(Deserialize)]
pub(crate) struct SettingsForm {
    csrf_token: String,
    tool_mode: Option<ToolMode>,
    aspect_ratio: Option<AspectRatio>,
    viral_layout: Option<ViralLayout>,
    theme_mode: Option<ThemeMode>,
    text_scale: Option<f32>,
    title_color: Option<String>,
    subtitle_color: Option<String>,
    footer_color: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct PromptForm {
    csrf_token: String,
    active_prompt: String,
}

#[derive(Deserialize)]
pub(crate) struct NewStyleForm {
    csrf_token: String,
    label: String,
    prompt: String,
}

#[derive(Deserialize)]
pub(crate) struct SelectStyleForm {
    csrf_token: String,
    style_id: String,
}

#[derive(Deserialize)]
pub(crate) struct ViewForm {
    csrf_token: String,
    view_mode: ViewMode,
}

/// Textareas submit CRLF; the compositor splits on `\n`.
fn normalize_newlines(value: &str) -> String {
    value.replace("\r\n", "\n")
}

fn normalize_color(value: &str) -> Result<String, HeroshotError> {
    let value = value.trim();
    parse_hex_color(value).ok_or(HeroshotError::BadRequest)?;
    Ok(value.to_ascii_lowercase())
}

pub(crate) async fn set_key_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<KeyForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    let Some(api_key) = ApiKey::new(&form.api_key) else {
        set_flash(&workspace.session, flash::FLASH_MISSING_KEY).await?;
        return Ok(Redirect::to("/"));
    };
    state
        .workspaces
        .with_workspace(&workspace.id, |current| {
            current.api_key = Some(api_key);
            Ok(())
        })
        .await?;
    info!("API key set for a workspace");
    set_flash(&workspace.session, flash::FLASH_KEY_SAVED).await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn forget_key_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    state
        .workspaces
        .with_workspace(&workspace.id, |current| {
            current.api_key = None;
            Ok(())
        })
        .await?;
    set_flash(&workspace.session, flash::FLASH_KEY_FORGOTTEN).await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn content_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<ContentForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    state
        .workspaces
        .dispatch(
            &workspace.id,
            [
                CoverAction::SetTitle(normalize_newlines(&form.title)),
                CoverAction::SetSubtitle(normalize_newlines(&form.subtitle)),
                CoverAction::SetFooter(normalize_newlines(&form.footer)),
            ],
        )
        .await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn settings_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<SettingsForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;

    let mut actions = Vec::new();
    if let Some(tool_mode) = form.tool_mode {
        actions.push(CoverAction::SetToolMode(tool_mode));
    }
    if let Some(aspect_ratio) = form.aspect_ratio {
        actions.push(CoverAction::SetAspectRatio(aspect_ratio));
    }
    if let Some(viral_layout) = form.viral_layout {
        actions.push(CoverAction::SetViralLayout(viral_layout));
    }
    if let Some(theme_mode) = form.theme_mode {
        actions.push(CoverAction::SetThemeMode(theme_mode));
    }
    if let Some(text_scale) = form.text_scale {
        if !(MIN_TEXT_SCALE..=MAX_TEXT_SCALE).contains(&text_scale) {
            return Err(HeroshotError::BadRequest);
        }
        actions.push(CoverAction::SetTextScale(text_scale));
    }
    if let Some(color) = form.title_color.as_deref() {
        actions.push(CoverAction::SetTitleColor(normalize_color(color)?));
    }
    if let Some(color) = form.subtitle_color.as_deref() {
        actions.push(CoverAction::SetSubtitleColor(normalize_color(color)?));
    }
    if let Some(color) = form.footer_color.as_deref() {
        actions.push(CoverAction::SetFooterColor(normalize_color(color)?));
    }

    state.workspaces.dispatch(&workspace.id, actions).await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn prompt_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<PromptForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    state
        .workspaces
        .dispatch(
            &workspace.id,
            [CoverAction::SetActivePrompt(normalize_newlines(
                &form.active_prompt,
            ))],
        )
        .await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn add_style_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<NewStyleForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    let label = form.label.trim();
    let prompt = form.prompt.trim();
    if label.is_empty() || prompt.is_empty() {
        set_flash(&workspace.session, flash::FLASH_STYLE_INCOMPLETE).await?;
        return Ok(Redirect::to("/"));
    }
    state
        .workspaces
        .dispatch(
            &workspace.id,
            [CoverAction::AddStyle {
                label: label.to_string(),
                prompt: normalize_newlines(prompt),
            }],
        )
        .await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn select_style_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<SelectStyleForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    state
        .workspaces
        .dispatch(&workspace.id, [CoverAction::SelectStyle(form.style_id)])
        .await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn delete_style_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Path(style_id): Path<String>,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    state
        .workspaces
        .dispatch(&workspace.id, [CoverAction::DeleteStyle(style_id)])
        .await?;
    Ok(Redirect::to("/"))
}

pub(crate) async fn view_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    Form(form): Form<ViewForm>,
) -> Result<Redirect, HeroshotError> {
    validate_csrf(&workspace.session, &form.csrf_token).await?;
    state
        .workspaces
        .dispatch(&workspace.id, [CoverAction::SetViewMode(form.view_mode)])
        .await?;
    Ok(Redirect::to("/"))
}

/// Subject and reference uploads. An empty file part means "no change";
/// the `clear_*` checkboxes remove an image.
pub(crate) async fn assets_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    mut multipart: Multipart,
) -> Result<Redirect, HeroshotError> {
    let mut csrf_token_value: Option<String> = None;
    let mut subject: Option<Vec<u8>> = None;
    let mut reference: Option<Vec<u8>> = None;
    let mut clear_subject = false;
    let mut clear_reference = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| HeroshotError::InternalServerError(err.to_string()))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "csrf_token" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| HeroshotError::InternalServerError(err.to_string()))?;
                csrf_token_value = Some(value);
            }
            "subject" | "reference" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| HeroshotError::InternalServerError(err.to_string()))?;
                if bytes.is_empty() {
                    continue;
                }
                if field_name == "subject" {
                    subject = Some(bytes.to_vec());
                } else {
                    reference = Some(bytes.to_vec());
                }
            }
            "clear_subject" => clear_subject = true,
            "clear_reference" => clear_reference = true,
            _ => {}
        }
    }

    let csrf_token_value = csrf_token_value.ok_or(HeroshotError::Unauthorized)?;
    validate_csrf(&workspace.session, &csrf_token_value).await?;

    let mut actions = Vec::new();
    if clear_subject {
        actions.push(CoverAction::SetSubjectImage(None));
    }
    if clear_reference {
        actions.push(CoverAction::SetReferenceImage(None));
    }
    for (bytes, is_subject) in [(subject, true), (reference, false)] {
        let Some(bytes) = bytes else {
            continue;
        };
        let data_uri = match normalize_upload(&bytes) {
            Ok(data_uri) => data_uri,
            Err(err) => {
                info!("Rejected upload: {}", err);
                set_flash(&workspace.session, flash::FLASH_UPLOAD_REJECTED).await?;
                return Ok(Redirect::to("/"));
            }
        };
        actions.push(if is_subject {
            CoverAction::SetSubjectImage(Some(data_uri))
        } else {
            CoverAction::SetReferenceImage(Some(data_uri))
        });
    }

    debug!("Applying {} asset changes", actions.len());
    state.workspaces.dispatch(&workspace.id, actions).await?;
    Ok(Redirect::to("/"))
}
