use super::csrf::csrf_token;
use super::flash;
use super::prelude::*;
use crate::cover::{AspectRatio, CoverState, ThemeMode, ToolMode, ViewMode, ViralLayout};
use crate::export::compose_svg;

#[derive(Clone, Debug)]
pub(crate) struct StyleView {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) is_default: bool,
    pub(crate) selected: bool,
}

/// One `<option>` of a fixed menu.
#[derive(Clone, Debug)]
pub(crate) struct ChoiceView {
    pub(crate) value: &'static str,
    pub(crate) label: &'static str,
    pub(crate) selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "key.html")]
pub(crate) struct KeyTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "editor.html")]
pub(crate) struct EditorTemplate {
    csrf_token: String,
    has_flash: bool,
    flash_message: String,
    flash_class: String,

    is_viral: bool,
    is_dark: bool,
    show_result: bool,
    title: String,
    subtitle: String,
    footer: String,
    active_prompt: String,
    styles: Vec<StyleView>,
    aspect_ratios: Vec<ChoiceView>,
    layouts: Vec<ChoiceView>,
    text_scale: String,
    title_color: String,
    subtitle_color: String,
    footer_color: String,

    has_subject: bool,
    has_reference: bool,
    has_generated: bool,
    is_generating: bool,
    is_polishing: bool,
    preview_svg: String,
}

impl EditorTemplate {
    fn new(
        cover: &CoverState,
        image_version: u128,
        csrf_token: String,
        flash: Option<flash::FlashMessage>,
    ) -> Self {
        let (has_flash, flash_message, flash_class) = flash::template_fields(flash);
        let styles = cover
            .styles
            .iter()
            .map(|style| StyleView {
                id: style.id.clone(),
                label: style.label.clone(),
                is_default: style.is_default,
                selected: style.id == cover.selected_style_id,
            })
            .collect();
        let aspect_ratios = AspectRatio::ALL
            .into_iter()
            .map(|ratio| ChoiceView {
                value: ratio.as_str(),
                label: ratio.label(),
                selected: ratio == cover.aspect_ratio,
            })
            .collect();
        let layouts = ViralLayout::ALL
            .into_iter()
            .map(|layout| ChoiceView {
                value: layout.as_str(),
                label: layout.label(),
                selected: layout == cover.viral_layout,
            })
            .collect();
        // the browser fetches the background itself; the version busts stale copies
        let preview_svg = if cover.generated_image.is_some() {
            compose_svg(cover, &format!("/image/generated?v={image_version}"))
        } else {
            String::new()
        };

        Self {
            csrf_token,
            has_flash,
            flash_message,
            flash_class,
            is_viral: cover.tool_mode == ToolMode::ViralCover,
            is_dark: cover.theme_mode == ThemeMode::Dark,
            show_result: cover.view_mode == ViewMode::Result,
            title: cover.title.clone(),
            subtitle: cover.subtitle.clone(),
            footer: cover.footer.clone(),
            active_prompt: cover.active_prompt.clone(),
            styles,
            aspect_ratios,
            layouts,
            text_scale: format!("{:.1}", cover.text_scale),
            title_color: cover.title_color.clone(),
            subtitle_color: cover.subtitle_color.clone(),
            footer_color: cover.footer_color.clone(),
            has_subject: cover.subject_image.is_some(),
            has_reference: cover.reference_image.is_some(),
            has_generated: cover.generated_image.is_some(),
            is_generating: cover.is_generating,
            is_polishing: cover.is_polishing,
            preview_svg,
        }
    }
}

/// handles the / GET: the key page until a key is set, then the editor
pub(crate) async fn root_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
) -> Result<Response, HeroshotError> {
    let csrf_token = csrf_token(&workspace.session).await?;
    let flash = flash::take_flash_message(&workspace.session).await?;
    let (cover, has_key, generated_at) = state
        .workspaces
        .with_workspace(&workspace.id, |current| {
            Ok((
                current.cover.clone(),
                current.api_key.is_some(),
                current.generated_at,
            ))
        })
        .await?;

    if !has_key {
        let (has_flash, flash_message, flash_class) = flash::template_fields(flash);
        return Ok(KeyTemplate {
            csrf_token,
            has_flash,
            flash_message,
            flash_class,
        }
        .into_response());
    }

    let image_version = generated_at
        .and_then(|at| at.duration_since(std::time::UNIX_EPOCH).ok())
        .map(|since| since.as_millis())
        .unwrap_or_default();
    Ok(EditorTemplate::new(&cover, image_version, csrf_token, flash).into_response())
}
