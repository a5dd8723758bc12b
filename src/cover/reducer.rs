use chrono::Utc;

use super::styles::{fallback_style, next_style_id};
use super::{AspectRatio, CoverState, StyleOption, ThemeMode, ToolMode, ViewMode, ViralLayout};

/// Every mutation the editor knows about.
#[derive(Clone, Debug, PartialEq)]
pub enum CoverAction {
    /// Bring the editor or the preview to the front
    SetViewMode(ViewMode),
    /// Switch tools
    SetToolMode(ToolMode),
    /// Replace the title
    SetTitle(String),
    /// Replace the subtitle
    SetSubtitle(String),
    /// Replace the footer
    SetFooter(String),
    /// Change the output ratio
    SetAspectRatio(AspectRatio),
    /// Change the cover layout
    SetViralLayout(ViralLayout),
    /// Change the product background theme
    SetThemeMode(ThemeMode),
    /// Select a style by id and adopt its prompt; unknown ids are ignored
    SelectStyle(String),
    /// Append a user style and select it
    AddStyle {
        /// picker label
        label: String,
        /// stored prompt
        prompt: String,
    },
    /// Remove a style by id
    DeleteStyle(String),
    /// Hand-edit the prompt without touching any preset
    SetActivePrompt(String),
    /// Generation started/finished
    SetIsGenerating(bool),
    /// Title polish started/finished
    SetIsPolishing(bool),
    /// Store (or clear) the generated background
    SetGeneratedImage(Option<String>),
    /// Store (or clear) the subject photo
    SetSubjectImage(Option<String>),
    /// Store (or clear) the reference photo
    SetReferenceImage(Option<String>),
    /// Scale every text layer
    SetTextScale(f32),
    /// Title colour
    SetTitleColor(String),
    /// Subtitle colour
    SetSubtitleColor(String),
    /// Footer text colour
    SetFooterColor(String),
}

/// Applies `action` to `state`. Never fails: payloads that make no sense for
/// the current catalog leave the fields they would have touched unchanged.
pub fn reduce(state: CoverState, action: CoverAction) -> CoverState {
    match action {
        CoverAction::SetViewMode(view_mode) => CoverState { view_mode, ..state },
        CoverAction::SetToolMode(tool_mode) => CoverState { tool_mode, ..state },
        CoverAction::SetTitle(title) => CoverState { title, ..state },
        CoverAction::SetSubtitle(subtitle) => CoverState { subtitle, ..state },
        CoverAction::SetFooter(footer) => CoverState { footer, ..state },
        CoverAction::SetAspectRatio(aspect_ratio) => CoverState {
            aspect_ratio,
            ..state
        },
        CoverAction::SetViralLayout(viral_layout) => CoverState {
            viral_layout,
            ..state
        },
        CoverAction::SetThemeMode(theme_mode) => CoverState { theme_mode, ..state },
        CoverAction::SelectStyle(id) => select_style(state, &id),
        CoverAction::AddStyle { label, prompt } => add_style(state, label, prompt),
        CoverAction::DeleteStyle(id) => delete_style(state, &id),
        CoverAction::SetActivePrompt(active_prompt) => CoverState {
            active_prompt,
            ..state
        },
        CoverAction::SetIsGenerating(is_generating) => CoverState {
            is_generating,
            ..state
        },
        CoverAction::SetIsPolishing(is_polishing) => CoverState {
            is_polishing,
            ..state
        },
        CoverAction::SetGeneratedImage(generated_image) => CoverState {
            generated_image,
            ..state
        },
        CoverAction::SetSubjectImage(subject_image) => CoverState {
            subject_image,
            ..state
        },
        CoverAction::SetReferenceImage(reference_image) => CoverState {
            reference_image,
            ..state
        },
        CoverAction::SetTextScale(text_scale) => CoverState { text_scale, ..state },
        CoverAction::SetTitleColor(title_color) => CoverState {
            title_color,
            ..state
        },
        CoverAction::SetSubtitleColor(subtitle_color) => CoverState {
            subtitle_color,
            ..state
        },
        CoverAction::SetFooterColor(footer_color) => CoverState {
            footer_color,
            ..state
        },
    }
}

fn select_style(state: CoverState, id: &str) -> CoverState {
    let Some(prompt) = state.style(id).map(|style| style.prompt.clone()) else {
        return state;
    };
    CoverState {
        selected_style_id: id.to_string(),
        active_prompt: prompt,
        ..state
    }
}

fn add_style(mut state: CoverState, label: String, prompt: String) -> CoverState {
    let id = next_style_id(&state.styles, Utc::now().timestamp_millis());
    state.styles.push(StyleOption {
        id: id.clone(),
        label,
        prompt: prompt.clone(),
        is_default: false,
    });
    CoverState {
        selected_style_id: id,
        active_prompt: prompt,
        ..state
    }
}

fn delete_style(mut state: CoverState, id: &str) -> CoverState {
    state.styles.retain(|style| style.id != id);
    if state.styles.is_empty() {
        state.styles.push(fallback_style());
    }

    let selection_gone =
        state.selected_style_id == id || state.style(&state.selected_style_id).is_none();
    if selection_gone && let Some(first) = state.styles.first() {
        state.selected_style_id = first.id.clone();
        state.active_prompt = first.prompt.clone();
    }
    state
}
