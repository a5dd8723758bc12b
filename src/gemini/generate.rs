use std::borrow::Cow;

use tracing::{error, info};

use super::{
    ApiKey, Content, GenerateContentRequest, GeminiClient, GenerationConfig, GenerationError,
    ImageConfig, InlineData, Part,
};
use crate::constants::{NEGATIVE_SPACE_BOTTOM, NEGATIVE_SPACE_TOP, SPLIT_TEXT_COLUMN};
use crate::cover::{AspectRatio, CoverState, ThemeMode, ToolMode, ViralLayout};
use crate::datauri::{DataUri, png_from_base64};

/// Everything a background generation needs, detached from the live state so
/// it can outlive the lock it was read under.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationRequest {
    /// prompt text describing the look
    pub active_prompt: String,
    /// output ratio
    pub aspect_ratio: AspectRatio,
    /// product photo data URI
    pub subject_image: Option<String>,
    /// style reference data URI
    pub reference_image: Option<String>,
    /// product shot or cover
    pub tool_mode: ToolMode,
    /// cover composition
    pub viral_layout: ViralLayout,
    /// product shot background
    pub theme_mode: ThemeMode,
}

impl GenerationRequest {
    /// Snapshot of the fields generation reads.
    pub fn from_state(state: &CoverState) -> Self {
        Self {
            active_prompt: state.active_prompt.clone(),
            aspect_ratio: state.aspect_ratio,
            subject_image: state.subject_image.clone(),
            reference_image: state.reference_image.clone(),
            tool_mode: state.tool_mode,
            viral_layout: state.viral_layout,
            theme_mode: state.theme_mode,
        }
    }

    /// Same request with a different prompt, used by magic edits.
    pub fn with_prompt(self, active_prompt: &str) -> Self {
        Self {
            active_prompt: active_prompt.to_string(),
            ..self
        }
    }
}

fn percent(fraction: f32) -> u32 {
    (fraction * 100.0).round() as u32
}

fn composition_rule(request: &GenerationRequest) -> String {
    let layout = match request.tool_mode {
        ToolMode::ProductGen => ViralLayout::Classic,
        ToolMode::ViralCover => request.viral_layout,
    };
    match layout {
        ViralLayout::Classic => format!(
            "LEAVE EMPTY SPACE: The top {}% and bottom {}% of the image MUST be relatively empty (negative space) or have very low detail. This is where text will be overlaid.",
            percent(NEGATIVE_SPACE_TOP),
            percent(NEGATIVE_SPACE_BOTTOM)
        ),
        ViralLayout::Split => format!(
            "SPLIT COMPOSITION: Place the subject in the left part of the frame. The right {}% of the image MUST be clean, low-detail negative space reserved for a column of text.",
            percent(SPLIT_TEXT_COLUMN)
        ),
        ViralLayout::Diagonal => "DIAGONAL COMPOSITION: Arrange the scene along a dynamic diagonal. Keep a band running from the top-left corner to the bottom-right corner low in detail so angled text stays readable.".to_string(),
        ViralLayout::BigType => "BIG TYPE COMPOSITION: Keep the whole frame low-contrast and evenly lit with soft, muted detail, so oversized headline type can sit on top of any area.".to_string(),
    }
}

/// Turns the active prompt into the full instruction sent with the images.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = String::from(
        "Create a high-quality, 8k resolution product advertising background.\n\nVISUAL DESCRIPTION:\n",
    );
    prompt.push_str(request.active_prompt.trim());
    prompt.push_str("\n\n");

    if request.tool_mode == ToolMode::ProductGen {
        prompt.push_str("BACKGROUND COLOR:\n");
        prompt.push_str(match request.theme_mode {
            ThemeMode::Dark => "STRICTLY use a BLACK / Dark background.",
            ThemeMode::Light => "STRICTLY use a WHITE / Light high-key background.",
        });
        prompt.push_str("\n\n");
    }

    if request.subject_image.is_some() {
        prompt.push_str(
            "IMPORTANT: Integrate the provided subject image into this scene naturally as the main hero product.\n\n",
        );
    }

    prompt.push_str("COMPOSITION RULES:\n1. ");
    prompt.push_str(&composition_rule(request));
    prompt.push_str(
        "\n2. AESTHETIC: Photorealistic, commercial photography, high-end studio lighting.\n3. NO TEXT: Do not generate any text inside the image itself.",
    );
    prompt
}

/// Inline part for an attached image. Accepts a data URI or bare base64.
fn inline_part<'a>(image: &'a str, fallback_mime: &'a str) -> Part<'a> {
    let inline_data = match DataUri::parse(image) {
        Ok(uri) => InlineData {
            mime_type: uri.mime_type,
            data: uri.data,
        },
        Err(_) => InlineData {
            mime_type: fallback_mime,
            data: image,
        },
    };
    Part::Inline { inline_data }
}

fn build_parts<'a>(request: &'a GenerationRequest, prompt: &'a str) -> Vec<Part<'a>> {
    let mut parts = Vec::with_capacity(5);
    if let Some(reference) = request.reference_image.as_deref() {
        parts.push(inline_part(reference, "image/jpeg"));
        parts.push(Part::text(
            "Follow the visual style, lighting, and color palette of this reference image.",
        ));
    }
    if let Some(subject) = request.subject_image.as_deref() {
        parts.push(inline_part(subject, "image/png"));
        parts.push(Part::text(
            "Use this specific object/product in the generation. Keep its identity and details accurate.",
        ));
    }
    parts.push(Part::text(Cow::Borrowed(prompt)));
    parts
}

impl GeminiClient {
    /// Paints a background. One attempt; returns a PNG data URI.
    pub async fn generate_cover_image(
        &self,
        api_key: &ApiKey,
        request: &GenerationRequest,
    ) -> Result<String, GenerationError> {
        let prompt = build_prompt(request);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: build_parts(request, &prompt),
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT", "IMAGE"]),
                image_config: Some(ImageConfig {
                    aspect_ratio: request.aspect_ratio.as_str(),
                }),
                ..Default::default()
            }),
        };

        let response = self
            .generate_content(api_key, &self.config.image_model, &body)
            .await
            .inspect_err(|err| error!("Image generation error: {}", err))?;

        match response.first_inline_image() {
            Some(data) => {
                info!("Generated {} background", request.aspect_ratio);
                Ok(png_from_base64(data))
            }
            None => {
                error!("Image generation returned no image");
                Err(GenerationError::NoImage)
            }
        }
    }
}
