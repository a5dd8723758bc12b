use serde_json::Value;
use tracing::{debug, error};

use super::{ApiKey, Content, GenerateContentRequest, GeminiClient, GenerationConfig, Part};
use crate::cover::CoverAction;

/// What the language model made of a magic edit.
#[derive(Clone, Debug, PartialEq)]
pub enum EditIntent {
    /// Presentation-only change
    UpdateStyle {
        /// new absolute text scale
        text_scale: Option<f32>,
        /// new title colour
        text_color: Option<String>,
    },
    /// Content change: paint a new background from this prompt
    Regenerate {
        /// rewritten full prompt
        new_prompt: String,
    },
    /// Unrecognised, malformed, or failed; callers ignore it
    None,
}

impl EditIntent {
    /// Actions to dispatch straight away.
    pub fn actions(&self) -> Vec<CoverAction> {
        match self {
            EditIntent::UpdateStyle {
                text_scale,
                text_color,
            } => {
                let mut actions = Vec::new();
                if let Some(scale) = text_scale {
                    actions.push(CoverAction::SetTextScale(*scale));
                }
                if let Some(color) = text_color {
                    actions.push(CoverAction::SetTitleColor(color.clone()));
                }
                actions
            }
            EditIntent::Regenerate { new_prompt } => {
                vec![CoverAction::SetActivePrompt(new_prompt.clone())]
            }
            EditIntent::None => Vec::new(),
        }
    }

    /// Prompt to regenerate with, if the edit asks for a new background.
    pub fn regeneration_prompt(&self) -> Option<&str> {
        match self {
            EditIntent::Regenerate { new_prompt } => Some(new_prompt.as_str()),
            _ => None,
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Decodes `{action, updates?: {textScale?, textColor?, newPrompt?}}` one
/// field at a time. Anything unusable degrades to [`EditIntent::None`].
pub fn decode_edit_result(text: &str) -> EditIntent {
    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(value) => value,
        Err(err) => {
            debug!("Interpreter returned invalid JSON: {}", err);
            return EditIntent::None;
        }
    };
    let updates = value.get("updates");
    let field = |name: &str| updates.and_then(|updates| updates.get(name));

    match value.get("action").and_then(Value::as_str) {
        Some("UPDATE_STYLE") => {
            let text_scale = field("textScale")
                .and_then(Value::as_f64)
                .map(|scale| scale as f32)
                .filter(|scale| scale.is_finite() && *scale > 0.0);
            let text_color = non_empty_str(field("textColor"));
            if text_scale.is_none() && text_color.is_none() {
                return EditIntent::None;
            }
            EditIntent::UpdateStyle {
                text_scale,
                text_color,
            }
        }
        Some("REGENERATE") => match non_empty_str(field("newPrompt")) {
            Some(new_prompt) => EditIntent::Regenerate { new_prompt },
            None => EditIntent::None,
        },
        _ => EditIntent::None,
    }
}

fn interpreter_prompt(command: &str, current_prompt: &str, current_scale: f32) -> String {
    format!(
        r##"You are an AI assistant for a graphic design tool. The user wants to change the current design.

Current State:
- Image Prompt: "{current_prompt}"
- Text Scale: {current_scale}

User Command: "{command}"

Determine if the user wants to:
1. MODIFY TEXT STYLE (Size, Color): Return action 'UPDATE_STYLE'.
   - For size: return 'textScale' (e.g., "bigger" -> current * 1.2, "smaller" -> current * 0.8).
   - For color: return 'textColor' as a HEX string (e.g., "#ff0000").
2. MODIFY IMAGE CONTENT (Background, Objects, Vibe): Return action 'REGENERATE'.
   - Return 'newPrompt': A rewritten full prompt incorporating the user's change.

Return strictly JSON.
Example 1: {{"action": "UPDATE_STYLE", "updates": {{"textScale": 1.5}}}}
Example 2: {{"action": "REGENERATE", "updates": {{"newPrompt": "white minimalist background with a coffee cup"}}}}"##
    )
}

impl GeminiClient {
    /// Classifies a free-text instruction. Never fails: transport and parse
    /// problems are logged and come back as [`EditIntent::None`].
    pub async fn interpret_edit_command(
        &self,
        api_key: &ApiKey,
        command: &str,
        current_prompt: &str,
        current_scale: f32,
    ) -> EditIntent {
        let prompt = interpreter_prompt(command, current_prompt, current_scale);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt.as_str())],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json"),
                ..Default::default()
            }),
        };

        match self
            .generate_content(api_key, &self.config.text_model, &body)
            .await
        {
            Ok(response) => decode_edit_result(&response.text()),
            Err(err) => {
                error!("Interpreter failed: {}", err);
                EditIntent::None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::mock;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn decodes_style_update() {
        let intent = decode_edit_result(r#"{"action":"UPDATE_STYLE","updates":{"textScale":1.5}}"#);
        assert_eq!(
            intent,
            EditIntent::UpdateStyle {
                text_scale: Some(1.5),
                text_color: None
            }
        );
        assert_eq!(intent.actions(), vec![CoverAction::SetTextScale(1.5)]);
        assert!(intent.regeneration_prompt().is_none());
    }

    #[test]
    fn decodes_regenerate() {
        let intent = decode_edit_result(
            r#"{"action":"REGENERATE","updates":{"newPrompt":"snowy mountains, product on a rock"}}"#,
        );
        assert_eq!(
            intent.regeneration_prompt(),
            Some("snowy mountains, product on a rock")
        );
        assert_eq!(
            intent.actions(),
            vec![CoverAction::SetActivePrompt(
                "snowy mountains, product on a rock".to_string()
            )]
        );
    }

    #[test]
    fn wrong_typed_fields_are_dropped() {
        let intent = decode_edit_result(
            r##"{"action":"UPDATE_STYLE","updates":{"textScale":"huge","textColor":"#ff0000"}}"##,
        );
        assert_eq!(
            intent,
            EditIntent::UpdateStyle {
                text_scale: None,
                text_color: Some("#ff0000".to_string())
            }
        );
        let intent =
            decode_edit_result(r#"{"action":"UPDATE_STYLE","updates":{"textScale":-2}}"#);
        assert_eq!(intent, EditIntent::None);
        // Fits in an f64 but not in an f32.
        let intent =
            decode_edit_result(r#"{"action":"UPDATE_STYLE","updates":{"textScale":1e39}}"#);
        assert_eq!(intent, EditIntent::None);
    }

    #[test]
    fn malformed_or_unknown_is_none() {
        assert_eq!(decode_edit_result("not json at all"), EditIntent::None);
        assert_eq!(decode_edit_result(""), EditIntent::None);
        assert_eq!(decode_edit_result(r#"{"action":"DANCE"}"#), EditIntent::None);
        assert_eq!(decode_edit_result(r#"{"action":"REGENERATE"}"#), EditIntent::None);
        assert_eq!(decode_edit_result("[1,2,3]"), EditIntent::None);
        assert!(EditIntent::None.actions().is_empty());
    }

    #[tokio::test]
    async fn asks_for_json_and_embeds_state() {
        let provider = mock::spawn(
            (StatusCode::OK, json!({})),
            (
                StatusCode::OK,
                mock::text_reply(r#"{"action":"UPDATE_STYLE","updates":{"textScale":1.2}}"#),
            ),
        )
        .await;
        let client = GeminiClient::new(provider.config.clone());
        let key = ApiKey::new("secret").unwrap();
        let intent = client
            .interpret_edit_command(&key, "make the text bigger", "white desk", 1.0)
            .await;
        assert_eq!(
            intent,
            EditIntent::UpdateStyle {
                text_scale: Some(1.2),
                text_color: None
            }
        );

        let captured = provider.captured();
        assert_eq!(captured[0].path, "/v1beta/models/mock-text:generateContent");
        assert_eq!(
            captured[0].body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let sent = captured[0].body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap();
        assert!(sent.contains("make the text bigger"));
        assert!(sent.contains("white desk"));
    }

    #[tokio::test]
    async fn provider_failure_is_none() {
        let provider = mock::spawn(
            (StatusCode::OK, json!({})),
            (StatusCode::UNAUTHORIZED, json!({"error": "bad key"})),
        )
        .await;
        let client = GeminiClient::new(provider.config.clone());
        let key = ApiKey::new("secret").unwrap();
        let intent = client
            .interpret_edit_command(&key, "bigger", "prompt", 1.0)
            .await;
        assert_eq!(intent, EditIntent::None);
    }
}
