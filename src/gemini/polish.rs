use tracing::info;

use super::{ApiKey, Content, GenerateContentRequest, GeminiClient, GenerationError, Part};

fn polish_prompt(title: &str) -> String {
    format!(
        "You are a senior copywriter for e-commerce product posters. Rewrite the following title so it is punchier and more eye-catching. Keep the same language, keep it short, and keep any line breaks. Return only the rewritten title, with no quotes or explanation.\n\nTitle:\n{title}"
    )
}

impl GeminiClient {
    /// Punchier rewrite of a title, trimmed.
    pub async fn polish_title(
        &self,
        api_key: &ApiKey,
        title: &str,
    ) -> Result<String, GenerationError> {
        let prompt = polish_prompt(title);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part::text(prompt.as_str())],
            }],
            generation_config: None,
        };
        let response = self
            .generate_content(api_key, &self.config.text_model, &body)
            .await?;
        let polished = response.text().trim().to_string();
        if polished.is_empty() {
            return Err(GenerationError::EmptyText);
        }
        info!("Polished title ({} chars)", polished.chars().count());
        Ok(polished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::mock;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn trims_the_answer() {
        let provider = mock::spawn(
            (StatusCode::OK, json!({})),
            (StatusCode::OK, mock::text_reply("  静享\n极致降噪 \n")),
        )
        .await;
        let client = GeminiClient::new(provider.config.clone());
        let key = ApiKey::new("secret").unwrap();
        let title = client.polish_title(&key, "无线降噪").await.unwrap();
        assert_eq!(title, "静享\n极致降噪");
        let sent = provider.captured()[0].body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(sent.ends_with("无线降噪"));
    }

    #[tokio::test]
    async fn empty_answer_is_an_error() {
        let provider = mock::spawn(
            (StatusCode::OK, json!({})),
            (StatusCode::OK, mock::text_reply("   ")),
        )
        .await;
        let client = GeminiClient::new(provider.config.clone());
        let key = ApiKey::new("secret").unwrap();
        assert!(matches!(
            client.polish_title(&key, "t").await,
            Err(GenerationError::EmptyText)
        ));
    }
}
