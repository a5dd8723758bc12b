//! Client for the generative language API: background generation, magic
//! edit interpretation and title polish all go through `generateContent`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::constants::API_KEY_HEADER;

mod generate;
mod interpret;
mod polish;

pub use generate::{GenerationRequest, build_prompt};
pub use interpret::{EditIntent, decode_edit_result};

/// The user's provider key. Held in memory only; deliberately neither
/// `Serialize` nor printable.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Trims the input, `None` when nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The secret, for the auth header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

/// Errors returned by provider calls.
#[derive(Debug)]
pub enum GenerationError {
    /// The request never got a response (network, TLS, DNS)
    Transport(reqwest::Error),
    /// Non-success status: bad key, quota, invalid request
    Provider {
        /// HTTP status
        status: u16,
        /// start of the response body
        body: String,
    },
    /// The response body was not the expected JSON
    Decode(String),
    /// The model answered without any image
    NoImage,
    /// The model answered without any text
    EmptyText,
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "request to provider failed: {err}"),
            Self::Provider { status, body } => write!(f, "provider returned {status}: {body}"),
            Self::Decode(err) => write!(f, "failed to parse provider response: {err}"),
            Self::NoImage => write!(f, "no image generated"),
            Self::EmptyText => write!(f, "provider returned no text"),
        }
    }
}

impl std::error::Error for GenerationError {}

// -----------------------------
// generateContent wire types
// -----------------------------

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: Cow<'a, str>,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

impl<'a> Part<'a> {
    fn text(text: impl Into<Cow<'a, str>>) -> Self {
        Part::Text { text: text.into() }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<ImageConfig<'a>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ImageConfig<'a> {
    aspect_ratio: &'a str,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, alias = "inline_data")]
    inline_data: Option<ResponseInlineData>,
}

#[derive(Deserialize, Debug, Default)]
struct ResponseInlineData {
    #[serde(default)]
    data: String,
}

impl GenerateContentResponse {
    fn first_candidate_parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    /// base64 payload of the first inline image of the first candidate
    fn first_inline_image(&self) -> Option<&str> {
        self.first_candidate_parts()
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .map(|inline| inline.data.as_str())
            .find(|data| !data.is_empty())
    }

    /// all text parts of the first candidate, joined
    fn text(&self) -> String {
        self.first_candidate_parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Talks to the provider. Cheap to clone.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl GeminiClient {
    /// Client using reqwest's default transport settings; no local timeout.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Provider settings in use.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn generate_content(
        &self,
        api_key: &ApiKey,
        model: &str,
        body: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let endpoint = self.config.endpoint(model);
        debug!("POST {}", endpoint);
        let resp = self
            .http
            .post(&endpoint)
            .header(API_KEY_HEADER, api_key.expose())
            .json(body)
            .send()
            .await
            .map_err(GenerationError::Transport)?;

        let status = resp.status();
        let bytes = resp.bytes().await.map_err(GenerationError::Transport)?;
        if !status.is_success() {
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).chars().take(500).collect(),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&bytes)
            .map_err(|err| GenerationError::Decode(err.to_string()))?;
        if let Some(feedback) = parsed.prompt_feedback.as_ref() {
            debug!("Prompt feedback from provider: {}", feedback);
        }
        Ok(parsed)
    }
}
