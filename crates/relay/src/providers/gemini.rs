use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::domain::{ProviderKind, Role};
use tracing::debug;

use crate::provider::{
    api_failure, non_empty, ChatProvider, CompletionRequest, ProviderError, ProviderSettings,
};

pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-pro";

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

pub struct GeminiProvider {
    http: Client,
    settings: ProviderSettings,
}

impl GeminiProvider {
    pub fn new(http: Client, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }
}

fn text_content<'a>(role: Option<&'a str>, text: &str) -> Content<'a> {
    Content {
        role,
        parts: vec![Part {
            text: text.to_string(),
        }],
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self.settings.require_key(self.kind(), API_KEY_ENV)?;

        // Gemini names the assistant side "model".
        let mut contents: Vec<Content<'_>> = request
            .history
            .iter()
            .map(|turn| {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                text_content(Some(role), &turn.content)
            })
            .collect();
        contents.push(text_content(Some("user"), &request.message));

        let body = GenerateContentRequest {
            system_instruction: text_content(None, &request.system_prompt),
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };
        debug!(model = %self.settings.model, turns = request.history.len(), "sending gemini generateContent request");

        let path = format!("models/{}:generateContent", self.settings.model);
        let response = self
            .http
            .post(self.settings.endpoint(&path))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::transport(self.kind()))?;
        if !response.status().is_success() {
            return Err(api_failure(self.kind(), response).await);
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .map_err(ProviderError::transport(self.kind()))?;
        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        non_empty(self.kind(), text)
    }
}
