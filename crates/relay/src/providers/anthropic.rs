use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::domain::ProviderKind;
use tracing::debug;

use crate::provider::{
    api_failure, non_empty, ChatProvider, CompletionRequest, ProviderError, ProviderSettings,
};

pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

pub struct AnthropicProvider {
    http: Client,
    settings: ProviderSettings,
}

impl AnthropicProvider {
    pub fn new(http: Client, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self.settings.require_key(self.kind(), API_KEY_ENV)?;

        // The system prompt travels in its own field, not as a message.
        let mut messages: Vec<Message<'_>> = request
            .history
            .iter()
            .map(|turn| Message {
                role: turn.role.as_str(),
                content: &turn.content,
            })
            .collect();
        messages.push(Message {
            role: "user",
            content: &request.message,
        });

        let body = MessagesRequest {
            model: &self.settings.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system_prompt,
            messages,
        };
        debug!(model = %self.settings.model, turns = request.history.len(), "sending anthropic messages request");

        let response = self
            .http
            .post(self.settings.endpoint("v1/messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::transport(self.kind()))?;
        if !response.status().is_success() {
            return Err(api_failure(self.kind(), response).await);
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(ProviderError::transport(self.kind()))?;
        let text = reply
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        non_empty(self.kind(), text)
    }
}
