use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::domain::ProviderKind;
use tracing::debug;

use crate::provider::{
    api_failure, non_empty, ChatProvider, CompletionRequest, ProviderError, ProviderSettings,
};

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiProvider {
    http: Client,
    settings: ProviderSettings,
}

impl OpenAiProvider {
    pub fn new(http: Client, settings: ProviderSettings) -> Self {
        Self { http, settings }
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Openai
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let api_key = self.settings.require_key(self.kind(), API_KEY_ENV)?;

        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: &request.system_prompt,
        });
        messages.extend(request.history.iter().map(|turn| ChatMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));
        messages.push(ChatMessage {
            role: "user",
            content: &request.message,
        });

        let body = ChatCompletionRequest {
            model: &self.settings.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        debug!(model = %self.settings.model, turns = request.history.len(), "sending openai chat completion");

        let response = self
            .http
            .post(self.settings.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::transport(self.kind()))?;
        if !response.status().is_success() {
            return Err(api_failure(self.kind(), response).await);
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(ProviderError::transport(self.kind()))?;
        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        non_empty(self.kind(), text)
    }
}
