use async_trait::async_trait;
use serde::Deserialize;
use shared::domain::{ProviderKind, Turn};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub history: Vec<Turn>,
    pub message: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API key not configured; set {env_var}")]
    MissingCredential {
        provider: ProviderKind,
        env_var: &'static str,
    },
    #[error("{provider} API returned {status}: {message}")]
    Api {
        provider: ProviderKind,
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} returned no text")]
    EmptyResponse { provider: ProviderKind },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderKind {
        match self {
            ProviderError::MissingCredential { provider, .. }
            | ProviderError::Api { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::EmptyResponse { provider } => *provider,
        }
    }

    pub(crate) fn transport(provider: ProviderKind) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| ProviderError::Transport { provider, source }
    }
}

/// A backend able to turn a conversation into one assistant reply.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Credentials and endpoint for one hosted provider.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl ProviderSettings {
    pub(crate) fn require_key(
        &self,
        provider: ProviderKind,
        env_var: &'static str,
    ) -> Result<&str, ProviderError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingCredential { provider, env_var })
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

// OpenAI reports a string `code`, Anthropic a `type`, Gemini a `status`.
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Builds a `ProviderError::Api` from a non-success HTTP response.
pub(crate) async fn api_failure(
    provider: ProviderKind,
    response: reqwest::Response,
) -> ProviderError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => {
            let detail = envelope.error;
            let code = detail
                .code
                .and_then(|code| code.as_str().map(str::to_string))
                .or(detail.kind)
                .or(detail.status);
            (code, detail.message.unwrap_or(body))
        }
        Err(_) => (None, body),
    };
    ProviderError::Api {
        provider,
        status,
        code,
        message,
    }
}

/// Rejects replies that carry no visible text.
pub(crate) fn non_empty(provider: ProviderKind, text: String) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse { provider })
    } else {
        Ok(text)
    }
}
