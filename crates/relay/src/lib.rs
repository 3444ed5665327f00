//! Server-side relay: forwards one user message (plus optional history) to an
//! LLM provider and always comes back with text to show the user.

use std::{collections::HashMap, sync::Arc, time::Duration};

use reqwest::Client;
use shared::domain::{alternates_from_user, ProviderKind, Turn};
use tracing::{error, info, warn};

pub mod apology;
pub mod persona;
pub mod provider;
pub mod providers;

pub use apology::{apology_for, classify, FailureKind, APOLOGIES, CONNECTION_APOLOGY};
pub use persona::Persona;
pub use provider::{ChatProvider, CompletionRequest, ProviderError, ProviderSettings};

use providers::{anthropic, gemini, openai, AnthropicProvider, DemoProvider, GeminiProvider, OpenAiProvider};

pub const DEFAULT_MAX_TOKENS: u32 = 500;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub default_provider: ProviderKind,
    pub persona: Persona,
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub gemini: ProviderSettings,
    pub demo_delay: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderKind::Openai,
            persona: Persona::default(),
            openai: ProviderSettings {
                api_key: None,
                model: openai::DEFAULT_MODEL.into(),
                base_url: openai::DEFAULT_BASE_URL.into(),
            },
            anthropic: ProviderSettings {
                api_key: None,
                model: anthropic::DEFAULT_MODEL.into(),
                base_url: anthropic::DEFAULT_BASE_URL.into(),
            },
            gemini: ProviderSettings {
                api_key: None,
                model: gemini::DEFAULT_MODEL.into(),
                base_url: gemini::DEFAULT_BASE_URL.into(),
            },
            demo_delay: Duration::from_millis(1000),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Provider registry plus the prompt parameters shared by every request.
///
/// Holds no per-conversation state; every call to [`Relay::respond`] is
/// independent.
pub struct Relay {
    providers: HashMap<ProviderKind, Arc<dyn ChatProvider>>,
    default_provider: ProviderKind,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
}

impl Relay {
    pub fn new(default_provider: ProviderKind, system_prompt: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider,
            system_prompt: system_prompt.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn from_config(config: RelayConfig) -> Self {
        let http = Client::new();
        let mut relay = Self::new(config.default_provider, config.persona.system_prompt());
        relay.max_tokens = config.max_tokens;
        relay.temperature = config.temperature;
        relay
            .with_provider(Arc::new(OpenAiProvider::new(http.clone(), config.openai)))
            .with_provider(Arc::new(AnthropicProvider::new(
                http.clone(),
                config.anthropic,
            )))
            .with_provider(Arc::new(GeminiProvider::new(http, config.gemini)))
            .with_provider(Arc::new(DemoProvider::new(config.demo_delay)))
    }

    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    /// Relays `message` to the requested (or default) provider.
    ///
    /// Never fails: any provider error is logged and replaced by one of the
    /// fixed [`APOLOGIES`].
    pub async fn respond(
        &self,
        message: &str,
        history: &[Turn],
        provider: Option<ProviderKind>,
    ) -> String {
        let kind = provider.unwrap_or(self.default_provider);
        let Some(backend) = self.providers.get(&kind) else {
            warn!(provider = %kind, "no backend registered for provider");
            return CONNECTION_APOLOGY.to_string();
        };

        if !alternates_from_user(history) {
            warn!(
                provider = %kind,
                turns = history.len(),
                "conversation history does not alternate user/assistant"
            );
        }

        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            history: history.to_vec(),
            message: message.to_string(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        match backend.complete(&request).await {
            Ok(text) if !text.trim().is_empty() => {
                info!(provider = %kind, turns = history.len(), "relayed chat message");
                text
            }
            Ok(_) => {
                let err = ProviderError::EmptyResponse { provider: kind };
                error!(provider = %kind, %err, "provider returned an empty reply");
                apology_for(&err).to_string()
            }
            Err(err) => {
                let failure = classify(&err);
                error!(provider = %err.provider(), ?failure, %err, "provider request failed");
                apology_for(&err).to_string()
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
