use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use relay::{
    providers::{anthropic, gemini, openai},
    Persona, ProviderSettings, RelayConfig,
};
use shared::domain::ProviderKind;
use tracing::warn;

#[derive(Debug)]
pub struct Settings {
    pub server_bind: String,
    pub static_dir: PathBuf,
    pub default_provider: ProviderKind,
    pub assistant: Persona,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub openai_model: String,
    pub anthropic_model: String,
    pub gemini_model: String,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub gemini_base_url: String,
    pub demo_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:3000".into(),
            static_dir: PathBuf::from("./public"),
            default_provider: ProviderKind::Openai,
            assistant: Persona::default(),
            openai_api_key: None,
            anthropic_api_key: None,
            google_api_key: None,
            openai_model: openai::DEFAULT_MODEL.into(),
            anthropic_model: anthropic::DEFAULT_MODEL.into(),
            gemini_model: gemini::DEFAULT_MODEL.into(),
            openai_base_url: openai::DEFAULT_BASE_URL.into(),
            anthropic_base_url: anthropic::DEFAULT_BASE_URL.into(),
            gemini_base_url: gemini::DEFAULT_BASE_URL.into(),
            demo_delay_ms: 1000,
        }
    }
}

impl Settings {
    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            default_provider: self.default_provider,
            persona: self.assistant,
            openai: ProviderSettings {
                api_key: self.openai_api_key.clone(),
                model: self.openai_model.clone(),
                base_url: self.openai_base_url.clone(),
            },
            anthropic: ProviderSettings {
                api_key: self.anthropic_api_key.clone(),
                model: self.anthropic_model.clone(),
                base_url: self.anthropic_base_url.clone(),
            },
            gemini: ProviderSettings {
                api_key: self.google_api_key.clone(),
                model: self.gemini_model.clone(),
                base_url: self.gemini_base_url.clone(),
            },
            demo_delay: Duration::from_millis(self.demo_delay_ms),
            ..RelayConfig::default()
        }
    }

    /// Which hosted providers have a credential; secrets themselves are never exposed.
    pub fn configured_providers(&self) -> Vec<(ProviderKind, bool)> {
        vec![
            (ProviderKind::Openai, has_value(&self.openai_api_key)),
            (ProviderKind::Anthropic, has_value(&self.anthropic_api_key)),
            (ProviderKind::Gemini, has_value(&self.google_api_key)),
        ]
    }
}

fn has_value(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

pub fn load_settings() -> Settings {
    // A missing .env file is the normal case in deployments.
    let _ = dotenvy::dotenv();

    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, String>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(%error, "ignoring unreadable server.toml");
            return;
        }
    };

    if let Some(v) = file_cfg.get("bind_addr") {
        settings.server_bind = v.clone();
    }
    if let Some(v) = file_cfg.get("static_dir") {
        settings.static_dir = PathBuf::from(v);
    }
    if let Some(v) = file_cfg.get("provider") {
        set_provider(settings, v);
    }
    if let Some(v) = file_cfg.get("assistant") {
        set_assistant(settings, v);
    }
    if let Some(v) = file_cfg.get("openai_model") {
        settings.openai_model = v.clone();
    }
    if let Some(v) = file_cfg.get("anthropic_model") {
        settings.anthropic_model = v.clone();
    }
    if let Some(v) = file_cfg.get("gemini_model") {
        settings.gemini_model = v.clone();
    }
}

pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("PORT") {
        match v.trim().parse::<u16>() {
            Ok(port) => settings.server_bind = with_port(&settings.server_bind, port),
            Err(error) => warn!(value = %v, %error, "ignoring invalid PORT"),
        }
    }

    if let Some(v) = lookup("STATIC_DIR") {
        settings.static_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("LLM_PROVIDER") {
        set_provider(settings, &v);
    }
    if let Some(v) = lookup("ASSISTANT") {
        set_assistant(settings, &v);
    }

    if let Some(v) = lookup(openai::API_KEY_ENV) {
        settings.openai_api_key = Some(v);
    }
    if let Some(v) = lookup(anthropic::API_KEY_ENV) {
        settings.anthropic_api_key = Some(v);
    }
    if let Some(v) = lookup(gemini::API_KEY_ENV) {
        settings.google_api_key = Some(v);
    }

    if let Some(v) = lookup("OPENAI_MODEL") {
        settings.openai_model = v;
    }
    if let Some(v) = lookup("ANTHROPIC_MODEL") {
        settings.anthropic_model = v;
    }
    if let Some(v) = lookup("GEMINI_MODEL") {
        settings.gemini_model = v;
    }
    if let Some(v) = lookup("OPENAI_BASE_URL") {
        settings.openai_base_url = v;
    }
    if let Some(v) = lookup("ANTHROPIC_BASE_URL") {
        settings.anthropic_base_url = v;
    }
    if let Some(v) = lookup("GEMINI_BASE_URL") {
        settings.gemini_base_url = v;
    }

    if let Some(v) = lookup("DEMO_DELAY_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.demo_delay_ms = parsed,
            Err(error) => warn!(value = %v, %error, "ignoring invalid DEMO_DELAY_MS"),
        }
    }
}

fn set_provider(settings: &mut Settings, raw: &str) {
    match ProviderKind::parse(raw) {
        Some(kind) => settings.default_provider = kind,
        None => warn!(value = raw, "unknown provider; keeping {}", settings.default_provider),
    }
}

fn set_assistant(settings: &mut Settings, raw: &str) {
    match Persona::parse(raw) {
        Some(persona) => settings.assistant = persona,
        None => warn!(value = raw, "unknown assistant; keeping {}", settings.assistant.name()),
    }
}

fn with_port(bind: &str, port: u16) -> String {
    let host = bind
        .rsplit_once(':')
        .map(|(host, _)| host)
        .filter(|host| !host.is_empty())
        .unwrap_or("127.0.0.1");
    format!("{host}:{port}")
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
