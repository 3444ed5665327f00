use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_target_openai_on_port_3000() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:3000");
    assert_eq!(settings.default_provider, ProviderKind::Openai);
    assert_eq!(settings.assistant, Persona::ParentingCoach);
    assert!(settings
        .configured_providers()
        .iter()
        .all(|(_, configured)| !configured));
}

#[test]
fn port_env_replaces_only_the_port() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[("SERVER_BIND", "0.0.0.0:8080"), ("PORT", "4000")]),
    );
    assert_eq!(settings.server_bind, "0.0.0.0:4000");
}

#[test]
fn invalid_port_is_ignored() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_from(&[("PORT", "not-a-port")]));
    assert_eq!(settings.server_bind, "127.0.0.1:3000");
}

#[test]
fn env_overrides_file_values() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
bind_addr = "127.0.0.1:9000"
provider = "gemini"
assistant = "codingMentor"
gemini_model = "gemini-file"
"#,
    );
    assert_eq!(settings.server_bind, "127.0.0.1:9000");
    assert_eq!(settings.default_provider, ProviderKind::Gemini);
    assert_eq!(settings.assistant, Persona::CodingMentor);

    apply_env(
        &mut settings,
        env_from(&[
            ("LLM_PROVIDER", "anthropic"),
            ("GEMINI_MODEL", "gemini-env"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
        ]),
    );
    assert_eq!(settings.default_provider, ProviderKind::Anthropic);
    assert_eq!(settings.gemini_model, "gemini-env");
    assert!(settings
        .configured_providers()
        .contains(&(ProviderKind::Anthropic, true)));
}

#[test]
fn unknown_provider_keeps_previous_choice() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_from(&[("LLM_PROVIDER", "mystery")]));
    assert_eq!(settings.default_provider, ProviderKind::Openai);
}

#[test]
fn unreadable_file_leaves_defaults() {
    let mut settings = Settings::default();
    apply_file(&mut settings, "this is = = not toml");
    assert_eq!(settings.server_bind, "127.0.0.1:3000");
}

#[test]
fn blank_key_does_not_count_as_configured() {
    let mut settings = Settings::default();
    apply_env(&mut settings, env_from(&[("OPENAI_API_KEY", "  ")]));
    assert!(settings
        .configured_providers()
        .contains(&(ProviderKind::Openai, false)));
}

#[test]
fn relay_config_carries_credentials_and_delay() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[("GOOGLE_API_KEY", "g-key"), ("DEMO_DELAY_MS", "0")]),
    );
    let config = settings.relay_config();
    assert_eq!(config.gemini.api_key.as_deref(), Some("g-key"));
    assert!(config.openai.api_key.is_none());
    assert!(config.demo_delay.is_zero());
    assert_eq!(config.max_tokens, relay::DEFAULT_MAX_TOKENS);
}
