use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{ProviderKind, Turn};

pub const CHAT_ROUTE: &str = "/api/chat";
pub const QUICK_REPLIES_ROUTE: &str = "/api/quick-replies";

/// Body of `POST /api/chat`.
///
/// A missing `message` deserializes to an empty string so the handler can
/// reject both cases with the same validation error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_history: Vec<Turn>,
    #[serde(
        default,
        deserialize_with = "lenient_provider",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider: Option<ProviderKind>,
}

/// Accepts the same aliases as configuration. An unrecognised name falls back
/// to the demo provider; a blank one means "use the server default".
fn lenient_provider<'de, D>(deserializer: D) -> Result<Option<ProviderKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|name| !name.trim().is_empty())
        .map(|name| ProviderKind::parse(&name).unwrap_or(ProviderKind::Demo)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuickRepliesRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickRepliesResponse {
    pub suppress: bool,
    pub quick_replies: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_accepts_missing_history_and_message() {
        let req: ChatRequest = serde_json::from_str("{}").expect("json");
        assert!(req.message.is_empty());
        assert!(req.conversation_history.is_empty());
        assert!(req.provider.is_none());
    }

    #[test]
    fn chat_request_uses_camel_case_history_key() {
        let req = ChatRequest {
            message: "hello".into(),
            conversation_history: vec![Turn::user("a"), Turn::assistant("b")],
            provider: None,
        };
        let json = serde_json::to_value(&req).expect("json");
        assert_eq!(json["conversationHistory"][1]["role"], "assistant");
        assert!(json.get("provider").is_none());
    }

    #[test]
    fn chat_request_provider_accepts_aliases_and_falls_back_to_demo() {
        let provider = |raw: &str| {
            serde_json::from_str::<ChatRequest>(raw)
                .expect("json")
                .provider
        };
        assert_eq!(provider(r#"{"provider":"claude"}"#), Some(ProviderKind::Anthropic));
        assert_eq!(provider(r#"{"provider":"Google"}"#), Some(ProviderKind::Gemini));
        assert_eq!(provider(r#"{"provider":"mystery"}"#), Some(ProviderKind::Demo));
        assert_eq!(provider(r#"{"provider":"  "}"#), None);
        assert_eq!(provider(r#"{"provider":null}"#), None);
    }

    #[test]
    fn chat_request_provider_round_trips_canonical_name() {
        let req = ChatRequest {
            message: "hi".into(),
            provider: Some(ProviderKind::Gemini),
            ..ChatRequest::default()
        };
        let json = serde_json::to_string(&req).expect("json");
        let back: ChatRequest = serde_json::from_str(&json).expect("json");
        assert_eq!(back.provider, Some(ProviderKind::Gemini));
    }
}
