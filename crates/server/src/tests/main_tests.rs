use super::*;
use std::{
    env, fs,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::{SystemTime, UNIX_EPOCH},
};

use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use relay::{ChatProvider, CompletionRequest, ProviderError, RelayConfig, APOLOGIES};
use shared::domain::{ProviderKind, Role, Turn};
use tower::ServiceExt;

struct EchoProvider {
    histories: Arc<Mutex<Vec<Vec<Turn>>>>,
}

#[async_trait]
impl ChatProvider for EchoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Openai
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.histories
            .lock()
            .expect("lock")
            .push(request.history.clone());
        Ok(format!("echo: {}", request.message))
    }
}

struct NamedProvider(ProviderKind);

#[async_trait]
impl ChatProvider for NamedProvider {
    fn kind(&self) -> ProviderKind {
        self.0
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        Ok(format!("{}: {}", self.0, request.message))
    }
}

static STATIC_DIRS: AtomicUsize = AtomicUsize::new(0);

fn temp_static_dir() -> PathBuf {
    let seq = STATIC_DIRS.fetch_add(1, Ordering::Relaxed);
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("chat_relay_static_{suffix}_{seq}"));
    fs::create_dir_all(&dir).expect("static dir");
    fs::write(dir.join("index.html"), "<h1>chat</h1>").expect("index");
    dir
}

fn test_app() -> (Router, Arc<Mutex<Vec<Vec<Turn>>>>, PathBuf) {
    let histories = Arc::new(Mutex::new(Vec::new()));
    let relay = Relay::new(ProviderKind::Openai, "system").with_provider(Arc::new(EchoProvider {
        histories: histories.clone(),
    }));
    let static_dir = temp_static_dir();
    let app = build_router(AppState::new(relay), &static_dir);
    (app, histories, static_dir)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (app, _histories, static_dir) = test_app();
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    fs::remove_dir_all(static_dir).expect("cleanup");
}

#[tokio::test]
async fn chat_returns_non_empty_response_for_valid_message() {
    let (app, _histories, static_dir) = test_app();
    let response = app
        .oneshot(post_json(
            CHAT_ROUTE,
            serde_json::json!({ "message": "My toddler hit his sister" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["response"], "echo: My toddler hit his sister");
    fs::remove_dir_all(static_dir).expect("cleanup");
}

#[tokio::test]
async fn chat_rejects_missing_or_empty_message() {
    let (app, histories, static_dir) = test_app();
    for body in [
        serde_json::json!({}),
        serde_json::json!({ "message": "" }),
        serde_json::json!({ "message": "   " }),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(CHAT_ROUTE, body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], MESSAGE_REQUIRED);
        assert_eq!(body["code"], "validation");
    }
    assert!(histories.lock().expect("lock").is_empty());
    fs::remove_dir_all(static_dir).expect("cleanup");
}

#[tokio::test]
async fn chat_rejects_malformed_json_with_error_body() {
    let (app, _histories, static_dir) = test_app();
    let request = Request::post(CHAT_ROUTE)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
    fs::remove_dir_all(static_dir).expect("cleanup");
}

#[tokio::test]
async fn chat_forwards_conversation_history_to_provider() {
    let (app, histories, static_dir) = test_app();
    let response = app
        .oneshot(post_json(
            CHAT_ROUTE,
            serde_json::json!({
                "message": "third",
                "conversationHistory": [
                    { "role": "user", "content": "first" },
                    { "role": "assistant", "content": "reply one" },
                    { "role": "user", "content": "second" },
                    { "role": "assistant", "content": "reply two" }
                ]
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let histories = histories.lock().expect("lock");
    let history = &histories[0];
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[3].content, "reply two");
    fs::remove_dir_all(static_dir).expect("cleanup");
}

#[tokio::test]
async fn missing_credential_returns_ok_with_apology() {
    let relay = Relay::from_config(RelayConfig::default());
    let static_dir = temp_static_dir();
    let app = build_router(AppState::new(relay), &static_dir);

    let response = app
        .oneshot(post_json(CHAT_ROUTE, serde_json::json!({ "message": "hello" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let text = body["response"].as_str().expect("response text");
    assert!(APOLOGIES.contains(&text), "unexpected reply: {text}");
    fs::remove_dir_all(static_dir).expect("cleanup");
}

#[tokio::test]
async fn chat_routes_provider_aliases_and_unknown_names() {
    let relay = Relay::new(ProviderKind::Openai, "system")
        .with_provider(Arc::new(NamedProvider(ProviderKind::Openai)))
        .with_provider(Arc::new(NamedProvider(ProviderKind::Anthropic)))
        .with_provider(Arc::new(NamedProvider(ProviderKind::Gemini)))
        .with_provider(Arc::new(NamedProvider(ProviderKind::Demo)));
    let static_dir = temp_static_dir();
    let app = build_router(AppState::new(relay), &static_dir);

    for (provider, expected) in [
        ("claude", "anthropic: hi"),
        ("google", "gemini: hi"),
        ("mystery", "demo: hi"),
        ("", "openai: hi"),
    ] {
        let response = app
            .clone()
            .oneshot(post_json(
                CHAT_ROUTE,
                serde_json::json!({ "message": "hi", "provider": provider }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK, "provider {provider:?}");
        let body = json_body(response).await;
        assert_eq!(body["response"], expected);
    }
    fs::remove_dir_all(static_dir).expect("cleanup");
}

#[tokio::test]
async fn quick_replies_are_suppressed_after_clarifying_question() {
    let (app, _histories, static_dir) = test_app();
    let response = app
        .clone()
        .oneshot(post_json(
            QUICK_REPLIES_ROUTE,
            serde_json::json!({ "text": "What happened when you tried it?" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["suppress"], true);
    assert_eq!(body["quickReplies"].as_array().expect("array").len(), 0);

    let response = app
        .oneshot(post_json(
            QUICK_REPLIES_ROUTE,
            serde_json::json!({ "text": "Offer two choices." }),
        ))
        .await
        .expect("response");
    let body = json_body(response).await;
    assert_eq!(body["suppress"], false);
    assert!(!body["quickReplies"].as_array().expect("array").is_empty());
    fs::remove_dir_all(static_dir).expect("cleanup");
}

#[tokio::test]
async fn site_root_serves_index_html() {
    let (app, _histories, static_dir) = test_app();
    let request = Request::get("/").body(Body::empty()).expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(bytes.as_ref(), b"<h1>chat</h1>");
    fs::remove_dir_all(static_dir).expect("cleanup");
}
