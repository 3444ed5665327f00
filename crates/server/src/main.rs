use std::{net::SocketAddr, path::Path};

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use relay::Relay;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{
        ChatRequest, ChatResponse, QuickRepliesRequest, QuickRepliesResponse, CHAT_ROUTE,
        QUICK_REPLIES_ROUTE,
    },
    suggestions::{quick_replies, sounds_like_question},
};
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

const MAX_REQUEST_BYTES: usize = 256 * 1024;
const MESSAGE_REQUIRED: &str = "Message is required";

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    for (provider, configured) in settings.configured_providers() {
        info!(%provider, configured, "provider credential");
    }
    if !settings.static_dir.is_dir() {
        warn!(
            static_dir = %settings.static_dir.display(),
            "static directory not found; only the API routes will respond"
        );
    }

    let relay = Relay::from_config(settings.relay_config());
    info!(
        default_provider = %relay.default_provider(),
        assistant = settings.assistant.name(),
        "relay ready"
    );
    let app = build_router(AppState::new(relay), &settings.static_dir);

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(CHAT_ROUTE, post(chat))
        .route(QUICK_REPLIES_ROUTE, post(http_quick_replies))
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

fn bad_request(rejection: JsonRejection) -> HttpError {
    warn!(error = %rejection.body_text(), "rejected malformed request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(ErrorCode::Validation, rejection.body_text())),
    )
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, HttpError> {
    let Json(req) = payload.map_err(bad_request)?;

    let message = req.message.trim();
    if message.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, MESSAGE_REQUIRED)),
        ));
    }

    let response = state
        .relay
        .respond(message, &req.conversation_history, req.provider)
        .await;
    Ok(Json(ChatResponse { response }))
}

async fn http_quick_replies(
    payload: Result<Json<QuickRepliesRequest>, JsonRejection>,
) -> Result<Json<QuickRepliesResponse>, HttpError> {
    let Json(req) = payload.map_err(bad_request)?;

    let text = req.text.trim();
    let last_reply = (!text.is_empty()).then_some(text);
    Ok(Json(QuickRepliesResponse {
        suppress: last_reply.is_some_and(sounds_like_question),
        quick_replies: quick_replies(last_reply)
            .iter()
            .map(|reply| reply.to_string())
            .collect(),
    }))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
