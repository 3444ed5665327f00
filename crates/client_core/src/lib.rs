use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::{ApiError, ApiException},
    protocol::{ChatRequest, ChatResponse, CHAT_ROUTE},
};
use tracing::{info, warn};
use url::Url;

pub mod render;
pub mod session;

pub use render::{RenderedMessage, Sender};
pub use session::{ChatSession, SessionEffect, SessionEvent, SessionId, ERROR_NOTICE};

/// Carries one chat request to the relay and returns the reply text.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &ChatRequest) -> Result<String>;
}

pub struct RelayClient {
    http: Client,
    chat_url: Url,
}

impl RelayClient {
    pub fn new(server_url: &str) -> Result<Self> {
        let mut base = Url::parse(server_url)
            .with_context(|| format!("invalid server url '{server_url}'"))?;
        // Join relative to a directory so a path prefix survives.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let chat_url = base
            .join(CHAT_ROUTE.trim_start_matches('/'))
            .with_context(|| format!("cannot build chat url from '{server_url}'"))?;
        Ok(Self {
            http: Client::new(),
            chat_url,
        })
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }
}

#[async_trait]
impl ChatTransport for RelayClient {
    async fn send(&self, request: &ChatRequest) -> Result<String> {
        let res = self
            .http
            .post(self.chat_url.clone())
            .json(request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(match res.json::<ApiError>().await {
                Ok(api_error) => ApiException::from(api_error).into(),
                Err(_) => anyhow!("relay responded with {status}"),
            });
        }

        let body: ChatResponse = res.json().await?;
        Ok(body.response)
    }
}

/// Applies `event` to the session without touching the network.
///
/// Returns the immediate effects (so a view can show the typing indicator
/// right away) and the request to send, if the event produced one.
pub fn begin_exchange(
    session: &mut ChatSession,
    event: SessionEvent,
) -> (Vec<SessionEffect>, Option<ChatRequest>) {
    let effects = session.dispatch(event);
    let request = effects.iter().find_map(|effect| match effect {
        SessionEffect::SendRequest(request) => Some(request.clone()),
        _ => None,
    });
    (effects, request)
}

/// Sends `request` and feeds the reply or the failure back into the session.
pub async fn complete_exchange<T: ChatTransport + ?Sized>(
    session: &mut ChatSession,
    transport: &T,
    request: ChatRequest,
) -> Vec<SessionEffect> {
    let outcome = match transport.send(&request).await {
        Ok(text) => {
            info!(session = %session.id(), turns = request.conversation_history.len(), "received reply");
            SessionEvent::ReplyReceived { text }
        }
        Err(err) => {
            warn!(session = %session.id(), error = %err, "chat request failed");
            SessionEvent::RequestFailed {
                reason: err.to_string(),
            }
        }
    };
    session.dispatch(outcome)
}

/// [`begin_exchange`] followed by [`complete_exchange`], returning every
/// effect in order.
pub async fn run_exchange<T: ChatTransport + ?Sized>(
    session: &mut ChatSession,
    transport: &T,
    event: SessionEvent,
) -> Vec<SessionEffect> {
    let (mut effects, request) = begin_exchange(session, event);
    if let Some(request) = request {
        effects.extend(complete_exchange(session, transport, request).await);
    }
    effects
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
