//! Conversation state for one chat window, driven by typed events.

use std::fmt;

use shared::{
    domain::{ProviderKind, Role, Turn},
    protocol::ChatRequest,
    suggestions,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::render::RenderedMessage;

pub const ERROR_NOTICE: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Inputs from the user or the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Submit { text: String },
    QuickReplySelected { index: usize },
    ReplyReceived { text: String },
    RequestFailed { reason: String },
    Reset,
}

/// What the view (and the transport) should do in response to an event.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEffect {
    MessageAppended(RenderedMessage),
    InputCleared,
    TypingShown,
    TypingHidden,
    QuickRepliesChanged(Vec<String>),
    TranscriptCleared,
    SendRequest(ChatRequest),
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    id: SessionId,
    provider: Option<ProviderKind>,
    history: Vec<Turn>,
    transcript: Vec<RenderedMessage>,
    pending: Option<String>,
    quick_replies: Vec<String>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: SessionId(Uuid::new_v4()),
            provider: None,
            history: Vec::new(),
            transcript: Vec::new(),
            pending: None,
            quick_replies: owned(suggestions::quick_replies(None)),
        }
    }

    /// Pins every request from this session to one provider instead of the
    /// server default.
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn transcript(&self) -> &[RenderedMessage] {
        &self.transcript
    }

    pub fn quick_replies(&self) -> &[String] {
        &self.quick_replies
    }

    /// The typing indicator is visible exactly while a request is in flight.
    pub fn is_typing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn can_send(&self, input: &str) -> bool {
        self.pending.is_none() && !input.trim().is_empty()
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Vec<SessionEffect> {
        match event {
            SessionEvent::Submit { text } => self.submit(&text),
            SessionEvent::QuickReplySelected { index } => match self.quick_replies.get(index) {
                Some(reply) => {
                    let reply = reply.clone();
                    self.submit(&reply)
                }
                None => {
                    debug!(session = %self.id, index, "ignoring unknown quick reply");
                    Vec::new()
                }
            },
            SessionEvent::ReplyReceived { text } => self.reply_received(text),
            SessionEvent::RequestFailed { reason } => self.request_failed(&reason),
            SessionEvent::Reset => self.reset(),
        }
    }

    fn submit(&mut self, text: &str) -> Vec<SessionEffect> {
        let message = text.trim();
        if message.is_empty() {
            return Vec::new();
        }
        if self.pending.is_some() {
            debug!(session = %self.id, "request already in flight; ignoring submit");
            return Vec::new();
        }

        let rendered = RenderedMessage::user(message);
        self.transcript.push(rendered.clone());
        self.pending = Some(message.to_string());
        self.quick_replies.clear();

        vec![
            SessionEffect::MessageAppended(rendered),
            SessionEffect::InputCleared,
            SessionEffect::TypingShown,
            SessionEffect::QuickRepliesChanged(Vec::new()),
            SessionEffect::SendRequest(ChatRequest {
                message: message.to_string(),
                conversation_history: self.history.clone(),
                provider: self.provider,
            }),
        ]
    }

    fn reply_received(&mut self, text: String) -> Vec<SessionEffect> {
        let Some(message) = self.pending.take() else {
            warn!(session = %self.id, "reply arrived with no request in flight");
            return Vec::new();
        };

        let rendered = RenderedMessage::bot(text.clone());
        self.transcript.push(rendered.clone());
        self.history.push(Turn::user(message));
        self.history.push(Turn::assistant(text));

        vec![
            SessionEffect::TypingHidden,
            SessionEffect::MessageAppended(rendered),
            self.refresh_quick_replies(),
        ]
    }

    fn request_failed(&mut self, reason: &str) -> Vec<SessionEffect> {
        if self.pending.take().is_none() {
            warn!(session = %self.id, reason, "failure reported with no request in flight");
            return Vec::new();
        }
        warn!(session = %self.id, reason, "chat request failed");

        // The failed exchange stays out of the history.
        let rendered = RenderedMessage::bot(ERROR_NOTICE);
        self.transcript.push(rendered.clone());

        vec![
            SessionEffect::TypingHidden,
            SessionEffect::MessageAppended(rendered),
            self.refresh_quick_replies(),
        ]
    }

    fn reset(&mut self) -> Vec<SessionEffect> {
        let was_typing = self.pending.take().is_some();
        self.history.clear();
        self.transcript.clear();

        let mut effects = vec![SessionEffect::TranscriptCleared];
        if was_typing {
            effects.push(SessionEffect::TypingHidden);
        }
        effects.push(self.refresh_quick_replies());
        effects
    }

    fn refresh_quick_replies(&mut self) -> SessionEffect {
        let last_reply = self
            .history
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.content.as_str());
        self.quick_replies = owned(suggestions::quick_replies(last_reply));
        SessionEffect::QuickRepliesChanged(self.quick_replies.clone())
    }
}

fn owned(replies: &[&str]) -> Vec<String> {
    replies.iter().map(|reply| reply.to_string()).collect()
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
