use std::time::Duration;

use async_trait::async_trait;
use shared::domain::ProviderKind;

use crate::provider::{ChatProvider, CompletionRequest, ProviderError};

const CANNED_OPENERS: [&str; 5] = [
    "That's an interesting question! Let me think about that...",
    "I understand what you're asking. Here's what I can tell you...",
    "Great question! Based on what I know...",
    "I'd be happy to help with that. Here's my perspective...",
    "That's a thoughtful inquiry. Let me share some insights...",
];

pub const DEMO_NOTE: &str =
    " (Note: This is a demo response. Configure an LLM API key to get real responses.)";

/// Credential-free provider that answers with canned text after a short pause.
pub struct DemoProvider {
    delay: Duration,
}

impl DemoProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

pub(crate) fn canned_reply(message: &str) -> String {
    let index = message.bytes().map(usize::from).sum::<usize>() % CANNED_OPENERS.len();
    format!("{}{}", CANNED_OPENERS[index], DEMO_NOTE)
}

#[async_trait]
impl ChatProvider for DemoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Demo
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(canned_reply(&request.message))
    }
}
