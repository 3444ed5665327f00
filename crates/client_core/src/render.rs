//! Turns message text into what the transcript shows.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub sender: Sender,
    pub text: String,
    pub html: String,
    pub sent_at: DateTime<Utc>,
}

impl RenderedMessage {
    /// User text is shown verbatim, so it is only escaped.
    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            sender: Sender::User,
            html: escape_html(&text),
            text,
            sent_at: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            sender: Sender::Bot,
            html: bot_html(&text),
            text,
            sent_at: Utc::now(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.sender {
            Sender::User => "message user-message",
            Sender::Bot => "message bot-message",
        }
    }

    /// Rendering for terminals: bold markers dropped, line breaks kept.
    pub fn plain_text(&self) -> String {
        match self.sender {
            Sender::User => self.text.clone(),
            Sender::Bot => match bold_pattern() {
                Some(bold) => bold.replace_all(&self.text, "$1").into_owned(),
                None => self.text.clone(),
            },
        }
    }
}

fn bold_pattern() -> Option<&'static Regex> {
    static BOLD: OnceLock<Option<Regex>> = OnceLock::new();
    BOLD.get_or_init(|| match Regex::new(r"\*\*(.*?)\*\*") {
        Ok(bold) => Some(bold),
        Err(error) => {
            error!(%error, "bold pattern failed to compile; bot text stays unformatted");
            None
        }
    })
    .as_ref()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escapes, then applies the two bits of markdown bot replies use:
/// `**bold**` and line breaks.
pub fn bot_html(text: &str) -> String {
    let escaped = escape_html(text);
    let bolded = match bold_pattern() {
        Some(bold) => bold
            .replace_all(&escaped, "<strong>$1</strong>")
            .into_owned(),
        None => escaped,
    };
    bolded.replace('\n', "<br>")
}
