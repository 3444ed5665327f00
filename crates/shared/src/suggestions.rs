//! Clarifying-question detection and the quick replies it gates.

use std::sync::OnceLock;

use regex::RegexSet;
use tracing::error;

const QUESTION_PATTERNS: &[&str] = &[
    r"(?i)\b(what|how|why|when|where|which|who)\b",
    r"(?i)\b(can|could|would|will) you\b",
    r"(?i)\b(do|did|does|have|has|are|is|was|were) (you|they|he|she|your|the)\b",
    r"(?i)\btell me (more|about)\b",
    r"(?i)\b(any|anything) (else|other)\b",
];

pub const STARTER_REPLIES: &[&str] = &[
    "What can you help me with?",
    "Give me a quick tip for today",
    "I'd like some advice",
];

pub const FOLLOW_UP_REPLIES: &[&str] = &[
    "Tell me more",
    "Can you give me an example?",
    "That helps, thanks!",
];

fn question_patterns() -> Option<&'static RegexSet> {
    static PATTERNS: OnceLock<Option<RegexSet>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| match RegexSet::new(QUESTION_PATTERNS) {
            Ok(patterns) => Some(patterns),
            Err(error) => {
                error!(%error, "question patterns failed to compile; suggestions are never suppressed");
                None
            }
        })
        .as_ref()
}

/// True when `text` carries a question mark and reads like a clarifying
/// question, in which case follow-up suggestions are withheld.
pub fn sounds_like_question(text: &str) -> bool {
    let question_marks = text.matches('?').count();
    if question_marks == 0 {
        return false;
    }
    question_patterns().is_some_and(|patterns| patterns.is_match(text))
}

/// Suggestions to offer given the last assistant reply, if any.
pub fn quick_replies(last_assistant_reply: Option<&str>) -> &'static [&'static str] {
    match last_assistant_reply {
        None => STARTER_REPLIES,
        Some(reply) if sounds_like_question(reply) => &[],
        Some(_) => FOLLOW_UP_REPLIES,
    }
}
