//! Concrete provider backends.

pub mod anthropic;
pub mod demo;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use demo::DemoProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
