mod client;
mod types;

pub use client::{LlmClient, OpenAiClient};
pub use types::{ChatMessage, ChatRequest, ChatResponse};
