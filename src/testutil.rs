//! Stub capability clients shared across test modules.

use async_trait::async_trait;

use crate::ai::LlmClient;
use crate::errors::ProviderError;
use crate::search::{SearchClient, SearchResult};

/// LLM stub: fixed reply, or a provider failure.
pub struct StubLlm {
    reply: Option<String>,
}

impl StubLlm {
    pub fn replying(reply: &str) -> Self {
        Self { reply: Some(reply.to_string()) }
    }

    pub fn failing() -> Self {
        Self { reply: None }
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(ProviderError::Status { status: 503, body: "stub llm down".to_string() }),
        }
    }
}

/// Search stub: canned hits, or a provider failure.
pub struct StubSearch {
    results: Option<Vec<SearchResult>>,
}

impl StubSearch {
    pub fn with_hits(count: usize) -> Self {
        let results = (0..count)
            .map(|i| SearchResult {
                title: format!("hit {i}"),
                url: format!("https://example.com/{i}"),
                content: format!("content for hit {i}"),
                score: Some(1.0 - i as f64 / 10.0),
            })
            .collect();
        Self { results: Some(results) }
    }

    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self { results: Some(results) }
    }

    pub fn failing() -> Self {
        Self { results: None }
    }
}

#[async_trait]
impl SearchClient for StubSearch {
    async fn search(
        &self,
        _query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        match &self.results {
            Some(results) => Ok(results.iter().take(max_results).cloned().collect()),
            None => Err(ProviderError::Status { status: 502, body: "stub search down".to_string() }),
        }
    }
}
