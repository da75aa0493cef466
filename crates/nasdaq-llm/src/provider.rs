//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A service that turns a completion request into a reply
///
/// The engine holds an `Arc<dyn LLMProvider>`, which lets tests swap in a
/// scripted provider without touching the network.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Provider name (e.g. "anthropic")
    fn name(&self) -> &str;
}
