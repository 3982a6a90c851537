use std::sync::Arc;

use async_trait::async_trait;
use crate::config::LLMConfig;
use crate::types::{AppResult, LLMRequest, LLMResponse};

#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Build the adapter the relay talks to.
///
/// Only Anthropic is wired today; the trait keeps the background worker
/// independent of the vendor so tests can substitute their own adapter.
pub fn create_adapter(config: &LLMConfig) -> AppResult<Arc<dyn LLMAdapter>> {
    let adapter = crate::llm::anthropic::AnthropicAdapter::from_config(config)?;
    Ok(Arc::new(adapter))
}
