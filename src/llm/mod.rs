// LLM abstraction layer

pub mod provider;
pub mod anthropic;

pub use provider::*;
pub use anthropic::AnthropicAdapter;
