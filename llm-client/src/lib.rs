//! Shared LLM client library for the bilingua workspace
//!
//! Provides a unified interface for multiple LLM providers:
//! - Gemini (Generative Language API)
//! - Anthropic API (direct)
//! - OpenAI, OpenRouter and Cerebras (chat completions)
//!
//! plus a retry policy for throttled or flaky endpoints.

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod retry;

pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{LlmError, Result};
pub use provider::{LlmProvider, LlmRequest, LlmResponse, TokenUsage};
pub use providers::{MockProvider, ProviderKind, get_provider};
pub use retry::{RetryPolicy, complete_with_retry};
