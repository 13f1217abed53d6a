//! LLM client wrapper for bilingua
//!
//! Resolves the model preset and wraps every request in the configured
//! retry policy.

use anyhow::{Context, Result};
use llm_client::{Config, LlmProvider, LlmRequest, RetryPolicy, complete_with_retry, get_provider};
use std::sync::Arc;

/// Program key for per-program defaults in llm.toml
pub const PROGRAM: &str = "bilingua";

/// Wrapper around LLM providers for bilingua
pub struct LlmClient {
    provider: Arc<dyn LlmProvider>,
    model: String,
    policy: RetryPolicy,
}

impl LlmClient {
    /// Create a new LLM client
    ///
    /// If preset_name is None, uses the default preset from config.
    pub fn new(preset_name: Option<&str>, policy: RetryPolicy) -> Result<Self> {
        let config = Config::load().context("Failed to load LLM configuration")?;

        let preset_name = preset_name.unwrap_or_else(|| config.get_default_for_program(PROGRAM));
        let preset = config
            .get_preset(preset_name)
            .with_context(|| format!("Unknown preset: {}", preset_name))?;

        let provider_config = config.get_provider_config(&preset.provider);
        let provider = get_provider(preset, provider_config).with_context(|| {
            format!(
                "Failed to initialize provider '{}' for preset '{}'",
                preset.provider, preset_name
            )
        })?;

        log::info!("Using LLM provider: {} (model: {})", provider.name(), preset.model);

        Ok(Self {
            provider: Arc::from(provider),
            model: preset.model.clone(),
            policy,
        })
    }

    /// Client over an existing provider
    pub fn from_provider(provider: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self {
            model: provider.name().to_string(),
            provider,
            policy,
        }
    }

    pub fn provider(&self) -> &dyn LlmProvider {
        self.provider.as_ref()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a completion request, retrying per policy. The typed error is
    /// kept so callers can tell quota exhaustion from other failures.
    pub async fn complete(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
    ) -> llm_client::Result<String> {
        let mut request = LlmRequest::new(prompt);
        if let Some(system) = system_prompt {
            request = request.with_system(system);
        }

        log::debug!("Sending {} chars to {}", prompt.len(), self.provider.name());

        let response = complete_with_retry(self.provider.as_ref(), &request, &self.policy).await?;

        if let Some(usage) = &response.usage {
            log::debug!("Tokens: {} in, {} out", usage.input_tokens, usage.output_tokens);
        }

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llm_client::{LlmError, MockProvider};
    use std::time::Duration;

    #[tokio::test]
    async fn test_complete_passes_system_prompt() {
        let mock = Arc::new(MockProvider::always_succeeds("Ciao"));
        let client = LlmClient::from_provider(mock.clone(), RetryPolicy::none());

        let reply = client.complete("Hello", Some("Translate.")).await.unwrap();
        assert_eq!(reply, "Ciao");
        assert_eq!(mock.last_system_prompt().as_deref(), Some("Translate."));
        assert_eq!(client.model(), "mock");
    }

    #[tokio::test]
    async fn test_complete_retries_then_succeeds() {
        let mock = Arc::new(MockProvider::fails_then_succeeds(
            2,
            LlmError::ServerOverloaded {
                message: "busy".into(),
            },
            "ok",
        ));
        let client = LlmClient::from_provider(
            mock.clone(),
            RetryPolicy::fixed(3, Duration::from_millis(1)),
        );

        assert_eq!(client.complete("x", None).await.unwrap(), "ok");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_typed_error() {
        let mock = Arc::new(MockProvider::always_fails(LlmError::RateLimited { retry_after: None }));
        let client = LlmClient::from_provider(mock, RetryPolicy::fixed(2, Duration::from_millis(1)));

        let err = client.complete("x", None).await.unwrap_err();
        assert!(err.is_rate_limit());
    }
}
