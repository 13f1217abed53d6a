//! LLM provider implementations

mod anthropic;
mod gemini;
mod http;
pub mod mock;
mod openai_compatible;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openai_compatible::OpenAICompatibleProvider;

use openai_compatible::{CEREBRAS_BASE_URL, OPENAI_BASE_URL, OPENROUTER_BASE_URL};

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{LlmError, Result};
use crate::provider::LlmProvider;

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Anthropic,
    OpenAI,
    OpenRouter,
    Cerebras,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "openrouter" => Ok(Self::OpenRouter),
            "cerebras" => Ok(Self::Cerebras),
            _ => Err(LlmError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Cerebras => "CEREBRAS_API_KEY",
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::Anthropic => "Anthropic",
            Self::OpenAI => "OpenAI",
            Self::OpenRouter => "OpenRouter",
            Self::Cerebras => "Cerebras",
        }
    }
}

/// Create a provider instance from a preset and optional config
pub fn get_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn LlmProvider>> {
    let kind = ProviderKind::from_str(&preset.provider)?;
    let api_key = get_api_key(provider_config, kind)?;
    let base_url = provider_config.and_then(|c| c.base_url.as_deref());

    let provider: Box<dyn LlmProvider> = match kind {
        ProviderKind::Gemini => Box::new(GeminiProvider::new(&preset.model, api_key, base_url)?),
        ProviderKind::Anthropic => {
            Box::new(AnthropicProvider::new(&preset.model, api_key, base_url)?)
        }
        ProviderKind::OpenAI => Box::new(OpenAICompatibleProvider::new(
            &preset.model,
            base_url.unwrap_or(OPENAI_BASE_URL),
            api_key,
            "OpenAI",
        )?),
        ProviderKind::OpenRouter => Box::new(OpenAICompatibleProvider::new(
            &preset.model,
            base_url.unwrap_or(OPENROUTER_BASE_URL),
            api_key,
            "OpenRouter",
        )?),
        ProviderKind::Cerebras => Box::new(OpenAICompatibleProvider::new(
            &preset.model,
            base_url.unwrap_or(CEREBRAS_BASE_URL),
            api_key,
            "Cerebras",
        )?),
    };

    Ok(provider)
}

/// Get API key from config or environment variable
pub fn get_api_key(config: Option<&ProviderConfig>, kind: ProviderKind) -> Result<String> {
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    std::env::var(kind.env_var())
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| LlmError::MissingApiKey {
            provider: kind.label().to_string(),
            env_var: kind.env_var().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!(ProviderKind::from_str("Gemini").unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::from_str("google").unwrap(), ProviderKind::Gemini);
        assert_eq!(ProviderKind::from_str("openai").unwrap(), ProviderKind::OpenAI);
        assert!(ProviderKind::from_str("claude-cli").is_err());
    }

    #[test]
    fn test_api_key_from_config_wins() {
        let config = ProviderConfig {
            api_key: Some("from-config".to_string()),
            base_url: None,
        };
        let key = get_api_key(Some(&config), ProviderKind::Cerebras).unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn test_get_provider_with_configured_key() {
        let preset = ModelPreset {
            provider: "openrouter".to_string(),
            model: "meta-llama/llama-3.3-70b-instruct".to_string(),
        };
        let config = ProviderConfig {
            api_key: Some("k".to_string()),
            base_url: None,
        };
        let provider = get_provider(&preset, Some(&config)).unwrap();
        assert_eq!(provider.name(), "OpenRouter");
    }
}
