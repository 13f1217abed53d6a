use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{LlmError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default preset to use when no --model flag is provided (fallback)
    #[serde(default = "default_preset")]
    pub default_preset: String,

    /// Per-program default presets (program name -> preset name)
    #[serde(default)]
    pub defaults: HashMap<String, String>,

    /// Named model presets for quick access
    #[serde(default)]
    pub presets: HashMap<String, ModelPreset>,

    /// Provider-specific configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_preset() -> String {
    "gemini-flash-lite".to_string()
}

/// A named model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPreset {
    /// Provider identifier (gemini, anthropic, openai, openrouter, cerebras)
    pub provider: String,

    /// Model name/identifier for the provider
    pub model: String,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL (proxies, local OpenAI-compatible servers)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, defaulting when absent
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.merge_builtin_presets();
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home =
            std::env::var("HOME").map_err(|_| LlmError::ConfigError("HOME not set".into()))?;
        Ok(PathBuf::from(home).join(".config/cli-programs/llm.toml"))
    }

    /// Get a preset by name
    pub fn get_preset(&self, name: &str) -> Result<&ModelPreset> {
        self.presets
            .get(name)
            .ok_or_else(|| LlmError::InvalidPreset(name.to_string()))
    }

    /// Get the default preset name for a specific program
    ///
    /// Falls back to `default_preset` if no program-specific default is set.
    pub fn get_default_for_program(&self, program: &str) -> &str {
        self.defaults
            .get(program)
            .map(String::as_str)
            .unwrap_or(&self.default_preset)
    }

    /// Get provider config by provider name
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.providers.get(provider)
    }

    /// Built-in presets the user has not overridden.
    fn merge_builtin_presets(&mut self) {
        for (name, preset) in builtin_presets() {
            self.presets.entry(name).or_insert(preset);
        }
    }
}

fn builtin_presets() -> HashMap<String, ModelPreset> {
    [
        ("gemini-flash-lite", "gemini", "gemini-2.0-flash-lite"),
        ("gemini-pro", "gemini", "gemini-2.5-pro"),
        ("anthropic-sonnet", "anthropic", "claude-sonnet-4-5"),
        ("openai-mini", "openai", "gpt-4o-mini"),
    ]
    .into_iter()
    .map(|(name, provider, model)| {
        (
            name.to_string(),
            ModelPreset {
                provider: provider.to_string(),
                model: model.to_string(),
            },
        )
    })
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
            defaults: HashMap::new(),
            presets: builtin_presets(),
            providers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_preset, "gemini-flash-lite");

        let preset = config.get_preset("gemini-flash-lite").unwrap();
        assert_eq!(preset.provider, "gemini");
        assert_eq!(preset.model, "gemini-2.0-flash-lite");
    }

    #[test]
    fn test_invalid_preset() {
        let config = Config::default();
        assert!(config.get_preset("nonexistent").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_preset, config.default_preset);
        assert_eq!(parsed.presets.len(), config.presets.len());
    }

    #[test]
    fn test_load_keeps_builtins_alongside_user_presets() {
        let dir = std::env::temp_dir().join(format!("llm-client-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("llm.toml");
        std::fs::write(
            &path,
            r#"
default_preset = "mine"

[presets.mine]
provider = "openai"
model = "gpt-4o"

[presets.gemini-pro]
provider = "gemini"
model = "gemini-2.5-flash"

[providers.openai]
base_url = "http://localhost:8080/v1"
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(config.get_preset("mine").unwrap().model, "gpt-4o");
        // user override kept, missing builtins added
        assert_eq!(config.get_preset("gemini-pro").unwrap().model, "gemini-2.5-flash");
        assert!(config.get_preset("gemini-flash-lite").is_ok());
        assert_eq!(
            config.get_provider_config("openai").unwrap().base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
    }

    #[test]
    fn test_get_default_for_program() {
        let mut config = Config::default();
        assert_eq!(config.get_default_for_program("bilingua"), "gemini-flash-lite");

        config
            .defaults
            .insert("bilingua".to_string(), "anthropic-sonnet".to_string());
        assert_eq!(config.get_default_for_program("bilingua"), "anthropic-sonnet");
        assert_eq!(config.get_default_for_program("other"), "gemini-flash-lite");
    }
}
