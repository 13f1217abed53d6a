//! OpenAI speech endpoint backend.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::path::Path;

use super::TtsBackend;
use crate::config::AudioConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// The endpoint rejects longer inputs.
pub const MAX_INPUT_CHARS: usize = 4096;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
}

pub struct OpenAiTts {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    speed: f32,
}

impl OpenAiTts {
    pub fn new(api_key: String, base_url: Option<&str>, model: &str, speed: f32) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            speed: speed.clamp(0.25, 4.0),
        }
    }

    /// Key from the `openai` provider of llm.toml, else `OPENAI_API_KEY`.
    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        let llm_config = llm_client::Config::load()
            .map_err(|e| log::debug!("llm config unavailable: {}", e))
            .ok();
        let provider = llm_config.as_ref().and_then(|c| c.get_provider_config("openai"));

        let api_key = llm_client::providers::get_api_key(provider, llm_client::ProviderKind::OpenAI)
            .context("Speech synthesis needs an OpenAI API key")?;

        let base_url = config
            .tts_base_url
            .as_deref()
            .or_else(|| provider.and_then(|p| p.base_url.as_deref()));

        Ok(Self::new(api_key, base_url, &config.tts_model, config.speed))
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

#[async_trait]
impl TtsBackend for OpenAiTts {
    async fn synthesize(&self, text: &str, voice: &str, output_path: &Path) -> Result<()> {
        if text.chars().count() > MAX_INPUT_CHARS {
            anyhow::bail!(
                "Speech input of {} chars exceeds {}",
                text.chars().count(),
                MAX_INPUT_CHARS
            );
        }

        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice,
            speed: self.speed,
            response_format: "mp3",
        };

        log::debug!("TTS {} chars in voice {}", text.len(), voice);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Speech request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Speech API error (HTTP {}): {}", status.as_u16(), error_text);
        }

        let bytes = response.bytes().await.context("Failed to read speech audio")?;
        tokio::fs::write(output_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        Ok(())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
