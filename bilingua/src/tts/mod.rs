//! TTS backend trait and the backend factory.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::config::AudioConfig;

/// TTS backend trait - all speech engines implement this.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Synthesize `text` in `voice` to an MP3 file.
    async fn synthesize(&self, text: &str, voice: &str, output_path: &Path) -> Result<()>;

    /// Synthesize, trying up to `max_attempts` times.
    async fn synthesize_with_retry(
        &self,
        text: &str,
        voice: &str,
        output_path: &Path,
        max_attempts: u32,
    ) -> Result<()> {
        let mut last_error = None;

        for attempt in 0..max_attempts.max(1) {
            match self.synthesize(text, voice, output_path).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    eprintln!(
                        "Speech generation failed (attempt {}/{}): {}",
                        attempt + 1,
                        max_attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("All retry attempts failed")))
    }

    /// Backend name for log lines.
    fn name(&self) -> &str;
}

/// Create the configured TTS backend.
pub fn create_backend(config: &AudioConfig) -> Result<Box<dyn TtsBackend>> {
    Ok(Box::new(openai::OpenAiTts::from_config(config)?))
}
