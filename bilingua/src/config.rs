//! bilingua configuration: prompts, pacing, retry and audio settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const TRANSLATOR_PROMPT: &str = "You are a professional translator. Translate this 19th-century literary prose into clear, contemporary English. Maintain the emotional weight but use modern sentence structures and paragraphing.";

const SUMMARIZER_PROMPT: &str =
    "You are a literary assistant. Provide clear, concise summaries of book chapters.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BilinguaConfig {
    #[serde(default)]
    pub translation: TranslationConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub summary: SummaryConfig,

    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// System instruction sent with every section
    #[serde(default = "default_translator_prompt")]
    pub system_prompt: String,

    /// Characters of section text sent per request
    #[serde(default = "default_translation_chars")]
    pub max_input_chars: usize,

    /// Wait before each request (free-tier quotas allow ~3 requests/minute)
    #[serde(default = "default_pacing_secs")]
    pub pacing_secs: u64,

    /// Documents with this much paragraph markup or less are skipped
    #[serde(default = "default_min_section_chars")]
    pub min_section_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_retry_delay_secs")]
    pub delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Characters of chapter text sent per request
    #[serde(default = "default_summary_chars")]
    pub max_input_chars: usize,

    /// Title used in prompts; the bilingual file's TITLE when unset
    #[serde(default)]
    pub book_title: Option<String>,

    #[serde(default = "default_summarizer_prompt")]
    pub system_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// OpenAI speech model
    #[serde(default = "default_tts_model")]
    pub tts_model: String,

    /// Speech endpoint base URL (OpenAI-compatible)
    #[serde(default)]
    pub tts_base_url: Option<String>,

    #[serde(default = "default_original_voice")]
    pub original_voice: String,

    #[serde(default = "default_translation_voice")]
    pub translation_voice: String,

    /// Voice for chapter audiobooks
    #[serde(default = "default_narrator_voice")]
    pub narrator_voice: String,

    #[serde(default = "default_speed")]
    pub speed: f32,

    /// Silence between original and translation
    #[serde(default = "default_segment_gap_ms")]
    pub segment_gap_ms: u64,

    /// Silence after each chapter
    #[serde(default = "default_chapter_gap_ms")]
    pub chapter_gap_ms: u64,

    /// Shorter chapters are treated as structural fragments
    #[serde(default = "default_min_chapter_chars")]
    pub min_chapter_chars: usize,

    /// Largest text per speech request
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: PathBuf,
}

fn default_translator_prompt() -> String {
    TRANSLATOR_PROMPT.to_string()
}

fn default_translation_chars() -> usize {
    12_000
}

fn default_pacing_secs() -> u64 {
    20
}

fn default_min_section_chars() -> usize {
    30
}

fn default_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_summary_chars() -> usize {
    15_000
}

fn default_summarizer_prompt() -> String {
    SUMMARIZER_PROMPT.to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_original_voice() -> String {
    "onyx".to_string()
}

fn default_translation_voice() -> String {
    "alloy".to_string()
}

fn default_narrator_voice() -> String {
    "fable".to_string()
}

fn default_speed() -> f32 {
    1.0
}

fn default_segment_gap_ms() -> u64 {
    1500
}

fn default_chapter_gap_ms() -> u64 {
    2000
}

fn default_min_chapter_chars() -> usize {
    150
}

fn default_chunk_size() -> usize {
    4000
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe() -> PathBuf {
    PathBuf::from("ffprobe")
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_translator_prompt(),
            max_input_chars: default_translation_chars(),
            pacing_secs: default_pacing_secs(),
            min_section_chars: default_min_section_chars(),
        }
    }
}

impl TranslationConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_secs: default_retry_delay_secs(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> llm_client::RetryPolicy {
        llm_client::RetryPolicy::fixed(self.attempts, Duration::from_secs(self.delay_secs))
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_summary_chars(),
            book_title: None,
            system_prompt: default_summarizer_prompt(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            tts_model: default_tts_model(),
            tts_base_url: None,
            original_voice: default_original_voice(),
            translation_voice: default_translation_voice(),
            narrator_voice: default_narrator_voice(),
            speed: default_speed(),
            segment_gap_ms: default_segment_gap_ms(),
            chapter_gap_ms: default_chapter_gap_ms(),
            min_chapter_chars: default_min_chapter_chars(),
            chunk_size: default_chunk_size(),
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

impl BilinguaConfig {
    /// ~/.config/cli-programs/bilingua.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("HOME not set")?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("bilingua.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BilinguaConfig::default();
        assert_eq!(config.translation.max_input_chars, 12_000);
        assert_eq!(config.translation.pacing(), Duration::from_secs(20));
        assert!(config.translation.system_prompt.contains("contemporary English"));
        assert_eq!(config.retry.attempts, 3);
        assert_eq!(config.summary.max_input_chars, 15_000);
        assert_eq!(config.audio.segment_gap_ms, 1500);
        assert_eq!(config.audio.chapter_gap_ms, 2000);
        assert_eq!(config.audio.min_chapter_chars, 150);
    }

    #[test]
    fn test_parse_partial_config() {
        let config: BilinguaConfig = toml::from_str(
            r#"
[translation]
pacing_secs = 4

[audio]
original_voice = "echo"
ffmpeg = "/opt/ffmpeg/bin/ffmpeg"
"#,
        )
        .unwrap();

        assert_eq!(config.translation.pacing_secs, 4);
        assert_eq!(config.translation.max_input_chars, 12_000);
        assert_eq!(config.audio.original_voice, "echo");
        assert_eq!(config.audio.translation_voice, "alloy");
        assert_eq!(config.audio.ffmpeg, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.retry.delay_secs, 10);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: BilinguaConfig = toml::from_str("").unwrap();
        assert_eq!(config.audio.tts_model, "tts-1");
        assert!(config.summary.book_title.is_none());
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BilinguaConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.retry.attempts, 3);
    }

    #[test]
    fn test_retry_policy() {
        let policy = RetryConfig::default().policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_secs(10));
    }
}
