//! Speech for texts longer than one TTS request.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::assembler::AudioTools;
use crate::text::chunker::chunk_for_speech;
use crate::text::cleaner::clean_text;
use crate::tts::TtsBackend;
use crate::tts::openai::MAX_INPUT_CHARS;

/// What to say and how.
#[derive(Debug, Clone)]
pub struct SpeechJob<'a> {
    pub voice: &'a str,
    pub chunk_size: usize,
    pub attempts: u32,
}

/// Clean and chunk `text`, synthesize every chunk and join them into
/// `output`. Returns false when nothing speakable remains after cleaning.
pub async fn synthesize_long(
    tts: &dyn TtsBackend,
    tools: &AudioTools,
    text: &str,
    job: &SpeechJob<'_>,
    output: &Path,
) -> Result<bool> {
    let cleaned = clean_text(text);
    let chunks = chunk_for_speech(&cleaned, job.chunk_size.clamp(1, MAX_INPUT_CHARS));
    if chunks.is_empty() {
        return Ok(false);
    }

    if chunks.len() == 1 {
        tts.synthesize_with_retry(&chunks[0], job.voice, output, job.attempts)
            .await?;
        return Ok(true);
    }

    let temp_dir = tempfile::TempDir::new()?;
    let mut parts: Vec<PathBuf> = Vec::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        let part = temp_dir.path().join(format!("part_{:04}.mp3", i));
        tts.synthesize_with_retry(chunk, job.voice, &part, job.attempts)
            .await
            .with_context(|| format!("Speech for chunk {} of {} failed", i + 1, chunks.len()))?;
        parts.push(part);
    }

    tools.concat_mp3(&parts, output, None, &[])?;
    Ok(true)
}
