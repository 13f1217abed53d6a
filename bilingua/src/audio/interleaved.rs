//! Interleaved audiobook: each original passage followed by its translation.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::assembler::{AudioTools, Tags};
use super::synth::{SpeechJob, synthesize_long};
use crate::bilingual::BilingualText;
use crate::config::AudioConfig;
use crate::tts::TtsBackend;
use crate::ui::progress_bar;

/// One piece of the finished recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clip {
    Speech { text: String, voice: String },
    Silence(u64),
}

/// `<stem>.mp3`, or `<stem>_from_N.mp3` when starting after segment 1.
pub fn output_path(input: &Path, start_from: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audiobook".to_string());
    let suffix = if start_from > 1 {
        format!("_from_{}", start_from)
    } else {
        String::new()
    };
    input.with_file_name(format!("{}{}.mp3", stem, suffix))
}

/// Title and artist from the file header, with fallbacks.
pub fn tags_for(text: &BilingualText) -> Tags {
    Tags {
        title: text.title.clone().unwrap_or_else(|| "Unknown Title".to_string()),
        artist: text.author.clone().unwrap_or_else(|| "Unknown Author".to_string()),
    }
}

/// Clips from segment `start_from` (1-based) on: original, gap, and when
/// there is a translation, the translation and a double gap.
pub fn plan(text: &BilingualText, config: &AudioConfig, start_from: usize) -> Vec<Clip> {
    let gap = config.segment_gap_ms;
    let mut clips = Vec::new();

    for section in text.sections.iter().skip(start_from.saturating_sub(1)) {
        let original = section.original_text();
        if original.trim().is_empty() {
            continue;
        }
        clips.push(Clip::Speech {
            text: original,
            voice: config.original_voice.clone(),
        });
        clips.push(Clip::Silence(gap));

        let translation = section.translation_text();
        if !translation.trim().is_empty() {
            clips.push(Clip::Speech {
                text: translation,
                voice: config.translation_voice.clone(),
            });
            clips.push(Clip::Silence(gap * 2));
        }
    }

    clips
}

/// Synthesize or generate every clip into `work_dir`, reusing one file per
/// silence length. Returns the files in playback order.
pub async fn render_clips(
    tts: &dyn TtsBackend,
    tools: &AudioTools,
    clips: &[Clip],
    config: &AudioConfig,
    attempts: u32,
    work_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(clips.len());
    let mut silences: HashMap<u64, PathBuf> = HashMap::new();
    let pb = progress_bar(clips.len());

    for (i, clip) in clips.iter().enumerate() {
        match clip {
            Clip::Speech { text, voice } => {
                let path = work_dir.join(format!("clip_{:05}.mp3", i));
                let job = SpeechJob {
                    voice,
                    chunk_size: config.chunk_size,
                    attempts,
                };
                let spoken = synthesize_long(tts, tools, text, &job, &path)
                    .await
                    .with_context(|| format!("Speech for clip {} failed", i + 1))?;
                if spoken {
                    files.push(path);
                }
            }
            Clip::Silence(ms) => {
                let path = match silences.get(ms) {
                    Some(path) => path.clone(),
                    None => {
                        let path = work_dir.join(format!("silence_{}.mp3", ms));
                        tools.silence(*ms, &path)?;
                        silences.insert(*ms, path.clone());
                        path
                    }
                };
                files.push(path);
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok(files)
}

/// Build the interleaved MP3 for `text`, read from `input`.
pub async fn build_interleaved(
    tts: &dyn TtsBackend,
    tools: &AudioTools,
    text: &BilingualText,
    input: &Path,
    config: &AudioConfig,
    attempts: u32,
    start_from: usize,
) -> Result<PathBuf> {
    let start_from = start_from.max(1);
    let tags = tags_for(text);
    let total = text.sections.len();
    if start_from > total {
        anyhow::bail!("Start segment {} is past the last segment ({})", start_from, total);
    }

    eprintln!("Generating interleaved audio for: {} by {}", tags.title, tags.artist);
    eprintln!("Starting from segment {} of {}", start_from, total);
    log::info!("speech backend: {}", tts.name());

    let clips = plan(text, config, start_from);
    let work_dir = tempfile::TempDir::new()?;
    let files = render_clips(tts, tools, &clips, config, attempts, work_dir.path()).await?;

    let output = output_path(input, start_from);
    tools.concat_mp3(&files, &output, Some(&tags), &[])?;
    log::info!("audiobook written to {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilingual::Section;

    fn section(number: usize, original: &str, translation: Option<&str>) -> Section {
        Section {
            number,
            original_html: format!("<p>{}</p>", original),
            translation_html: translation.map(|t| format!("<p>{}</p>", t)),
            chapter: None,
            canto: None,
            roman_heading: None,
        }
    }

    fn text() -> BilingualText {
        BilingualText {
            title: Some("Les Fleurs".into()),
            author: None,
            sections: vec![
                section(1, "Un", Some("One")),
                section(2, "Deux", None),
                section(3, "Trois", Some("Three")),
            ],
        }
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path(Path::new("/b/fleurs.txt"), 1), PathBuf::from("/b/fleurs.mp3"));
        assert_eq!(output_path(Path::new("/b/fleurs.txt"), 7), PathBuf::from("/b/fleurs_from_7.mp3"));
    }

    #[test]
    fn test_tags_fallback() {
        let tags = tags_for(&text());
        assert_eq!(tags.title, "Les Fleurs");
        assert_eq!(tags.artist, "Unknown Author");
    }

    #[test]
    fn test_plan_gaps_and_voices() {
        let config = AudioConfig::default();
        let clips = plan(&text(), &config, 1);
        let speech = |text: &str, voice: &str| Clip::Speech {
            text: text.to_string(),
            voice: voice.to_string(),
        };

        assert_eq!(
            clips,
            vec![
                speech("Un", "onyx"),
                Clip::Silence(1500),
                speech("One", "alloy"),
                Clip::Silence(3000),
                speech("Deux", "onyx"),
                Clip::Silence(1500),
                speech("Trois", "onyx"),
                Clip::Silence(1500),
                speech("Three", "alloy"),
                Clip::Silence(3000),
            ]
        );
    }

    #[test]
    fn test_plan_start_from() {
        let clips = plan(&text(), &AudioConfig::default(), 3);
        assert_eq!(clips.len(), 4);
        assert!(matches!(&clips[0], Clip::Speech { text, .. } if text == "Trois"));
    }

    #[tokio::test]
    async fn test_start_past_end_rejected() {
        let tts = crate::tts::testing::RecordingTts::default();
        let tools = AudioTools::new("ffmpeg", "ffprobe");
        let err = build_interleaved(&tts, &tools, &text(), Path::new("x.txt"), &AudioConfig::default(), 1, 9)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("past the last segment"));
        assert!(tts.calls().is_empty());
    }
}
