//! Narrated chapter audiobook with a chapter start map for web players.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::assembler::{AudioTools, Tags};
use super::interleaved::tags_for;
use super::metadata::build_chapter_info;
use super::synth::{SpeechJob, synthesize_long};
use crate::bilingual::BilingualText;
use crate::config::AudioConfig;
use crate::tts::TtsBackend;

pub const INDIVIDUAL_DIR: &str = "individual_chapters";

/// Prose of one chapter, opened by a Roman `<h2>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterText {
    pub numeral: String,
    pub text: String,
}

impl ChapterText {
    pub fn title(&self) -> String {
        format!("Chapter {}", self.numeral)
    }

    pub fn file_name(&self) -> String {
        format!("Chapter_{}.mp3", self.numeral)
    }
}

/// Where a chapter starts in the master file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterStart {
    pub name: String,
    pub start_secs: f64,
}

#[derive(Debug)]
pub struct ChapterAudioReport {
    /// Master MP3; `None` on a dry run
    pub output: Option<PathBuf>,
    pub chapters: Vec<ChapterStart>,
    pub skipped: Vec<String>,
}

/// Chapters of at least `min_chars` characters, at most `limit` of them.
/// Sections before the first Roman heading belong to no chapter.
pub fn collect_chapters(text: &BilingualText, min_chars: usize, limit: Option<usize>) -> Vec<ChapterText> {
    let mut chapters: Vec<ChapterText> = Vec::new();
    let mut current: Option<(String, Vec<String>)> = None;

    let finish = |current: Option<(String, Vec<String>)>, chapters: &mut Vec<ChapterText>| {
        if let Some((numeral, parts)) = current {
            let text = parts.join(" ").trim().to_string();
            if text.chars().count() < min_chars {
                log::info!("skipping Chapter {} ({} chars)", numeral, text.chars().count());
            } else {
                chapters.push(ChapterText { numeral, text });
            }
        }
    };

    for section in &text.sections {
        if let Some(numeral) = &section.roman_heading {
            finish(current.take(), &mut chapters);
            if limit.is_some_and(|n| chapters.len() >= n) {
                return chapters;
            }
            current = Some((numeral.clone(), Vec::new()));
        }

        if let Some((numeral, parts)) = current.as_mut() {
            let prose = section
                .original_text()
                .lines()
                .filter(|line| !line.trim().eq_ignore_ascii_case(numeral))
                .collect::<Vec<_>>()
                .join(" ");
            if !prose.trim().is_empty() {
                parts.push(prose);
            }
        }
    }
    finish(current, &mut chapters);

    if let Some(n) = limit {
        chapters.truncate(n);
    }
    chapters
}

/// Rough narration length: five characters a word, 2.5 words a second.
pub fn estimate_secs(chars: usize) -> f64 {
    (chars as f64 / 5.0) / 2.5
}

fn round2(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

/// Start offsets from estimates alone.
pub fn estimated_starts(chapters: &[ChapterText], gap_ms: u64) -> Vec<ChapterStart> {
    let gap = gap_ms as f64 / 1000.0;
    let mut offset = 0.0;
    chapters
        .iter()
        .map(|chapter| {
            let start = ChapterStart {
                name: chapter.title(),
                start_secs: round2(offset),
            };
            offset += estimate_secs(chapter.text.chars().count()) + gap;
            start
        })
        .collect()
}

/// `const chapterMap = {...};` for a web player script.
pub fn chapter_map_js(starts: &[ChapterStart]) -> String {
    let mut js = String::from("const chapterMap = {\n");
    for start in starts {
        js.push_str(&format!("    \"{}\": {},\n", start.name, start.start_secs));
    }
    js.push_str("};");
    js
}

/// `<stem>_chapters.json` next to the master file.
pub fn map_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audiobook".to_string());
    output.with_file_name(format!("{}_chapters.json", stem))
}

/// Chapter starts estimated from text length alone; nothing is synthesized.
pub fn dry_run(text: &BilingualText, config: &AudioConfig, limit: Option<usize>) -> Result<ChapterAudioReport> {
    let chapters = narrative_chapters(text, config, limit)?;
    for chapter in &chapters {
        eprintln!(
            "[DRY RUN] Would synthesize {} ({} chars)",
            chapter.title(),
            chapter.text.chars().count()
        );
    }
    Ok(ChapterAudioReport {
        output: None,
        chapters: estimated_starts(&chapters, config.chapter_gap_ms),
        skipped: Vec::new(),
    })
}

fn narrative_chapters(text: &BilingualText, config: &AudioConfig, limit: Option<usize>) -> Result<Vec<ChapterText>> {
    let chapters = collect_chapters(text, config.min_chapter_chars, limit);
    if chapters.is_empty() {
        anyhow::bail!("No chapters with a Roman numeral heading found");
    }
    eprintln!("Found {} narrative chapters", chapters.len());
    Ok(chapters)
}

pub async fn build_chapter_audio(
    tts: &dyn TtsBackend,
    tools: &AudioTools,
    text: &BilingualText,
    output: &Path,
    config: &AudioConfig,
    attempts: u32,
    limit: Option<usize>,
) -> Result<ChapterAudioReport> {
    let chapters = narrative_chapters(text, config, limit)?;
    log::info!("speech backend: {}, voice {}", tts.name(), config.narrator_voice);

    let individual_dir = output
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(INDIVIDUAL_DIR);
    std::fs::create_dir_all(&individual_dir)
        .with_context(|| format!("Failed to create {}", individual_dir.display()))?;

    let work_dir = tempfile::TempDir::new()?;
    let gap = work_dir.path().join("gap.mp3");
    tools.silence(config.chapter_gap_ms, &gap)?;
    let gap_ms = tools.duration_ms(&gap)?;

    let job = SpeechJob {
        voice: &config.narrator_voice,
        chunk_size: config.chunk_size,
        attempts,
    };

    let mut files = Vec::new();
    let mut durations = Vec::new();
    let mut starts: Vec<(String, usize)> = Vec::new();
    let mut skipped = Vec::new();

    for chapter in &chapters {
        eprintln!("  - Synthesizing {}...", chapter.title());
        let path = individual_dir.join(chapter.file_name());

        let spoken = match synthesize_long(tts, tools, &chapter.text, &job, &path).await {
            Ok(spoken) => spoken,
            Err(e) => {
                log::error!("{} failed: {:#}", chapter.title(), e);
                false
            }
        };
        if !spoken {
            skipped.push(chapter.title());
            continue;
        }

        starts.push((chapter.title(), files.len()));
        durations.push(tools.duration_ms(&path)?);
        files.push(path);
        durations.push(gap_ms);
        files.push(gap.clone());
    }

    if files.is_empty() {
        anyhow::bail!("No chapter could be synthesized");
    }

    let markers = build_chapter_info(&durations, &starts);
    let tags: Tags = tags_for(text);
    tools.concat_mp3(&files, output, Some(&tags), &markers)?;

    let chapter_starts: Vec<ChapterStart> = markers
        .iter()
        .map(|m| ChapterStart {
            name: m.title.clone(),
            start_secs: m.start_secs(),
        })
        .collect();

    let json = map_path(output);
    std::fs::write(&json, serde_json::to_string_pretty(&chapter_starts)?)
        .with_context(|| format!("Failed to write {}", json.display()))?;

    Ok(ChapterAudioReport {
        output: Some(output.to_path_buf()),
        chapters: chapter_starts,
        skipped,
    })
}
