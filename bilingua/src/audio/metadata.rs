//! FFmpeg metadata for MP3 chapter markers.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A chapter marker in the finished MP3.
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterInfo {
    pub title: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl ChapterInfo {
    pub fn new(title: impl Into<String>, start_ms: u64, end_ms: u64) -> Self {
        Self {
            title: title.into(),
            start_ms,
            end_ms,
        }
    }

    /// Start offset in seconds, rounded to hundredths.
    pub fn start_secs(&self) -> f64 {
        (self.start_ms as f64 / 10.0).round() / 100.0
    }
}

/// Write an FFMETADATA1 file with global tags and chapter markers.
pub fn create_ffmpeg_metadata(
    title: &str,
    artist: &str,
    chapters: &[ChapterInfo],
    output_path: &Path,
) -> Result<()> {
    let mut file = File::create(output_path).context("Failed to create metadata file")?;

    writeln!(file, ";FFMETADATA1")?;
    writeln!(file, "title={}", escape_metadata_value(title))?;
    writeln!(file, "artist={}", escape_metadata_value(artist))?;
    writeln!(file, "album={}", escape_metadata_value(title))?;
    writeln!(file, "genre=Audiobook")?;
    writeln!(file)?;

    for chapter in chapters {
        writeln!(file, "[CHAPTER]")?;
        writeln!(file, "TIMEBASE=1/1000")?;
        writeln!(file, "START={}", chapter.start_ms)?;
        writeln!(file, "END={}", chapter.end_ms)?;
        writeln!(file, "title={}", escape_metadata_value(&chapter.title))?;
        writeln!(file)?;
    }

    Ok(())
}

/// FFmpeg metadata values escape `= ; # \` and newlines.
fn escape_metadata_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '=' | ';' | '#' | '\\' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Chapter markers from clip durations and (title, first clip index) pairs.
/// A chapter runs to the start of the next one, the last to the end.
pub fn build_chapter_info(
    clip_durations_ms: &[u64],
    chapter_starts: &[(String, usize)],
) -> Vec<ChapterInfo> {
    chapter_starts
        .iter()
        .enumerate()
        .map(|(i, (title, first_clip))| {
            let end_clip = chapter_starts
                .get(i + 1)
                .map_or(clip_durations_ms.len(), |(_, next)| *next);
            let first = (*first_clip).min(clip_durations_ms.len());
            let end = end_clip.min(clip_durations_ms.len());

            ChapterInfo::new(
                title.clone(),
                clip_durations_ms[..first].iter().sum(),
                clip_durations_ms[..end].iter().sum(),
            )
        })
        .collect()
}
