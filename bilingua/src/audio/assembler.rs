//! MP3 assembly with FFmpeg.

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use thiserror::Error;

use super::metadata::{ChapterInfo, create_ffmpeg_metadata};
use crate::config::AudioConfig;

/// OpenAI speech comes back as 24 kHz mono; silence is generated to match.
pub const SAMPLE_RATE: u32 = 24_000;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("{tool} could not be started: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {stderr}")]
    Failed { tool: String, stderr: String },

    #[error("Could not read duration of {path}: {output}")]
    Duration { path: PathBuf, output: String },

    #[error("No audio files provided")]
    NoInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(String),
}

pub type Result<T> = std::result::Result<T, AudioError>;

/// Title and artist tags for a finished file.
#[derive(Debug, Clone)]
pub struct Tags {
    pub title: String,
    pub artist: String,
}

/// FFmpeg and FFprobe locations.
#[derive(Debug, Clone)]
pub struct AudioTools {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl AudioTools {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(&config.ffmpeg, &config.ffprobe)
    }

    fn run(&self, mut cmd: Command, tool: &Path) -> Result<std::process::Output> {
        let tool = tool.display().to_string();
        log::debug!("running {:?}", cmd);
        let output = cmd.output().map_err(|source| AudioError::Spawn {
            tool: tool.clone(),
            source,
        })?;
        if !output.status.success() {
            return Err(AudioError::Failed {
                tool,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }

    /// Duration of an audio file in milliseconds.
    pub fn duration_ms(&self, audio_path: &Path) -> Result<u64> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(audio_path);

        let output = self.run(cmd, &self.ffprobe)?;
        let text = String::from_utf8_lossy(&output.stdout);
        let secs: f64 = text.trim().parse().map_err(|_| AudioError::Duration {
            path: audio_path.to_path_buf(),
            output: text.trim().to_string(),
        })?;

        Ok((secs * 1000.0).round() as u64)
    }

    /// Write `ms` milliseconds of silence as MP3.
    pub fn silence(&self, ms: u64, output_path: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-f", "lavfi", "-i"])
            .arg(format!("anullsrc=r={}:cl=mono", SAMPLE_RATE))
            .arg("-t")
            .arg(format!("{:.3}", ms as f64 / 1000.0))
            .args(["-c:a", "libmp3lame", "-b:a", "128k"])
            .arg(output_path);
        self.run(cmd, &self.ffmpeg)?;
        Ok(())
    }

    /// Concatenate `files` into one MP3, re-encoding so clips from
    /// different sources join cleanly. Tags and chapter markers are
    /// written when given.
    pub fn concat_mp3(
        &self,
        files: &[PathBuf],
        output_path: &Path,
        tags: Option<&Tags>,
        chapters: &[ChapterInfo],
    ) -> Result<()> {
        if files.is_empty() {
            return Err(AudioError::NoInput);
        }

        let temp_dir = TempDir::new()?;
        let list_file = temp_dir.path().join("concat_list.txt");
        std::fs::write(&list_file, concat_list(files))?;

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"]).arg(&list_file);

        if !chapters.is_empty() {
            let metadata_file = temp_dir.path().join("metadata.txt");
            let (title, artist) = tags
                .map(|t| (t.title.as_str(), t.artist.as_str()))
                .unwrap_or_default();
            create_ffmpeg_metadata(title, artist, chapters, &metadata_file)
                .map_err(|e| AudioError::Metadata(e.to_string()))?;
            cmd.arg("-i").arg(&metadata_file);
            cmd.args(["-map", "0:a", "-map_metadata", "1", "-map_chapters", "1"]);
        }

        if let Some(tags) = tags {
            cmd.arg("-metadata")
                .arg(format!("title={}", tags.title))
                .arg("-metadata")
                .arg(format!("artist={}", tags.artist));
        }

        cmd.args(["-c:a", "libmp3lame", "-b:a", "128k", "-id3v2_version", "3"])
            .arg(output_path);

        self.run(cmd, &self.ffmpeg)?;
        Ok(())
    }

    pub fn is_available(&self) -> bool {
        Command::new(&self.ffmpeg)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

/// Concat demuxer input; single quotes in paths are escaped.
fn concat_list(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|path| format!("file '{}'\n", path.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}
