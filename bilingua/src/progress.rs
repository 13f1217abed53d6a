//! Resumable translation progress, kept next to the output file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Hash of the source EPUB the progress belongs to
    pub book_hash: String,
    /// 0-based index of the next section to translate
    pub next_section: usize,
    /// 1-based numbers of sections that failed and were skipped
    #[serde(default)]
    pub failed: Vec<usize>,
    pub updated_at: DateTime<Utc>,
}

impl Progress {
    pub fn new(book_hash: String) -> Self {
        Self {
            book_hash,
            next_section: 0,
            failed: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Mark section index `index` as finished.
    pub fn complete(&mut self, index: usize) {
        self.next_section = index + 1;
        self.failed.retain(|&n| n != index + 1);
    }

    /// Mark section index `index` as failed and move past it.
    pub fn fail(&mut self, index: usize) {
        self.next_section = index + 1;
        if !self.failed.contains(&(index + 1)) {
            self.failed.push(index + 1);
        }
    }
}

/// `<output>.progress.json`
pub fn progress_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_os_string();
    name.push(".progress.json");
    PathBuf::from(name)
}

/// Compute a hash of the book file.
///
/// Uses SHA256 of the first 1MB for speed with large files.
pub fn compute_book_hash(book_path: &Path) -> Result<String> {
    let file = File::open(book_path).context("Failed to open book file for hashing")?;
    let mut buffer = Vec::with_capacity(1024 * 1024);
    BufReader::new(file)
        .take(1024 * 1024)
        .read_to_end(&mut buffer)
        .context("Failed to read book file for hashing")?;

    let digest = Sha256::digest(&buffer);
    Ok(format!("{:x}", digest)[..16].to_string())
}

/// Saved progress for this book, or `None` when absent, unreadable, or
/// recorded for a different book.
pub fn load(path: &Path, book_hash: &str) -> Option<Progress> {
    let file = File::open(path).ok()?;
    match serde_json::from_reader::<_, Progress>(BufReader::new(file)) {
        Ok(progress) if progress.book_hash == book_hash => Some(progress),
        Ok(progress) => {
            log::warn!(
                "ignoring {}: recorded for book {}, not {}",
                path.display(),
                progress.book_hash,
                book_hash
            );
            None
        }
        Err(e) => {
            log::warn!("ignoring unreadable progress file {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save(path: &Path, progress: &Progress) -> Result<()> {
    let mut progress = progress.clone();
    progress.updated_at = Utc::now();

    let tmp = path.with_extension("json.tmp");
    let file = File::create(&tmp).context("Failed to create progress file")?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &progress)
        .context("Failed to write progress JSON")?;
    writer.flush()?;
    fs::rename(&tmp, path).context("Failed to replace progress file")?;
    Ok(())
}

pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_path() {
        assert_eq!(
            progress_path(Path::new("/books/maisie_Bilingual.txt")),
            PathBuf::from("/books/maisie_Bilingual.txt.progress.json")
        );
    }

    #[test]
    fn test_save_and_load_same_book() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt.progress.json");

        let mut progress = Progress::new("abc".into());
        progress.complete(0);
        progress.fail(1);
        progress.complete(2);
        save(&path, &progress).unwrap();

        let loaded = load(&path, "abc").unwrap();
        assert_eq!(loaded.next_section, 3);
        assert_eq!(loaded.failed, vec![2]);

        assert!(load(&path, "other").is_none());
        clear(&path).unwrap();
        assert!(load(&path, "abc").is_none());
    }

    #[test]
    fn test_retry_clears_failure() {
        let mut progress = Progress::new("h".into());
        progress.fail(4);
        progress.fail(4);
        assert_eq!(progress.failed, vec![5]);
        progress.complete(4);
        assert!(progress.failed.is_empty());
    }

    #[test]
    fn test_book_hash_depends_on_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.epub");
        let b = dir.path().join("b.epub");
        fs::write(&a, b"first").unwrap();
        fs::write(&b, b"second").unwrap();

        let hash = compute_book_hash(&a).unwrap();
        assert_eq!(hash.len(), 16);
        assert_eq!(hash, compute_book_hash(&a).unwrap());
        assert_ne!(hash, compute_book_hash(&b).unwrap());
    }
}
