//! Section-by-section translation of an EPUB into the bilingual file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::bilingual::writer;
use crate::config::TranslationConfig;
use crate::epub::{Book, Document, parse_epub};
use crate::llm::LlmClient;
use crate::progress::{self, Progress};
use crate::text::html::{lines_to_paragraphs, strip_tags};
use crate::text::truncate_chars;
use crate::ui::progress_bar;

#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Process at most this many sections from the resume point
    pub limit: Option<usize>,
    /// Discard saved progress and existing output
    pub restart: bool,
    /// Output path; `<epub stem>_Bilingual.txt` next to the EPUB when unset
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Every section in range was attempted
    Finished,
    /// The provider kept refusing with rate-limit errors
    QuotaExhausted,
}

#[derive(Debug, Clone)]
pub struct TranslationReport {
    pub output: PathBuf,
    pub total_sections: usize,
    pub translated: usize,
    /// 1-based numbers of sections skipped after errors in this run
    pub failed: Vec<usize>,
    pub next_section: usize,
    pub stop: StopReason,
}

/// `<dir>/<stem>_Bilingual.txt`
pub fn default_output_path(epub_path: &Path) -> PathBuf {
    let stem = epub_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());
    epub_path.with_file_name(format!("{}_Bilingual.txt", stem))
}

pub struct Translator<'a> {
    client: &'a LlmClient,
    config: &'a TranslationConfig,
}

impl<'a> Translator<'a> {
    pub fn new(client: &'a LlmClient, config: &'a TranslationConfig) -> Self {
        Self { client, config }
    }

    /// Translate one section's paragraph markup. The model sees plain text;
    /// the reply's non-empty lines become paragraphs.
    pub async fn translate_section(&self, section_html: &str) -> llm_client::Result<String> {
        let plain = strip_tags(section_html);
        let prompt = truncate_chars(plain.trim(), self.config.max_input_chars);
        let reply = self
            .client
            .complete(prompt, Some(&self.config.system_prompt))
            .await?;
        Ok(lines_to_paragraphs(reply.trim()))
    }

    /// Translate `epub_path` into the bilingual file, resuming where a
    /// previous run stopped.
    pub async fn run(&self, epub_path: &Path, options: &TranslateOptions) -> Result<TranslationReport> {
        let book = parse_epub(epub_path)?;
        let book_hash = progress::compute_book_hash(epub_path)?;
        let output = options
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(epub_path));

        eprintln!("Book: {} by {}", book.title, book.author.as_deref().unwrap_or("Unknown"));
        eprintln!("Output: {}", output.display());

        self.run_book(&book, &book_hash, &output, options).await
    }

    pub async fn run_book(
        &self,
        book: &Book,
        book_hash: &str,
        output: &Path,
        options: &TranslateOptions,
    ) -> Result<TranslationReport> {
        let sections: Vec<&Document> = book.sections(self.config.min_section_chars).collect();
        let progress_file = progress::progress_path(output);

        if options.restart {
            progress::clear(&progress_file)?;
            if output.exists() {
                fs::remove_file(output)
                    .with_context(|| format!("Failed to remove {}", output.display()))?;
            }
        }

        let mut progress = progress::load(&progress_file, book_hash)
            .unwrap_or_else(|| Progress::new(book_hash.to_string()));

        let start = progress.next_section.min(sections.len());
        let end = match options.limit {
            Some(limit) => {
                eprintln!("LIMIT ACTIVE: processing {} sections", limit);
                (start + limit).min(sections.len())
            }
            None => sections.len(),
        };

        let mut report = TranslationReport {
            output: output.to_path_buf(),
            total_sections: sections.len(),
            translated: 0,
            failed: Vec::new(),
            next_section: start,
            stop: StopReason::Finished,
        };

        if start >= end {
            eprintln!("Nothing to translate ({} of {} sections done)", start, sections.len());
            return Ok(report);
        }

        eprintln!("Resuming from section {} of {}", start + 1, sections.len());

        let pb = progress_bar(end - start);

        for (index, document) in sections.iter().enumerate().take(end).skip(start) {
            let number = index + 1;
            pb.set_message(format!("section {}", number));

            tokio::time::sleep(self.config.pacing()).await;

            let original = document.section_html();
            match self.translate_section(&original).await {
                Ok(translation) => {
                    let mut entry = String::new();
                    if fs::metadata(output).map(|m| m.len() == 0).unwrap_or(true) {
                        entry.push_str(&writer::header(&book.title, book.author.as_deref()));
                    }
                    if let Some(title) = &document.title {
                        entry.push_str(&writer::chapter_boundary(title));
                    }
                    entry.push_str(&writer::section(number, &original, &translation));
                    writer::append_entry(output, &entry)?;

                    progress.complete(index);
                    report.translated += 1;
                    log::debug!("section {} translated ({} chars)", number, translation.len());
                }
                Err(e) if e.is_rate_limit() => {
                    pb.abandon_with_message("quota exhausted");
                    eprintln!("\nQUOTA EXHAUSTED at section {}: {}", number, e);
                    progress::save(&progress_file, &progress)?;
                    report.next_section = progress.next_section;
                    report.stop = StopReason::QuotaExhausted;
                    return Ok(report);
                }
                Err(e) if e.is_auth_failure() => {
                    pb.abandon();
                    progress::save(&progress_file, &progress)?;
                    return Err(e).context("Provider rejected the API key");
                }
                Err(e) => {
                    log::error!("section {} failed: {}", number, e);
                    progress.fail(index);
                    report.failed.push(number);
                }
            }

            progress::save(&progress_file, &progress)?;
            pb.inc(1);
        }

        pb.finish_with_message("done");
        report.next_section = progress.next_section;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilingual;
    use llm_client::{LlmError, MockProvider, RetryPolicy};
    use std::sync::Arc;

    fn config() -> TranslationConfig {
        TranslationConfig {
            pacing_secs: 0,
            ..TranslationConfig::default()
        }
    }

    fn document(id: &str, title: Option<&str>, paragraphs: &[&str]) -> Document {
        Document {
            id: id.to_string(),
            html: String::new(),
            title: title.map(str::to_string),
            paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
            is_navigation: false,
        }
    }

    fn book() -> Book {
        Book {
            title: "Maisie".into(),
            author: Some("Henry James".into()),
            documents: vec![
                document("cover", None, &["<p>x</p>"]),
                document("c1", Some("Chapter I"), &["<p>The litigation had seemed interminable.</p>"]),
                document("c2", None, &["<p>It was a pity, she was told, and then again.</p>"]),
                document("c3", Some("Chapter II"), &["<p>Her father was the handsomest of men.</p>"]),
            ],
        }
    }

    #[tokio::test]
    async fn test_translates_and_writes_bilingual_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("maisie_Bilingual.txt");
        let mock = Arc::new(MockProvider::always_succeeds("Line one.\n\nLine two."));
        let client = LlmClient::from_provider(mock.clone(), RetryPolicy::none());
        let config = config();

        let report = Translator::new(&client, &config)
            .run_book(&book(), "hash", &output, &TranslateOptions::default())
            .await
            .unwrap();

        assert_eq!(report.total_sections, 3);
        assert_eq!(report.translated, 3);
        assert_eq!(report.stop, StopReason::Finished);
        assert_eq!(mock.prompts()[0], "The litigation had seemed interminable.");
        assert!(mock.last_system_prompt().unwrap().contains("professional translator"));

        let parsed = bilingual::parse(&fs::read_to_string(&output).unwrap());
        assert_eq!(parsed.title.as_deref(), Some("Maisie"));
        assert_eq!(parsed.sections.len(), 3);
        assert_eq!(parsed.sections[0].chapter.as_deref(), Some("Chapter I"));
        assert_eq!(parsed.sections[1].chapter, None);
        assert_eq!(
            parsed.sections[2].translation_html.as_deref(),
            Some("<p>Line one.</p><p>Line two.</p>")
        );
    }

    #[tokio::test]
    async fn test_limit_and_resume() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let mock = Arc::new(MockProvider::always_succeeds("T"));
        let client = LlmClient::from_provider(mock.clone(), RetryPolicy::none());
        let config = config();
        let translator = Translator::new(&client, &config);

        let limited = TranslateOptions {
            limit: Some(2),
            ..Default::default()
        };
        let first = translator.run_book(&book(), "h", &output, &limited).await.unwrap();
        assert_eq!(first.translated, 2);
        assert_eq!(first.next_section, 2);

        let second = translator
            .run_book(&book(), "h", &output, &TranslateOptions::default())
            .await
            .unwrap();
        assert_eq!(second.translated, 1);
        assert_eq!(mock.call_count(), 3);

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(content.matches("TITLE: ").count(), 1);
        let numbers: Vec<usize> = bilingual::parse(&content).sections.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_progress_for_other_book_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let mut stale = Progress::new("other".into());
        stale.next_section = 3;
        progress::save(&progress::progress_path(&output), &stale).unwrap();

        let mock = Arc::new(MockProvider::always_succeeds("T"));
        let client = LlmClient::from_provider(mock, RetryPolicy::none());
        let config = config();
        let report = Translator::new(&client, &config)
            .run_book(&book(), "mine", &output, &TranslateOptions::default())
            .await
            .unwrap();
        assert_eq!(report.translated, 3);
    }

    #[tokio::test]
    async fn test_quota_exhaustion_stops_run() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let mock = Arc::new(MockProvider::scripted(vec![
            Ok("uno".into()),
            Err(LlmError::RateLimited { retry_after: None }),
        ]));
        let client = LlmClient::from_provider(mock.clone(), RetryPolicy::none());
        let config = config();

        let report = Translator::new(&client, &config)
            .run_book(&book(), "h", &output, &TranslateOptions::default())
            .await
            .unwrap();

        assert_eq!(report.stop, StopReason::QuotaExhausted);
        assert_eq!(report.translated, 1);
        assert_eq!(report.next_section, 1);
        assert_eq!(mock.call_count(), 2);

        let saved = progress::load(&progress::progress_path(&output), "h").unwrap();
        assert_eq!(saved.next_section, 1);
    }

    #[tokio::test]
    async fn test_failed_section_skipped_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let mock = Arc::new(MockProvider::scripted(vec![
            Ok("uno".into()),
            Err(LlmError::ApiError {
                message: "blocked".into(),
                status_code: Some(400),
            }),
        ]));
        let client = LlmClient::from_provider(mock, RetryPolicy::none());
        let config = config();

        let report = Translator::new(&client, &config)
            .run_book(&book(), "h", &output, &TranslateOptions::default())
            .await
            .unwrap();

        assert_eq!(report.translated, 2);
        assert_eq!(report.failed, vec![2]);
        assert_eq!(report.next_section, 3);

        let numbers: Vec<usize> = bilingual::parse(&fs::read_to_string(&output).unwrap())
            .sections
            .iter()
            .map(|s| s.number)
            .collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_restart_truncates_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.txt");
        let mock = Arc::new(MockProvider::always_succeeds("T"));
        let client = LlmClient::from_provider(mock, RetryPolicy::none());
        let config = config();
        let translator = Translator::new(&client, &config);

        translator.run_book(&book(), "h", &output, &TranslateOptions::default()).await.unwrap();
        let restart = TranslateOptions {
            restart: true,
            ..Default::default()
        };
        let report = translator.run_book(&book(), "h", &output, &restart).await.unwrap();
        assert_eq!(report.translated, 3);

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(bilingual::parse(&content).sections.len(), 3);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/books/what_maisie_knew.epub")),
            PathBuf::from("/books/what_maisie_knew_Bilingual.txt")
        );
    }
}
