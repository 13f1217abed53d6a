//! Per-chapter summaries of a bilingual file.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use super::format::{chapter_block, chapter_file_header};
use crate::bilingual::{BilingualText, ChapterGroup, writer::append_entry};
use crate::config::SummaryConfig;
use crate::llm::LlmClient;
use crate::text::truncate_chars;
use crate::ui::progress_bar;

static CHAPTER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^chapter\s+").unwrap());

const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a literary critic. Write concise, insightful analyses of book chapters.";

/// Lowercase, trimmed, without a leading `chapter`: `Chapter IV` → `iv`.
pub fn normalize_chapter(name: &str) -> String {
    CHAPTER_PREFIX
        .replace(&name.trim().to_lowercase(), "")
        .trim()
        .to_string()
}

#[derive(Debug, Clone, Default)]
pub struct ChapterRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ChapterRange {
    /// Titled chapters from `start` through `end`, both inclusive. An unknown
    /// start selects nothing; an unknown end runs to the last chapter.
    pub fn select<'a>(&self, chapters: &[ChapterGroup<'a>]) -> Vec<ChapterGroup<'a>> {
        let start = self.start.as_deref().map(normalize_chapter);
        let end = self.end.as_deref().map(normalize_chapter);

        let mut selected = Vec::new();
        let mut in_range = start.is_none();

        for chapter in chapters {
            let Some(title) = chapter.title else { continue };
            let normalized = normalize_chapter(title);

            if !in_range && start.as_deref() == Some(normalized.as_str()) {
                in_range = true;
            }
            if !in_range {
                continue;
            }

            selected.push(*chapter);
            if end.as_deref() == Some(normalized.as_str()) {
                break;
            }
        }

        selected
    }
}

#[derive(Debug)]
pub struct ChapterSummaryReport {
    pub output: PathBuf,
    pub written: usize,
    pub quota_exhausted: bool,
}

/// `<dir>/<stem>.out`
pub fn default_output_path(bilingual_path: &Path) -> PathBuf {
    bilingual_path.with_extension("out")
}

pub struct ChapterSummarizer<'a> {
    client: &'a LlmClient,
    config: &'a SummaryConfig,
    book_title: String,
    with_analysis: bool,
}

impl<'a> ChapterSummarizer<'a> {
    pub fn new(client: &'a LlmClient, config: &'a SummaryConfig, book_title: &str) -> Self {
        Self {
            client,
            config,
            book_title: book_title.to_string(),
            with_analysis: false,
        }
    }

    pub fn with_analysis(mut self, enabled: bool) -> Self {
        self.with_analysis = enabled;
        self
    }

    fn summary_prompt(&self, title: &str, text: &str) -> String {
        format!(
            "Summarize the following chapter from '{}' titled '{}'. Focus on plot points and character development:\n\n{}",
            self.book_title,
            title,
            truncate_chars(text, self.config.max_input_chars)
        )
    }

    fn analysis_prompt(&self, title: &str, text: &str) -> String {
        format!(
            "Write a brief literary analysis of the chapter titled '{}' from '{}'. Discuss themes, narrative technique and characterization in two or three short paragraphs:\n\n{}",
            title,
            self.book_title,
            truncate_chars(text, self.config.max_input_chars)
        )
    }

    /// Summarize the selected chapters of `text` into `output`, one flushed
    /// block per chapter. Stops early when the quota runs out.
    pub async fn run(
        &self,
        text: &BilingualText,
        source_name: &str,
        range: &ChapterRange,
        output: &Path,
    ) -> Result<ChapterSummaryReport> {
        let chapters = range.select(&text.chapters());
        if chapters.is_empty() {
            anyhow::bail!("No chapters in range {:?}..{:?}", range.start, range.end);
        }

        std::fs::write(output, chapter_file_header(source_name))
            .with_context(|| format!("Failed to create {}", output.display()))?;

        let mut report = ChapterSummaryReport {
            output: output.to_path_buf(),
            written: 0,
            quota_exhausted: false,
        };

        let pb = progress_bar(chapters.len());

        for chapter in &chapters {
            let title = chapter.title.unwrap_or("Untitled");
            pb.set_message(title.to_string());
            let body = chapter.original_text();

            let summary = match self.summarize(title, &body).await {
                Ok(summary) => summary,
                Err(e) if e.is_rate_limit() => {
                    pb.abandon_with_message("quota exhausted");
                    eprintln!("QUOTA EXHAUSTED while summarizing {}", title);
                    report.quota_exhausted = true;
                    return Ok(report);
                }
                Err(e) => {
                    log::error!("summary of {} failed: {}", title, e);
                    format!("Error during summarization: {}", e)
                }
            };

            let analysis = if self.with_analysis && !body.is_empty() {
                match self
                    .client
                    .complete(&self.analysis_prompt(title, &body), Some(ANALYSIS_SYSTEM_PROMPT))
                    .await
                {
                    Ok(analysis) => Some(analysis),
                    Err(e) if e.is_rate_limit() => {
                        append_entry(output, &chapter_block(title, &summary, None))?;
                        report.written += 1;
                        pb.abandon_with_message("quota exhausted");
                        eprintln!("QUOTA EXHAUSTED while analysing {}", title);
                        report.quota_exhausted = true;
                        return Ok(report);
                    }
                    Err(e) => {
                        log::warn!("analysis of {} failed: {}", title, e);
                        None
                    }
                }
            } else {
                None
            };

            append_entry(output, &chapter_block(title, &summary, analysis.as_deref()))?;
            report.written += 1;
            pb.inc(1);
        }

        pb.finish_with_message("done");
        Ok(report)
    }

    async fn summarize(&self, title: &str, body: &str) -> llm_client::Result<String> {
        if body.trim().is_empty() {
            return Ok("No content found for this chapter.".to_string());
        }
        let reply = self
            .client
            .complete(&self.summary_prompt(title, body), Some(&self.config.system_prompt))
            .await?;
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilingual::Section;
    use crate::summary::format::parse_chapter_summaries;
    use llm_client::{LlmError, MockProvider, RetryPolicy};
    use std::sync::Arc;

    fn text() -> BilingualText {
        let titles = [Some("Chapter I"), None, Some("Chapter II"), Some("Chapter III"), Some("Chapter IV")];
        BilingualText {
            title: Some("What Maisie Knew".into()),
            author: None,
            sections: titles
                .iter()
                .enumerate()
                .map(|(i, title)| Section {
                    number: i + 1,
                    original_html: format!("<p>Prose {}</p>", i + 1),
                    translation_html: None,
                    chapter: title.map(str::to_string),
                    canto: None,
                    roman_heading: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_normalize_chapter() {
        assert_eq!(normalize_chapter("Chapter IV"), "iv");
        assert_eq!(normalize_chapter("  CHAPTER   xii "), "xii");
        assert_eq!(normalize_chapter("Prologue"), "prologue");
    }

    #[test]
    fn test_range_selection() {
        let text = text();
        let chapters = text.chapters();
        let range = ChapterRange {
            start: Some("II".into()),
            end: Some("chapter iii".into()),
        };
        let titles: Vec<_> = range.select(&chapters).iter().map(|c| c.title).collect();
        assert_eq!(titles, vec![Some("Chapter II"), Some("Chapter III")]);

        let all = ChapterRange::default().select(&chapters);
        assert_eq!(all.len(), 4);

        // equality, not substring: "i" must not match "Chapter II"
        let first = ChapterRange {
            start: Some("i".into()),
            end: Some("i".into()),
        };
        let titles: Vec<_> = first.select(&chapters).iter().map(|c| c.title).collect();
        assert_eq!(titles, vec![Some("Chapter I")]);

        let unknown_start = ChapterRange {
            start: Some("Chapter L".into()),
            end: None,
        };
        assert!(unknown_start.select(&chapters).is_empty());

        let unknown_end = ChapterRange {
            start: Some("III".into()),
            end: Some("Epilogue".into()),
        };
        let titles: Vec<_> = unknown_end.select(&chapters).iter().map(|c| c.title).collect();
        assert_eq!(titles, vec![Some("Chapter III"), Some("Chapter IV")]);
    }

    #[tokio::test]
    async fn test_run_with_unknown_start_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("none.out");
        let mock = Arc::new(MockProvider::always_succeeds("unused"));
        let client = LlmClient::from_provider(mock.clone(), RetryPolicy::none());
        let config = SummaryConfig::default();
        let range = ChapterRange {
            start: Some("Chapter L".into()),
            end: None,
        };

        let err = ChapterSummarizer::new(&client, &config, "Maisie")
            .run(&text(), "x.txt", &range, &output)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No chapters in range"));
        assert_eq!(mock.call_count(), 0);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_run_writes_out_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("maisie_Bilingual.out");
        let mock = Arc::new(MockProvider::always_succeeds("A summary."));
        let client = LlmClient::from_provider(mock.clone(), RetryPolicy::none());
        let config = SummaryConfig::default();

        let range = ChapterRange {
            start: Some("I".into()),
            end: Some("II".into()),
        };
        let report = ChapterSummarizer::new(&client, &config, "What Maisie Knew")
            .run(&text(), "maisie_Bilingual.txt", &range, &output)
            .await
            .unwrap();

        assert_eq!(report.written, 2);
        let prompts = mock.prompts();
        assert!(prompts[0].starts_with("Summarize the following chapter from 'What Maisie Knew' titled 'Chapter I'"));
        assert!(prompts[0].ends_with("Prose 1 Prose 2"));

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("CHAPTER SUMMARIES FOR: maisie_Bilingual.txt\n"));
        let parsed = parse_chapter_summaries(&content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].title.as_deref(), Some("Chapter II"));
        assert_eq!(parsed[1].summary_html, "<p>A summary.</p>");
    }

    #[tokio::test]
    async fn test_analysis_and_quota_stop() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("x.out");
        let mock = Arc::new(MockProvider::scripted(vec![
            Ok("Summary one.".into()),
            Ok("Analysis one.".into()),
            Err(LlmError::RateLimited { retry_after: Some(60) }),
        ]));
        let client = LlmClient::from_provider(mock, RetryPolicy::none());
        let config = SummaryConfig::default();

        let report = ChapterSummarizer::new(&client, &config, "Maisie")
            .with_analysis(true)
            .run(&text(), "x.txt", &ChapterRange::default(), &output)
            .await
            .unwrap();

        assert!(report.quota_exhausted);
        assert_eq!(report.written, 1);
        let parsed = parse_chapter_summaries(&std::fs::read_to_string(&output).unwrap());
        assert_eq!(parsed[0].analysis_html.as_deref(), Some("<p>Analysis one.</p>"));
    }

    #[tokio::test]
    async fn test_quota_during_analysis_stops() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("x.out");
        let mock = Arc::new(MockProvider::scripted(vec![
            Ok("Summary one.".into()),
            Err(LlmError::RateLimited { retry_after: None }),
            Ok("never requested".into()),
        ]));
        let client = LlmClient::from_provider(mock.clone(), RetryPolicy::none());
        let config = SummaryConfig::default();

        let report = ChapterSummarizer::new(&client, &config, "Maisie")
            .with_analysis(true)
            .run(&text(), "x.txt", &ChapterRange::default(), &output)
            .await
            .unwrap();

        assert!(report.quota_exhausted);
        assert_eq!(report.written, 1);
        assert_eq!(mock.call_count(), 2);
        let parsed = parse_chapter_summaries(&std::fs::read_to_string(&output).unwrap());
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].summary_html, "<p>Summary one.</p>");
        assert_eq!(parsed[0].analysis_html, None);
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/b/maisie_Bilingual.txt")),
            PathBuf::from("/b/maisie_Bilingual.out")
        );
    }
}
