//! Connectivity and extraction checks run before committing to a full book.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::TranslationConfig;
use crate::epub::{Document, parse_epub};
use crate::llm::LlmClient;
use crate::text::html::html_to_text;
use crate::text::truncate_chars;
use crate::translate::Translator;

const CHECK_PROMPT: &str = "Say 'System Ready'";

/// Documents with this much text or less are passed over by `sample`.
const SAMPLE_MIN_CHARS: usize = 100;

/// Characters of the sample translation echoed to the terminal.
pub const SAMPLE_PREVIEW_CHARS: usize = 500;

/// What the provider said to the readiness prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    Ready,
    /// Answered, but not with the expected words
    Unexpected(String),
    QuotaExhausted(String),
    InvalidKey(String),
    Failed(String),
}

impl CheckOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, CheckOutcome::Ready | CheckOutcome::Unexpected(_))
    }

    pub fn describe(&self) -> String {
        match self {
            CheckOutcome::Ready => "SUCCESS: the model answered 'System Ready'".to_string(),
            CheckOutcome::Unexpected(reply) => {
                format!("SUCCESS with unexpected reply: {}", reply.trim())
            }
            CheckOutcome::QuotaExhausted(e) => format!("QUOTA EXHAUSTED: {}", e),
            CheckOutcome::InvalidKey(e) => format!("INVALID API KEY: {}", e),
            CheckOutcome::Failed(e) => format!("ERROR: {}", e),
        }
    }
}

/// Send the readiness prompt and classify the result.
pub async fn check(client: &LlmClient) -> CheckOutcome {
    match client.complete(CHECK_PROMPT, None).await {
        Ok(reply) if reply.contains("System Ready") => CheckOutcome::Ready,
        Ok(reply) => CheckOutcome::Unexpected(reply),
        Err(e) if e.is_rate_limit() => CheckOutcome::QuotaExhausted(e.to_string()),
        Err(e) if e.is_auth_failure() => CheckOutcome::InvalidKey(e.to_string()),
        Err(e) => CheckOutcome::Failed(e.to_string()),
    }
}

/// Models the configured provider can generate with.
pub async fn models(client: &LlmClient) -> Result<Vec<String>> {
    let provider = client.provider();
    provider
        .list_models()
        .await
        .with_context(|| format!("Failed to list models for {}", provider.name()))
}

#[derive(Debug)]
pub struct SampleReport {
    pub document_id: String,
    pub source_chars: usize,
    pub translation: String,
    pub output: PathBuf,
}

/// `<dir>/<stem>_sample.txt`
pub fn sample_output_path(epub_path: &Path) -> PathBuf {
    let stem = epub_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());
    epub_path.with_file_name(format!("{}_sample.txt", stem))
}

fn first_substantial(documents: &[Document]) -> Option<&Document> {
    documents
        .iter()
        .filter(|d| !d.is_navigation)
        .find(|d| html_to_text(&d.html).trim().chars().count() > SAMPLE_MIN_CHARS)
}

/// Translate the first substantial document of an EPUB and save the result.
pub async fn sample(
    client: &LlmClient,
    config: &TranslationConfig,
    epub_path: &Path,
    output: Option<&Path>,
) -> Result<SampleReport> {
    let book = parse_epub(epub_path)?;
    let document = first_substantial(&book.documents)
        .with_context(|| format!("No document with more than {} characters of text", SAMPLE_MIN_CHARS))?;

    let source = if document.paragraphs.is_empty() {
        document.html.clone()
    } else {
        document.section_html()
    };
    log::info!("sampling document {} ({} chars)", document.id, source.chars().count());

    let translation = Translator::new(client, config)
        .translate_section(&source)
        .await
        .with_context(|| format!("Translation of {} failed", document.id))?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| sample_output_path(epub_path));
    let mut file =
        File::create(&output).with_context(|| format!("Failed to create {}", output.display()))?;
    file.write_all(translation.as_bytes())?;
    file.flush()?;
    file.sync_all()?;

    Ok(SampleReport {
        document_id: document.id.clone(),
        source_chars: source.chars().count(),
        translation,
        output,
    })
}

/// The head of a sample translation for the terminal.
pub fn preview_of(report: &SampleReport) -> &str {
    truncate_chars(&report.translation, SAMPLE_PREVIEW_CHARS)
}
