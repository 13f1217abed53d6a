//! Narrative canto summaries and section-range repair of summary files.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use super::format::{add_section_ranges, canto_block};
use crate::bilingual::{BilingualText, CantoGroup, parser::normalize_canto, parser::parse_canto_name, writer::append_entry};
use crate::config::SummaryConfig;
use crate::llm::LlmClient;
use crate::text::truncate_chars;
use crate::ui::progress_bar;

/// `Inferno Canto I`, without the bullet.
static LOOSE_CANTO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\w+)\s+Canto\s+([IVXLCDM]+)\s*$").unwrap());

const NARRATIVE_SYSTEM_PROMPT: &str =
    "You are a literary assistant. Summarize what happens, plainly and objectively.";

/// Canonical canto name for a command line argument.
pub fn canto_arg(name: &str) -> Option<String> {
    parse_canto_name(name).or_else(|| {
        LOOSE_CANTO
            .captures(name)
            .map(|caps| normalize_canto(&caps[1], &caps[2]))
    })
}

fn narrative_prompt(canto: &str, text: &str) -> String {
    format!(
        "Provide a direct, factual summary of the events that occur in {canto} of Dante's 'Divine Comedy'.\n\n\
         Instructions:\n\
         - Narrative Only: Focus strictly on the physical actions, the journey, and the characters encountered.\n\
         - No Symbolism: Do not include analysis of what characters or events symbolize. Avoid theological or allegorical interpretation.\n\
         - Tone: Professional and objective. No 'chatty' openings or conclusions.\n\
         - Style: Use clear, descriptive prose.\n\
         - Length: Approximately 150 words.\n\n\
         TEXT:\n{text}"
    )
}

/// Cantos from `start` through `end` inclusive, in file order. Names are
/// compared in canonical form; a missing bound is open.
pub fn select_cantos<'a>(
    cantos: &[CantoGroup<'a>],
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<CantoGroup<'a>>> {
    let canonical = |arg: Option<&str>| -> Result<Option<String>> {
        arg.map(|name| canto_arg(name).with_context(|| format!("Not a canto name: {}", name)))
            .transpose()
    };
    let start = canonical(start)?;
    let end = canonical(end)?;

    let first = match &start {
        Some(name) => cantos
            .iter()
            .position(|c| c.name == name)
            .with_context(|| format!("Canto not found: {}", name))?,
        None => 0,
    };

    let mut selected = Vec::new();
    for canto in &cantos[first..] {
        selected.push(*canto);
        if end.as_deref() == Some(canto.name) {
            break;
        }
    }
    Ok(selected)
}

#[derive(Debug)]
pub struct CantoSummaryReport {
    pub output: PathBuf,
    pub written: usize,
    pub quota_exhausted: bool,
}

/// `<dir>/<stem>_canto_summaries.txt`
pub fn default_output_path(bilingual_path: &Path) -> PathBuf {
    let stem = bilingual_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bilingual".to_string());
    bilingual_path.with_file_name(format!("{}_canto_summaries.txt", stem))
}

/// Summarize each selected canto's translation into `output`.
pub async fn summarize_cantos(
    client: &LlmClient,
    config: &SummaryConfig,
    text: &BilingualText,
    start: Option<&str>,
    end: Option<&str>,
    output: &Path,
) -> Result<CantoSummaryReport> {
    let cantos = text.cantos();
    if cantos.is_empty() {
        anyhow::bail!("No canto headings found; run insert-headers first");
    }
    let selected = select_cantos(&cantos, start, end)?;

    std::fs::write(output, "")
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut report = CantoSummaryReport {
        output: output.to_path_buf(),
        written: 0,
        quota_exhausted: false,
    };

    let pb = progress_bar(selected.len());

    for canto in &selected {
        pb.set_message(canto.name.to_string());

        let mut body = canto.translation_text();
        if body.is_empty() {
            log::warn!("{} has no translation; summarizing the original", canto.name);
            body = canto.original_text();
        }
        let prompt = narrative_prompt(canto.name, truncate_chars(&body, config.max_input_chars));

        let summary = match client.complete(&prompt, Some(NARRATIVE_SYSTEM_PROMPT)).await {
            Ok(summary) => summary,
            Err(e) if e.is_rate_limit() => {
                pb.abandon_with_message("quota exhausted");
                eprintln!("QUOTA EXHAUSTED at {}", canto.name);
                report.quota_exhausted = true;
                return Ok(report);
            }
            Err(e) => {
                log::error!("summary of {} failed: {}", canto.name, e);
                format!("Error during summarization: {}", e)
            }
        };

        append_entry(output, &canto_block(canto.name, canto.section_range(), &summary))?;
        report.written += 1;
        pb.inc(1);
    }

    pb.finish_with_message("done");
    Ok(report)
}

/// `<dir>/<stem>_rehabilitated.txt`
pub fn rehabilitated_path(summary_path: &Path) -> PathBuf {
    let stem = summary_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "summaries".to_string());
    summary_path.with_file_name(format!("{}_rehabilitated.txt", stem))
}

/// Rewrite a summary file so every header carries its canto's section
/// range. Returns the number of headers changed.
pub fn rehabilitate(text: &BilingualText, summary_path: &Path, output: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(summary_path)
        .with_context(|| format!("Failed to read {}", summary_path.display()))?;

    let ranges: Vec<(String, (usize, usize))> = text
        .cantos()
        .iter()
        .filter_map(|canto| Some((canto.name.to_string(), canto.section_range()?)))
        .collect();

    let (updated, changed) = add_section_ranges(&content, &ranges);
    std::fs::write(output, updated)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(changed)
}
