//! Canto heading insertion.
//!
//! Translated Commedia files lose the canto titles, which the EPUB keeps in
//! separate heading elements. Each heading is put back in front of the
//! paragraph that opens its canto, found by exact text.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::epub::CantoLiteral;

#[derive(Debug, Default)]
pub struct InsertReport {
    pub inserted: usize,
    /// Headers already in front of their paragraph
    pub present: usize,
    /// Headers whose opening paragraph was not found
    pub failures: Vec<String>,
}

fn header_tag(header: &str) -> String {
    format!("<h3 class='canto-header'>{}</h3>\n", header)
}

/// Insert one header per literal before the first `<p>` that opens with it.
/// The indented form the translator writes is tried first, then the bare one.
/// A header already in front of its paragraph is left alone, so running this
/// twice over the same content changes nothing.
pub fn insert_canto_headers(content: &str, literals: &[CantoLiteral]) -> (String, InsertReport) {
    let mut out = content.to_string();
    let mut report = InsertReport::default();

    for canto in literals {
        let trimmed = canto.literal.trim();
        if trimmed.is_empty() {
            report.failures.push(canto.header.clone());
            continue;
        }

        let candidates = [
            format!("<p>\n  {}", trimmed),
            format!("<p>{}", canto.literal),
            format!("<p>{}", trimmed),
        ];
        let position = candidates.iter().find_map(|needle| out.find(needle.as_str()));

        match position {
            Some(at) if out[..at].ends_with(&header_tag(&canto.header)) => {
                log::debug!("{} already present", canto.header);
                report.present += 1;
            }
            Some(at) => {
                out.insert_str(at, &header_tag(&canto.header));
                report.inserted += 1;
            }
            None => {
                log::warn!("opening paragraph of {} not found", canto.header);
                report.failures.push(canto.header.clone());
            }
        }
    }

    (out, report)
}

/// `<dir>/<stem>_with_headers.txt`
pub fn default_output_path(bilingual_path: &Path) -> PathBuf {
    let stem = bilingual_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bilingual".to_string());
    bilingual_path.with_file_name(format!("{}_with_headers.txt", stem))
}

/// Read `input`, insert the headers and write `output`.
pub fn insert_into_file(input: &Path, literals: &[CantoLiteral], output: &Path) -> Result<InsertReport> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let (updated, report) = insert_canto_headers(&content, literals);

    std::fs::write(output, updated)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(report)
}
