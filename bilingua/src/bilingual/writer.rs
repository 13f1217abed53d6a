//! Producing entries of the bilingual file.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use super::{BOUNDARY_MARKER, BOUNDARY_RULE, SECTION_SEPARATOR};

/// `TITLE:` / `AUTHOR:` lines opening a new file.
pub fn header(title: &str, author: Option<&str>) -> String {
    format!(
        "TITLE: {}\nAUTHOR: {}\n\n",
        title,
        author.unwrap_or("Unknown Author")
    )
}

/// Boundary written before a section that opens a chapter.
pub fn chapter_boundary(title: &str) -> String {
    format!(
        "\n{rule}\n{marker}\n{rule}\n## ORIGINAL CHAPTER: {title}\n",
        rule = BOUNDARY_RULE,
        marker = BOUNDARY_MARKER,
    )
}

/// One section entry: original markup, then the collapsible translation.
pub fn section(number: usize, original_html: &str, translation_html: &str) -> String {
    format!(
        "\n<div class='original-text justify-text'>\n\
         ### SECTION {number} ORIGINAL\n\
         {original_html}\n\
         </div>\n\
         \n\
         <details class='modern-translation'>\n  \
         <summary>Click to show contemporary translation</summary>\n  \
         <div class='translation-content'>\n    \
         <i>{translation_html}</i>\n  \
         </div>\n\
         </details>\n\
         \n\
         {SECTION_SEPARATOR}\n"
    )
}

/// Append `entry` and force it to disk before returning, so an interrupted
/// run never loses a finished section.
pub fn append_entry(path: &Path, entry: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    file.write_all(entry.as_bytes())
        .with_context(|| format!("Failed to write to {}", path.display()))?;
    file.flush()?;
    file.sync_all()
        .with_context(|| format!("Failed to sync {}", path.display()))?;
    Ok(())
}
