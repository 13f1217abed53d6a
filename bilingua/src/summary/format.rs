//! Summary file layouts: chapter `.out` files and canto summary files.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::bilingual::parser::parse_canto_name;
use crate::text::html::escape;

const BLOCK_RULE: &str = "========================================";

static BLOCK_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"={40,}").unwrap());

static TITLE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^TITLE:[ \t]*(.*?)\s*$").unwrap());

static LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(SUMMARY|ANALYSIS|CONTENT):").unwrap());

static CANTO_HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*NARRATIVE SUMMARY:\s*(.*?)\s*(?:\(SECTIONS\s+(\d+)\s*-\s*(\d+)\))?\s*$")
        .unwrap()
});

/// First line of a chapter summary file.
pub fn chapter_file_header(source: &str) -> String {
    format!("CHAPTER SUMMARIES FOR: {}\n{}\n", source, BLOCK_RULE)
}

/// One chapter entry, closed by the block rule.
pub fn chapter_block(title: &str, summary: &str, analysis: Option<&str>) -> String {
    let mut block = format!("\nTITLE: {}\nSUMMARY: {}\n", title, summary.trim());
    if let Some(analysis) = analysis {
        block.push_str(&format!("ANALYSIS: {}\n", analysis.trim()));
    }
    block.push_str(BLOCK_RULE);
    block.push('\n');
    block
}

/// One canto entry.
pub fn canto_block(name: &str, range: Option<(usize, usize)>, summary: &str) -> String {
    let rule = "-".repeat(70);
    let range = range
        .map(|(first, last)| format!(" (SECTIONS {}-{})", first, last))
        .unwrap_or_default();
    format!("\n{rule}\nNARRATIVE SUMMARY: {name}{range}\n{rule}\n{}\n", summary.trim())
}

/// A chapter summary ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterSummary {
    pub title: Option<String>,
    /// `<p>` paragraphs
    pub summary_html: String,
    /// `<p>` paragraphs
    pub analysis_html: Option<String>,
}

/// Parse a chapter summary file. Blocks are split on rules of forty or more
/// `=`; blocks with no `SUMMARY:` (such as the file header) are skipped.
pub fn parse_chapter_summaries(content: &str) -> Vec<ChapterSummary> {
    BLOCK_SPLIT
        .split(content)
        .filter(|block| !block.trim().is_empty())
        .filter_map(|block| {
            let summary = labelled(block, "SUMMARY", &["ANALYSIS", "CONTENT"])?;
            Some(ChapterSummary {
                title: TITLE_LINE
                    .captures(block)
                    .map(|caps| caps[1].to_string())
                    .filter(|t| !t.is_empty()),
                summary_html: paragraphs_html(&summary),
                analysis_html: labelled(block, "ANALYSIS", &["CONTENT"])
                    .map(|a| paragraphs_html(&a))
                    .filter(|a| !a.is_empty()),
            })
        })
        .collect()
}

/// Text after the first `name:` up to the next label in `stops` or the end
/// of the block. Other labels inside the text are kept.
fn labelled(block: &str, name: &str, stops: &[&str]) -> Option<String> {
    let mut labels = LABEL.captures_iter(block).filter_map(|caps| {
        let whole = caps.get(0)?;
        Some((whole.start(), whole.end(), caps[1].to_ascii_uppercase()))
    });

    let (_, start, _) = labels.by_ref().find(|(_, _, label)| label == name)?;
    let end = labels
        .find(|(_, _, label)| stops.contains(&label.as_str()))
        .map_or(block.len(), |(next_start, _, _)| next_start);
    Some(block[start..end].trim().to_string())
}

/// Blank-line separated paragraphs as escaped `<p>` elements.
pub fn paragraphs_html(text: &str) -> String {
    text.trim()
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape(p)))
        .collect()
}

/// A canto summary recovered from a summary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CantoSummary {
    /// `Location • Canto ROMAN`
    pub name: String,
    pub sections: Option<(usize, usize)>,
    pub text: String,
}

/// Parse `NARRATIVE SUMMARY:` blocks. Rule lines are dropped and the
/// remaining lines of each block joined into one paragraph.
pub fn parse_canto_summaries(content: &str) -> Vec<CantoSummary> {
    let mut summaries = Vec::new();
    let mut current: Option<CantoSummary> = None;
    let mut lines: Vec<&str> = Vec::new();

    for line in content.lines() {
        if let Some(caps) = CANTO_HEADER_LINE.captures(line) {
            if let Some(mut done) = current.take() {
                done.text = lines.join(" ");
                summaries.push(done);
            }
            lines.clear();

            let raw = caps[1].trim();
            let sections = match (caps.get(2), caps.get(3)) {
                (Some(a), Some(b)) => a.as_str().parse().ok().zip(b.as_str().parse().ok()),
                _ => None,
            };
            current = Some(CantoSummary {
                name: parse_canto_name(raw).unwrap_or_else(|| raw.to_string()),
                sections,
                text: String::new(),
            });
        } else if current.is_some() && !line.contains("---") {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                lines.push(trimmed);
            }
        }
    }

    if let Some(mut done) = current {
        done.text = lines.join(" ");
        summaries.push(done);
    }

    summaries
}

/// Add `(SECTIONS a-b)` to summary headers that lack it, using `ranges`
/// keyed by canonical canto name. Returns the new content and the number of
/// headers changed.
pub fn add_section_ranges(content: &str, ranges: &[(String, (usize, usize))]) -> (String, usize) {
    let mut changed = 0;
    let mut out: Vec<String> = Vec::new();

    for line in content.split('\n') {
        let updated = CANTO_HEADER_LINE
            .captures(line)
            .filter(|caps| caps.get(2).is_none())
            .and_then(|caps| {
                let raw = caps[1].trim().to_string();
                let canonical = parse_canto_name(&raw)?;
                let (_, (first, last)) = ranges.iter().find(|(name, _)| *name == canonical)?;
                Some(format!("NARRATIVE SUMMARY: {} (SECTIONS {}-{})", raw, first, last))
            });

        match updated {
            Some(line) => {
                changed += 1;
                out.push(line);
            }
            None => out.push(line.to_string()),
        }
    }

    (out.join("\n"), changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chapter_blocks_parse_back() {
        let mut file = chapter_file_header("maisie_Bilingual.txt");
        file.push_str(&chapter_block("Chapter I", "First para.\n\nSecond & last.", None));
        file.push_str(&chapter_block("Chapter II", "Only one.", Some("Irony throughout.")));

        let parsed = parse_chapter_summaries(&file);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].title.as_deref(), Some("Chapter I"));
        assert_eq!(parsed[0].summary_html, "<p>First para.</p><p>Second &amp; last.</p>");
        assert_eq!(parsed[0].analysis_html, None);
        assert_eq!(parsed[1].analysis_html.as_deref(), Some("<p>Irony throughout.</p>"));
    }

    #[test]
    fn test_summary_stops_at_content_label() {
        let block = "TITLE: X\nsummary: The plot.\nCONTENT: ignored text\n";
        let parsed = parse_chapter_summaries(block);
        assert_eq!(parsed[0].summary_html, "<p>The plot.</p>");
    }

    #[test]
    fn test_summary_keeps_its_own_label_words() {
        let block = "TITLE: Chapter I\nSUMMARY: In summary: Maisie is shuttled between her parents.\n";
        let parsed = parse_chapter_summaries(block);
        assert_eq!(
            parsed[0].summary_html,
            "<p>In summary: Maisie is shuttled between her parents.</p>"
        );
    }

    #[test]
    fn test_analysis_keeps_summary_word() {
        let block = "TITLE: Chapter II\nSUMMARY: Plot.\nANALYSIS: A summary: of irony.\nCONTENT: x\n";
        let parsed = parse_chapter_summaries(block);
        assert_eq!(parsed[0].summary_html, "<p>Plot.</p>");
        assert_eq!(parsed[0].analysis_html.as_deref(), Some("<p>A summary: of irony.</p>"));
    }

    #[test]
    fn test_blocks_without_summary_skipped() {
        let content = format!("TITLE: lonely\n{}\nnothing here\n", "=".repeat(45));
        assert!(parse_chapter_summaries(&content).is_empty());
    }

    #[test]
    fn test_canto_summaries() {
        let mut content = canto_block("Inferno • Canto I", Some((1, 4)), "Dante is lost.\nA leopard appears.");
        content.push_str(&canto_block("Inferno * Canto II", None, "Virgil explains."));

        let parsed = parse_canto_summaries(&content);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].name, "Inferno • Canto I");
        assert_eq!(parsed[0].sections, Some((1, 4)));
        assert_eq!(parsed[0].text, "Dante is lost. A leopard appears.");
        assert_eq!(parsed[1].name, "Inferno • Canto II");
        assert_eq!(parsed[1].sections, None);
    }

    #[test]
    fn test_add_section_ranges() {
        let content = "NARRATIVE SUMMARY: Inferno * Canto I \ntext\nNARRATIVE SUMMARY: Inferno * Canto II (SECTIONS 5-9)\nNARRATIVE SUMMARY: Paradiso * Canto I\n";
        let ranges = vec![
            ("Inferno • Canto I".to_string(), (1, 4)),
            ("Inferno • Canto II".to_string(), (5, 7)),
        ];
        let (updated, changed) = add_section_ranges(content, &ranges);
        assert_eq!(changed, 1);
        assert!(updated.starts_with("NARRATIVE SUMMARY: Inferno * Canto I (SECTIONS 1-4)\ntext\n"));
        assert!(updated.contains("Canto II (SECTIONS 5-9)"));
        assert!(updated.contains("NARRATIVE SUMMARY: Paradiso * Canto I\n"));
    }
}
