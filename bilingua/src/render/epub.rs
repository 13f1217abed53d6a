//! Bilingual file → EPUB.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use super::style::{READING_CSS, RESPONSIVE_CSS};
use crate::bilingual;
use crate::epub::writer::EpubBuilder;
use crate::summary::chapters::normalize_chapter;
use crate::summary::format::{ChapterSummary, parse_chapter_summaries};
use crate::text::html::{escape, smooth_line_breaks};

static BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#{40}\r?\n>>> CHAPTER BOUNDARY <<<\r?\n#{40}").unwrap());

static CHAPTER_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^##\s+ORIGINAL\s+CHAPTER:[ \t]*(.*?)\s*$").unwrap());

static ROMAN_CHAPTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Chapter\s+[IVXLCDM]+$").unwrap());

static TECHNICAL_LINES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"###\s+SECTION\s+\d+\s+(?:ORIGINAL|TRANSLATED)",
        r"(?i)##\s+ORIGINAL\s+CHAPTER:.*?\n",
        r"(?i)##\s+TRANSLATED\s+CHAPTER:.*?\n",
        r"(?m)^(?:TITLE|AUTHOR):.*\n",
        r"#{10,}",
        r"={10,}",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

const NO_SUMMARY: &str = "<p>No summary available.</p>";

#[derive(Debug, Clone, Default)]
pub struct EpubOptions {
    pub title: Option<String>,
    pub author: Option<String>,
    pub summaries: Option<std::path::PathBuf>,
    pub smooth_breaks: bool,
}

/// A rendered page: title and body markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub body: String,
}

/// Strip section markers, chapter boundary lines, header fields and rules.
pub fn clean_chapter_content(text: &str) -> String {
    TECHNICAL_LINES
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned())
        .trim()
        .to_string()
}

fn details_box(label: &str, content_html: &str) -> String {
    format!(
        "<details class=\"summary-box\">\n  <summary>{}</summary>\n  <div class=\"summary-content\">\n    {}\n  </div>\n</details>\n",
        label, content_html
    )
}

/// Summary for the chapter originally titled `title`. Titles are tried
/// first; Roman-numbered chapters then fall back to their index among
/// Roman-numbered chapters.
fn find_summary<'a>(
    summaries: &'a [ChapterSummary],
    title: &str,
    roman_index: Option<usize>,
) -> Option<&'a ChapterSummary> {
    let wanted = normalize_chapter(title);
    summaries
        .iter()
        .find(|s| s.title.as_deref().map(normalize_chapter).as_deref() == Some(wanted.as_str()))
        .or_else(|| roman_index.and_then(|i| summaries.get(i)))
}

/// One page per chapter boundary. `Chapter <ROMAN>` headings are numbered
/// `Chapter 1`, `Chapter 2`…; other headings are kept. Sections before the
/// first boundary become a front matter page.
pub fn chapter_pages(content: &str, summaries: &[ChapterSummary], smooth_breaks: bool) -> Vec<Page> {
    let mut pages = Vec::new();
    let mut chapter_count = 0;

    for (i, piece) in BOUNDARY.split(content).enumerate() {
        let title = CHAPTER_TITLE.captures(piece).map(|caps| caps[1].to_string());
        let mut body = clean_chapter_content(piece);
        if body.is_empty() {
            continue;
        }
        if smooth_breaks {
            body = smooth_line_breaks(&body);
        }

        let Some(original_title) = title.filter(|_| i > 0) else {
            pages.push(Page {
                title: "Front Matter".to_string(),
                body: format!("<div class=\"main-body\">\n{}\n</div>\n", body),
            });
            continue;
        };

        let (page_title, roman_index) = if ROMAN_CHAPTER.is_match(&original_title) {
            chapter_count += 1;
            (format!("Chapter {}", chapter_count), Some(chapter_count - 1))
        } else {
            (original_title.clone(), None)
        };

        let summary = find_summary(summaries, &original_title, roman_index);

        let mut html = format!("<h1 class=\"chapter-title\">{}</h1>\n\n", escape(&page_title));
        html.push_str(&details_box(
            "Chapter Summary (Click to expand)",
            summary.map_or(NO_SUMMARY, |s| s.summary_html.as_str()),
        ));
        if let Some(analysis) = summary.and_then(|s| s.analysis_html.as_deref()) {
            html.push('\n');
            html.push_str(&details_box("Literary Analysis (Click to expand)", analysis));
        }
        html.push_str(&format!("\n<div class=\"main-body\">\n{}\n</div>\n", body));

        pages.push(Page {
            title: page_title,
            body: html,
        });
    }

    pages
}

/// The whole file as one page, for files without chapter marks.
pub fn single_page(content: &str, smooth_breaks: bool) -> Page {
    let mut body = clean_chapter_content(content);
    if smooth_breaks {
        body = smooth_line_breaks(&body);
    }
    Page {
        title: "Bilingual Text".to_string(),
        body,
    }
}

/// Render `input` to an EPUB at `output`. Returns the number of pages.
pub fn render_epub(input: &Path, output: &Path, options: &EpubOptions) -> Result<usize> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let text = bilingual::parse(&content);

    let summaries = match &options.summaries {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read summaries {}", path.display()))?;
            parse_chapter_summaries(&raw)
        }
        None => Vec::new(),
    };

    let title = options
        .title
        .clone()
        .or(text.title)
        .unwrap_or_else(|| "Bilingual Edition".to_string());
    let author = options.author.clone().or(text.author);

    let (pages, css) = if BOUNDARY.is_match(&content) {
        (chapter_pages(&content, &summaries, options.smooth_breaks), RESPONSIVE_CSS)
    } else {
        log::info!("no chapter marks; writing a single page");
        (vec![single_page(&content, options.smooth_breaks)], READING_CSS)
    };

    if pages.is_empty() {
        anyhow::bail!("Nothing to render in {}", input.display());
    }

    let mut builder = EpubBuilder::new(&title, author.as_deref()).stylesheet(css);
    for page in &pages {
        builder.add_chapter(&page.title, &page.body);
    }
    builder.write(output)?;

    log::info!("wrote {} pages to {}", pages.len(), output.display());
    Ok(pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilingual::writer;
    use crate::summary::format::chapter_block;

    fn novel() -> String {
        let mut content = writer::header("The Wings of the Dove", Some("Henry James"));
        content.push_str(&writer::section(1, "<p>Front</p>", "<p>Front, again</p>"));
        content.push_str(&writer::chapter_boundary("Chapter I"));
        content.push_str(&writer::section(2, "<p>She waited, Kate Croy</p>", "<p>Kate waited</p>"));
        content.push_str(&writer::chapter_boundary("Book Second"));
        content.push_str(&writer::section(3, "<p>Interlude</p>", "<p>Pause</p>"));
        content.push_str(&writer::chapter_boundary("Chapter II"));
        content.push_str(&writer::section(4, "<p>Her father</p>", "<p>Her dad</p>"));
        content
    }

    #[test]
    fn test_clean_chapter_content() {
        let raw = "TITLE: X\nAUTHOR: Y\n\n## ORIGINAL CHAPTER: Chapter I\n### SECTION 3 ORIGINAL\n<p>a</p>\n========================================\n";
        assert_eq!(clean_chapter_content(raw), "<p>a</p>");
    }

    #[test]
    fn test_chapter_pages_numbering_and_summaries() {
        let mut summary_file = String::new();
        summary_file.push_str(&chapter_block("Chapter II", "Father appears.", Some("Irony.")));
        summary_file.push_str(&chapter_block("Chapter I", "Kate waits.", None));
        let summaries = parse_chapter_summaries(&summary_file);

        let pages = chapter_pages(&novel(), &summaries, false);
        let titles: Vec<_> = pages.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Front Matter", "Chapter 1", "Book Second", "Chapter 2"]);

        assert!(pages[1].body.contains("<h1 class=\"chapter-title\">Chapter 1</h1>"));
        assert!(pages[1].body.contains("<p>Kate waits.</p>"));
        assert!(!pages[1].body.contains("Literary Analysis"));
        assert!(pages[3].body.contains("Literary Analysis (Click to expand)"));
        assert!(pages[3].body.contains("<p>Irony.</p>"));
        assert!(!pages[3].body.contains("### SECTION"));
        assert!(!pages[3].body.contains("===="));
        // a titled page without its own summary never borrows another
        assert!(pages[2].body.contains(NO_SUMMARY));
        assert!(!pages[2].body.contains("Father appears."));
        assert!(!pages[2].body.contains("Kate waits."));
    }

    #[test]
    fn test_untitled_summaries_follow_roman_chapters() {
        let summary_file = "SUMMARY: First.\n========================================\nSUMMARY: Second.\n";
        let summaries = parse_chapter_summaries(summary_file);
        assert_eq!(summaries.len(), 2);

        let pages = chapter_pages(&novel(), &summaries, false);
        assert!(pages[1].body.contains("<p>First.</p>"));
        assert!(pages[2].body.contains(NO_SUMMARY));
        assert!(pages[3].body.contains("<p>Second.</p>"));
    }

    #[test]
    fn test_missing_summary() {
        let pages = chapter_pages(&novel(), &[], false);
        assert!(pages[1].body.contains(NO_SUMMARY));
    }

    #[test]
    fn test_single_page_smoothing() {
        let content = "TITLE: Screw\n### SECTION 1 ORIGINAL\n<p>one<br/>two<br/><br/><br/>three</p>";
        let page = single_page(content, true);
        assert_eq!(page.title, "Bilingual Text");
        assert!(page.body.starts_with("<p>one two"));
        assert!(page.body.contains("&nbsp;"));
    }

    #[test]
    fn test_render_epub_writes_package() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("wings_Bilingual.txt");
        let output = dir.path().join("wings.epub");
        std::fs::write(&input, novel()).unwrap();

        let pages = render_epub(&input, &output, &EpubOptions::default()).unwrap();
        assert_eq!(pages, 4);

        let book = crate::epub::parse_epub(&output).unwrap();
        assert_eq!(book.title, "The Wings of the Dove");
        assert_eq!(book.author.as_deref(), Some("Henry James"));
    }
}
