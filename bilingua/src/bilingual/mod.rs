//! The interleaved bilingual text file.
//!
//! Every translated section is written as an original-text `<div>` followed by
//! a collapsible translation, and entries are separated by a line of forty
//! `=`. Chapter boundaries sit between entries. The file is both the
//! translator's append-only output and the input of every renderer.

pub mod parser;
pub mod writer;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::text::html::strip_tags;

pub use parser::parse;

/// Line between entries.
pub const SECTION_SEPARATOR: &str = "========================================";

/// Rule framing a chapter boundary.
pub const BOUNDARY_RULE: &str = "########################################";

pub const BOUNDARY_MARKER: &str = ">>> CHAPTER BOUNDARY <<<";

static SECTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)###\s+SECTION\s+\d+\s+(?:ORIGINAL|TRANSLATED)").unwrap());

static CANTO_HEADER_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<h3 class=['"]canto-header['"]>.*?</h3>\s*"#).unwrap());

static PARAGRAPH_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</p\s*>").unwrap());

/// One translated section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// 1-based number from `### SECTION N ORIGINAL`
    pub number: usize,
    /// Original paragraphs, literal HTML
    pub original_html: String,
    /// Translation paragraphs without the `<i>` wrapper
    pub translation_html: Option<String>,
    /// Title of the chapter this section opens
    pub chapter: Option<String>,
    /// `Location • Canto ROMAN` when the section opens a canto
    pub canto: Option<String>,
    /// Uppercase numeral of an `<h2>` holding only a Roman numeral
    pub roman_heading: Option<String>,
}

impl Section {
    /// Original prose without markers, canto headers or tags, one line per
    /// paragraph or verse.
    pub fn original_text(&self) -> String {
        let html = SECTION_MARKER.replace_all(&self.original_html, "");
        let html = CANTO_HEADER_TAG.replace_all(&html, "");
        plain_lines(&html)
    }

    /// Translation as plain text, one line per paragraph.
    pub fn translation_text(&self) -> String {
        self.translation_html
            .as_deref()
            .map(plain_lines)
            .unwrap_or_default()
    }
}

fn plain_lines(html: &str) -> String {
    let broken = PARAGRAPH_END.replace_all(html, "\n");
    strip_tags(&broken)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// A parsed bilingual file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BilingualText {
    pub title: Option<String>,
    pub author: Option<String>,
    pub sections: Vec<Section>,
}

/// Sections between two chapter boundaries.
#[derive(Debug, Clone, Copy)]
pub struct ChapterGroup<'a> {
    /// `None` for sections before the first boundary
    pub title: Option<&'a str>,
    pub sections: &'a [Section],
}

/// Sections from one canto heading up to the next.
#[derive(Debug, Clone, Copy)]
pub struct CantoGroup<'a> {
    pub name: &'a str,
    pub sections: &'a [Section],
}

impl CantoGroup<'_> {
    /// First and last section numbers.
    pub fn section_range(&self) -> Option<(usize, usize)> {
        Some((self.sections.first()?.number, self.sections.last()?.number))
    }

    pub fn translation_text(&self) -> String {
        join_nonempty(self.sections.iter().map(Section::translation_text), "\n")
    }

    pub fn original_text(&self) -> String {
        join_nonempty(self.sections.iter().map(Section::original_text), "\n")
    }
}

impl ChapterGroup<'_> {
    /// Original prose of the whole chapter, sections joined by spaces.
    pub fn original_text(&self) -> String {
        join_nonempty(self.sections.iter().map(Section::original_text), " ")
    }
}

fn join_nonempty(parts: impl Iterator<Item = String>, sep: &str) -> String {
    parts.filter(|p| !p.is_empty()).collect::<Vec<_>>().join(sep)
}

impl BilingualText {
    /// Sections grouped at chapter boundaries. Sections before the first
    /// boundary form an untitled group.
    pub fn chapters(&self) -> Vec<ChapterGroup<'_>> {
        split_groups(&self.sections, |s| s.chapter.is_some())
            .into_iter()
            .map(|sections| ChapterGroup {
                title: sections[0].chapter.as_deref(),
                sections,
            })
            .collect()
    }

    /// Sections grouped by canto. Sections before the first canto heading
    /// belong to no canto and are left out.
    pub fn cantos(&self) -> Vec<CantoGroup<'_>> {
        split_groups(&self.sections, |s| s.canto.is_some())
            .into_iter()
            .filter_map(|sections| {
                sections[0].canto.as_deref().map(|name| CantoGroup { name, sections })
            })
            .collect()
    }

    pub fn has_chapters(&self) -> bool {
        self.sections.iter().any(|s| s.chapter.is_some())
    }

    pub fn has_cantos(&self) -> bool {
        self.sections.iter().any(|s| s.canto.is_some())
    }
}

/// Split `sections` before every section where `starts` holds. Never yields
/// an empty group.
fn split_groups(sections: &[Section], starts: impl Fn(&Section) -> bool) -> Vec<&[Section]> {
    let mut groups = Vec::new();
    let mut begin = 0;

    for (i, section) in sections.iter().enumerate() {
        if i > begin && starts(section) {
            groups.push(&sections[begin..i]);
            begin = i;
        }
    }
    if begin < sections.len() {
        groups.push(&sections[begin..]);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(number: usize) -> Section {
        Section {
            number,
            original_html: format!("<p>Original {number}</p>"),
            translation_html: Some(format!("<p>Translation {number}</p>")),
            chapter: None,
            canto: None,
            roman_heading: None,
        }
    }

    fn text() -> BilingualText {
        let mut sections: Vec<Section> = (1..=6).map(section).collect();
        sections[1].chapter = Some("Chapter I".into());
        sections[4].chapter = Some("Chapter II".into());
        sections[2].canto = Some("Inferno • Canto I".into());
        sections[3].canto = Some("Inferno • Canto II".into());
        BilingualText {
            title: Some("T".into()),
            author: None,
            sections,
        }
    }

    #[test]
    fn test_chapters_split_at_boundaries() {
        let text = text();
        let chapters = text.chapters();
        let shape: Vec<(Option<&str>, usize)> =
            chapters.iter().map(|c| (c.title, c.sections.len())).collect();
        assert_eq!(
            shape,
            vec![(None, 1), (Some("Chapter I"), 3), (Some("Chapter II"), 2)]
        );
        assert_eq!(chapters[2].original_text(), "Original 5 Original 6");
    }

    #[test]
    fn test_cantos_with_ranges() {
        let text = text();
        let cantos = text.cantos();
        assert_eq!(cantos.len(), 2);
        assert_eq!(cantos[0].name, "Inferno • Canto I");
        assert_eq!(cantos[0].section_range(), Some((3, 3)));
        assert_eq!(cantos[1].section_range(), Some((4, 6)));
        assert_eq!(
            cantos[1].translation_text(),
            "Translation 4\nTranslation 5\nTranslation 6"
        );
    }

    #[test]
    fn test_no_marks_single_group() {
        let text = BilingualText {
            sections: (1..=3).map(section).collect(),
            ..Default::default()
        };
        assert!(!text.has_chapters());
        assert_eq!(text.chapters().len(), 1);
        assert!(text.cantos().is_empty());
    }

    #[test]
    fn test_section_plain_text() {
        let section = Section {
            original_html: "<h3 class='canto-header'>Inferno • Canto I</h3>\n<p>\n  Nel mezzo del cammin<br/>di nostra vita\n</p>\n<p>mi ritrovai &amp; poi</p>".into(),
            translation_html: Some("<p>Midway upon</p><p>the journey</p>".into()),
            ..section(1)
        };
        assert_eq!(
            section.original_text(),
            "Nel mezzo del cammin\ndi nostra vita\nmi ritrovai & poi"
        );
        assert_eq!(section.translation_text(), "Midway upon\nthe journey");
    }
}
