//! Recover sections from a bilingual file by scanning its marker lines.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{BOUNDARY_MARKER, BilingualText, Section};
use crate::text::html::{lines_to_paragraphs, strip_tags};
use crate::text::squash_whitespace;

static SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"={40,}").unwrap());

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^TITLE:[ \t]*(.*?)\s*$").unwrap());

static AUTHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^AUTHOR:[ \t]*(.*?)\s*$").unwrap());

static ORIGINAL_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"###\s+SECTION\s+(\d+)\s+ORIGINAL[^\n]*\n?").unwrap());

static TRANSLATED_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"###\s+SECTION\s+\d+\s+TRANSLATED[^\n]*\n?").unwrap());

static CHAPTER_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^##\s+ORIGINAL\s+CHAPTER:[ \t]*(.*?)\s*$").unwrap());

static TRANSLATION_DIV: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<div class=['"]translation-content['"]>\s*(.*?)\s*</div>\s*</details>"#)
        .unwrap()
});

static ITALIC_WRAPPER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)^<i>(.*)</i>$").unwrap());

static CANTO_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<h3 class=['"]canto-header['"]>(.*?)</h3>"#).unwrap());

static CANTO_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\w+)\s*[•*]\s*Canto\s+([IVXLCDM]+)\b").unwrap());

static ROMAN_H2: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<h2[^>]*?>\s*([ivxlcdm]+)\s*</h2>").unwrap());

/// Parse the whole file. Blocks without a `### SECTION N ORIGINAL` marker
/// contribute only header fields or a pending chapter boundary.
pub fn parse(content: &str) -> BilingualText {
    let head = match ORIGINAL_MARKER.find(content) {
        Some(m) => &content[..m.start()],
        None => content,
    };

    let mut text = BilingualText {
        title: capture(&TITLE, head),
        author: capture(&AUTHOR, head),
        sections: Vec::new(),
    };

    let mut pending_chapter: Option<String> = None;

    for block in SEPARATOR.split(content) {
        if block.contains(BOUNDARY_MARKER) {
            let title = capture(&CHAPTER_TITLE, block).unwrap_or_else(|| "Untitled".to_string());
            pending_chapter = Some(title);
        }

        if let Some(mut section) = parse_section(block) {
            section.chapter = pending_chapter.take();
            text.sections.push(section);
        }
    }

    if let Some(chapter) = pending_chapter {
        log::debug!("chapter boundary '{}' at end of file has no sections", chapter);
    }

    text
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_section(block: &str) -> Option<Section> {
    let caps = ORIGINAL_MARKER.captures(block)?;
    let number = caps[1].parse().ok()?;
    let after_marker = &block[caps.get(0)?.end()..];

    let original_end = [
        after_marker.find("<details"),
        TRANSLATED_MARKER.find(after_marker).map(|m| m.start()),
    ]
    .into_iter()
    .flatten()
    .min()
    .unwrap_or(after_marker.len());

    let original = after_marker[..original_end].trim_end();
    let original_html = original.strip_suffix("</div>").unwrap_or(original).trim().to_string();

    let translation_html = TRANSLATION_DIV
        .captures(after_marker)
        .map(|caps| unwrap_italics(&caps[1]))
        .or_else(|| legacy_translation(after_marker))
        .filter(|t| !t.trim().is_empty());

    Some(Section {
        number,
        canto: find_canto(&original_html),
        roman_heading: ROMAN_H2
            .captures(&original_html)
            .map(|caps| caps[1].to_ascii_uppercase()),
        original_html,
        translation_html,
        chapter: None,
    })
}

fn unwrap_italics(inner: &str) -> String {
    let inner = inner.trim();
    match ITALIC_WRAPPER.captures(inner) {
        Some(caps) => caps[1].trim().to_string(),
        None => inner.to_string(),
    }
}

/// `### SECTION N TRANSLATED` followed by the translation up to the end of
/// the block. Plain text is turned into paragraphs.
fn legacy_translation(block: &str) -> Option<String> {
    let marker = TRANSLATED_MARKER.find(block)?;
    let body = block[marker.end()..].trim();
    if body.contains('<') {
        Some(body.to_string())
    } else {
        Some(lines_to_paragraphs(body))
    }
}

/// Canto named by an inserted `<h3 class='canto-header'>`, or failing that
/// by `Location • Canto ROMAN` (or `*`) in the original text.
fn find_canto(original_html: &str) -> Option<String> {
    let source = match CANTO_HEADER.captures(original_html) {
        Some(caps) => strip_tags(&caps[1]),
        None => strip_tags(original_html),
    };
    let caps = CANTO_TEXT.captures(&source)?;
    Some(normalize_canto(&caps[1], &caps[2]))
}

/// `inferno`, `xii` → `Inferno • Canto XII`
pub fn normalize_canto(location: &str, numeral: &str) -> String {
    let location = squash_whitespace(location);
    let mut chars = location.chars();
    let location = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    format!("{} • Canto {}", location, numeral.to_ascii_uppercase())
}

/// Canonical form of a canto name typed by a user or found in a summary file.
pub fn parse_canto_name(name: &str) -> Option<String> {
    let caps = CANTO_TEXT.captures(name.trim())?;
    Some(normalize_canto(&caps[1], &caps[2]))
}
