// EPUB parsing and the content the pipeline needs from it

pub mod writer;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

use crate::bilingual::parser::normalize_canto;
use crate::text::html::{self, Element};
use crate::text::{squash_whitespace, truncate_chars};

static CANTO_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Inferno|Purgatorio|Paradiso)\s*•\s*Canto\s*([IVXLCDM]+)\b").unwrap()
});

static NAV_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<nav\b|epub:type\s*=\s*["']toc["']"#).unwrap());

/// One spine document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Manifest id of the document
    pub id: String,
    /// Raw XHTML
    pub html: String,
    /// First non-empty h1/h2
    pub title: Option<String>,
    /// Literal `<p>` elements in order
    pub paragraphs: Vec<String>,
    /// Table-of-contents document
    pub is_navigation: bool,
}

impl Document {
    fn from_html(id: String, html: String) -> Self {
        let is_navigation = NAV_MARKER.is_match(&html) || id.to_ascii_lowercase().contains("nav");
        Self {
            title: html::first_heading(&html),
            paragraphs: html::paragraphs(&html),
            is_navigation,
            id,
            html,
        }
    }

    /// Paragraph markup sent for translation and kept as the original text.
    pub fn section_html(&self) -> String {
        self.paragraphs.join("\n")
    }
}

/// Parsed EPUB book
#[derive(Debug)]
pub struct Book {
    pub title: String,
    pub author: Option<String>,
    /// Spine documents in reading order
    pub documents: Vec<Document>,
}

impl Book {
    /// Documents worth translating: not navigation, with more than
    /// `min_chars` characters of paragraph markup.
    pub fn sections(&self, min_chars: usize) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .filter(move |d| !d.is_navigation && d.section_html().chars().count() > min_chars)
    }
}

/// Parse an EPUB file into its spine documents
pub fn parse_epub(path: &Path) -> Result<Book> {
    let mut doc = epub::doc::EpubDoc::new(path)
        .map_err(|e| anyhow::anyhow!("Failed to open EPUB {}: {}", path.display(), e))?;

    let title = doc
        .mdata("title")
        .map(|m| m.value.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let author = doc.mdata("creator").map(|m| m.value.clone());

    let mut documents = Vec::new();
    let spine = doc.spine.clone();

    for item in spine.iter() {
        match doc.get_resource(&item.idref) {
            Some((bytes, _mime)) => {
                let html = String::from_utf8_lossy(&bytes).into_owned();
                documents.push(Document::from_html(item.idref.clone(), html));
            }
            None => log::warn!("spine item {} has no resource, skipping", item.idref),
        }
    }

    log::debug!("parsed {} spine documents from {}", documents.len(), path.display());

    Ok(Book {
        title,
        author,
        documents,
    })
}

/// A canto heading and the first paragraph that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CantoLiteral {
    /// `Location • Canto ROMAN`
    pub header: String,
    /// Inner HTML of the next `<p>`, exactly as written in the book
    pub literal: String,
}

/// Canto headings (`Inferno • Canto I` and the like, in h1/h2/h3/p) paired
/// with the paragraph that opens each canto.
pub fn extract_canto_literals(book: &Book) -> Vec<CantoLiteral> {
    let mut found = Vec::new();

    for document in &book.documents {
        let blocks: Vec<Element> = html::elements(&document.html)
            .into_iter()
            .filter(|e| matches!(e.tag.as_str(), "h1" | "h2" | "h3" | "p"))
            .collect();

        for (i, block) in blocks.iter().enumerate() {
            let text = squash_whitespace(&block.text());
            let Some(caps) = CANTO_HEADING.captures(&text) else {
                continue;
            };
            let header = normalize_canto(&caps[1], &caps[2]);

            match blocks[i + 1..].iter().find(|e| e.tag == "p") {
                Some(next) => found.push(CantoLiteral {
                    header,
                    literal: next.inner.clone(),
                }),
                None => log::warn!("{} has no following paragraph", header),
            }
        }
    }

    found
}

/// Offline extraction check result.
#[derive(Debug)]
pub struct Preview {
    pub title: String,
    pub document_id: String,
    pub char_count: usize,
    pub excerpt: String,
}

/// Plain text of the first document with any text: total characters and
/// the first `chars` of it.
pub fn preview(path: &Path, chars: usize) -> Result<Preview> {
    let book = parse_epub(path).context("Extraction failed")?;

    let (document_id, text) = book
        .documents
        .iter()
        .filter(|d| !d.is_navigation)
        .map(|d| (d.id.clone(), html::html_to_text(&d.html)))
        .find(|(_, text)| !text.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("No text found in {}", path.display()))?;

    Ok(Preview {
        title: book.title,
        document_id,
        char_count: text.chars().count(),
        excerpt: truncate_chars(&text, chars).to_string(),
    })
}
