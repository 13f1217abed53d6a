//! EPUB → HTMLZ archive of Jekyll pages.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use super::style::HTMLZ_CSS;
use crate::epub::parse_epub;

static BODY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<body[^>]*>(.*)</body>").unwrap());

static SECTION_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)###\s+SECTION\s+\d+\s+(?:ORIGINAL|TRANSLATED)").unwrap());

static RULE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*[#=]{3,}\s*$").unwrap());

#[derive(Debug)]
pub struct HtmlzReport {
    pub archive: PathBuf,
    pub unpacked: PathBuf,
    pub chapters: usize,
}

fn front_matter(title: &str, body: &str) -> String {
    format!("---\nlayout: default\ntitle: \"{}\"\ncss: style.css\n---\n{}\n", title, body)
}

/// Section markers and rule lines removed.
pub fn clean_markers(html: &str) -> String {
    let html = SECTION_MARKER.replace_all(html, "");
    RULE_LINE.replace_all(&html, "").into_owned()
}

/// Inner markup of `<body>`, or the whole document when there is none.
fn body_of(html: &str) -> &str {
    BODY.captures(html)
        .and_then(|caps| caps.get(1))
        .map_or(html, |m| m.as_str())
}

/// Jekyll pages for each non-navigation document plus `index.html`, as
/// (file name, content) pairs.
pub fn jekyll_pages(documents: &[(bool, &str)], book_title: &str) -> Vec<(String, String)> {
    let mut pages = Vec::new();
    let mut links = Vec::new();

    for (is_navigation, html) in documents {
        if *is_navigation {
            log::debug!("skipping navigation document");
            continue;
        }
        let count = links.len() + 1;
        let file_name = format!("chap_{:02}.html", count);
        let title = format!("Chapter {}", count);

        pages.push((file_name.clone(), front_matter(&title, &clean_markers(body_of(html)))));
        links.push(format!("<li><a href=\"{}\">{}</a></li>", file_name, title));
    }

    let index = format!("<h1>{}</h1>\n<ol>\n    {}\n</ol>", book_title, links.join(" "));
    pages.push(("index.html".to_string(), front_matter(book_title, &index)));
    pages
}

/// Convert `epub_path` into `<out>/<base>.htmlz` and unpack it into
/// `<out>/<base>_unpacked/`.
pub fn render_htmlz(epub_path: &Path, css: Option<&Path>, out_dir: &Path) -> Result<HtmlzReport> {
    let book = parse_epub(epub_path)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let base = epub_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "book".to_string());
    let archive = out_dir.join(format!("{}.htmlz", base));
    let unpacked = out_dir.join(format!("{}_unpacked", base));

    let stylesheet = match css {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stylesheet {}", path.display()))?,
        None => HTMLZ_CSS.to_string(),
    };

    let documents: Vec<(bool, &str)> = book
        .documents
        .iter()
        .map(|d| (d.is_navigation, d.html.as_str()))
        .collect();
    let pages = jekyll_pages(&documents, &base.replace('_', " "));
    let chapters = pages.len() - 1;

    let file = File::create(&archive)
        .with_context(|| format!("Failed to create {}", archive.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in &pages {
        zip.start_file(name.as_str(), options)?;
        zip.write_all(content.as_bytes())?;
    }
    zip.start_file("style.css", options)?;
    zip.write_all(stylesheet.as_bytes())?;
    zip.finish()?;

    if unpacked.exists() {
        std::fs::remove_dir_all(&unpacked)
            .with_context(|| format!("Failed to clear {}", unpacked.display()))?;
    }
    std::fs::create_dir_all(&unpacked)?;
    let mut reader = zip::ZipArchive::new(
        File::open(&archive).with_context(|| format!("Failed to open {}", archive.display()))?,
    )?;
    reader
        .extract(&unpacked)
        .with_context(|| format!("Failed to unpack into {}", unpacked.display()))?;

    Ok(HtmlzReport {
        archive,
        unpacked,
        chapters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::writer::EpubBuilder;

    #[test]
    fn test_clean_markers() {
        let html = "<p>a</p>\n### SECTION 2 original\n<p>b</p>\n  =====  \n####\n";
        let cleaned = clean_markers(html);
        assert!(cleaned.starts_with("<p>a</p>\n\n<p>b</p>"));
        assert!(!cleaned.contains('='));
        assert!(!cleaned.contains('#'));
    }

    #[test]
    fn test_jekyll_pages() {
        let docs = [
            (true, "<html><body><nav>toc</nav></body></html>"),
            (false, "<html><body class=\"x\"><p>One</p></body></html>"),
            (false, "<p>Two</p>"),
        ];
        let pages = jekyll_pages(&docs, "wings one");

        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].0, "chap_01.html");
        assert_eq!(
            pages[0].1,
            "---\nlayout: default\ntitle: \"Chapter 1\"\ncss: style.css\n---\n<p>One</p>\n"
        );
        assert_eq!(pages[1].0, "chap_02.html");
        assert_eq!(pages[2].0, "index.html");
        assert!(pages[2].1.contains(
            "<h1>wings one</h1>\n<ol>\n    <li><a href=\"chap_01.html\">Chapter 1</a></li> <li><a href=\"chap_02.html\">Chapter 2</a></li>\n</ol>"
        ));
    }

    #[test]
    fn test_render_htmlz_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let epub = dir.path().join("wings_one.epub");
        let mut builder = EpubBuilder::new("Wings", None);
        builder.add_chapter("Chapter 1", "<p>Kate Croy waited</p>");
        builder.add_chapter("Chapter 2", "<p>Her father</p>");
        builder.write(&epub).unwrap();

        let out = dir.path().join("out");
        let css = dir.path().join("custom.css");
        std::fs::write(&css, "body { color: red; }").unwrap();

        let report = render_htmlz(&epub, Some(&css), &out).unwrap();
        assert_eq!(report.chapters, 2);
        assert_eq!(report.archive, out.join("wings_one.htmlz"));
        assert!(report.archive.exists());

        let chapter = std::fs::read_to_string(report.unpacked.join("chap_01.html")).unwrap();
        assert!(chapter.contains("Kate Croy waited"));
        assert_eq!(
            std::fs::read_to_string(report.unpacked.join("style.css")).unwrap(),
            "body { color: red; }"
        );
        let index = std::fs::read_to_string(report.unpacked.join("index.html")).unwrap();
        assert!(index.contains("<h1>wings one</h1>"));

        // a second run replaces the unpacked directory
        std::fs::write(report.unpacked.join("stale.txt"), "x").unwrap();
        render_htmlz(&epub, None, &out).unwrap();
        assert!(!report.unpacked.join("stale.txt").exists());
    }
}
