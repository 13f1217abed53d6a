//! Bilingual file → HTML pages.
//!
//! Files with canto headings get one page per canto plus an index; anything
//! else becomes one page.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::style::{CANTO_CSS, CANTO_SUMMARY_STYLE, CANTO_TITLE_STYLE, READING_CSS};
use crate::bilingual::{self, BilingualText, CantoGroup, Section};
use crate::summary::format::parse_canto_summaries;
use crate::text::html::escape;
use crate::text::roman::roman_to_int;

const CANTICLES: [&str; 3] = ["Inferno", "Purgatorio", "Paradiso"];

/// `Inferno • Canto IV` → `Inferno_Canto_IV.html`
pub fn canto_file_name(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().filter(|p| *p != "•").collect();
    format!("{}.html", parts.join("_"))
}

/// Inferno before Purgatorio before Paradiso, then by numeral.
pub fn canto_sort_key(name: &str) -> (usize, u32) {
    let location = name.split_whitespace().next().unwrap_or_default();
    let canticle = CANTICLES
        .iter()
        .position(|c| c.eq_ignore_ascii_case(location))
        .unwrap_or(CANTICLES.len());
    let numeral = name
        .split_whitespace()
        .last()
        .and_then(roman_to_int)
        .unwrap_or(0);
    (canticle, numeral)
}

fn document(title: &str, css: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\"/>\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\n\
         <title>{}</title>\n<style>\n{}</style>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        css,
        body
    )
}

/// Verses of the original, one per line, `<br/>` between them.
fn source_lines(section: &Section) -> String {
    section
        .original_text()
        .lines()
        .map(escape)
        .collect::<Vec<_>>()
        .join("<br/>\n")
}

fn segment(section: &Section) -> String {
    let mut html = format!(
        "<div class=\"segment\">\n<div class=\"source-text original\">{}</div>\n",
        source_lines(section)
    );
    if let Some(translation) = &section.translation_html {
        html.push_str(&format!("<div class=\"translation\">{}</div>\n", translation));
    }
    html.push_str("</div>\n");
    html
}

/// One canto page. `prev` and `next` are file names of neighbouring pages.
pub fn canto_page(
    canto: &CantoGroup<'_>,
    summary: Option<&str>,
    prev: Option<&str>,
    next: Option<&str>,
) -> String {
    let mut body = format!(
        "<h1 style=\"{}\">{}</h1>\n",
        CANTO_TITLE_STYLE,
        escape(canto.name)
    );
    if let Some(summary) = summary {
        body.push_str(&format!(
            "<div class=\"canto-summary\" style=\"{}\">{}</div>\n",
            CANTO_SUMMARY_STYLE,
            escape(summary)
        ));
    }
    for section in canto.sections {
        body.push_str(&segment(section));
    }

    body.push_str("<nav class=\"pager\">\n");
    if let Some(prev) = prev {
        body.push_str(&format!("<a href=\"{}\">&larr; Previous</a>\n", prev));
    }
    body.push_str("<a href=\"index.html\">Contents</a>\n");
    if let Some(next) = next {
        body.push_str(&format!("<a href=\"{}\">Next &rarr;</a>\n", next));
    }
    body.push_str("</nav>\n");

    document(canto.name, CANTO_CSS, &body)
}

/// Table of contents over `names`, already in reading order.
pub fn index_page(title: &str, names: &[&str]) -> String {
    let links: String = names
        .iter()
        .map(|name| {
            format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                canto_file_name(name),
                escape(name)
            )
        })
        .collect();
    let body = format!(
        "<h1 style=\"{}\">{}</h1>\n<ol class=\"cantos\">\n{}</ol>\n",
        CANTO_TITLE_STYLE,
        escape(title),
        links
    );
    document(title, CANTO_CSS, &body)
}

/// All sections on one page, chapter headings kept.
pub fn single_page(text: &BilingualText, title: &str) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(title));
    for section in &text.sections {
        if let Some(chapter) = &section.chapter {
            body.push_str(&format!("<h2>{}</h2>\n", escape(chapter)));
        }
        body.push_str(&format!(
            "<div class='original-text justify-text'>\n{}\n</div>\n",
            section.original_text().lines().map(|l| format!("<p>{}</p>", escape(l))).collect::<String>()
        ));
        if let Some(translation) = &section.translation_html {
            body.push_str(&format!(
                "<details class='modern-translation'>\n<summary>Click to show contemporary translation</summary>\n\
                 <div class='translation-content'>{}</div>\n</details>\n",
                translation
            ));
        }
    }
    document(title, READING_CSS, &body)
}

/// Render `input` into `out_dir`. Returns the files written.
pub fn render_html(input: &Path, out_dir: &Path, summaries: Option<&Path>) -> Result<Vec<PathBuf>> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let text = bilingual::parse(&content);
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bilingual".to_string());
    let title = text.title.clone().unwrap_or_else(|| stem.replace('_', " "));

    let mut written = Vec::new();

    if !text.has_cantos() {
        let path = out_dir.join(format!("{}.html", stem));
        std::fs::write(&path, single_page(&text, &title))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
        return Ok(written);
    }

    let summary_map: HashMap<String, String> = match summaries {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read summaries {}", path.display()))?;
            parse_canto_summaries(&raw)
                .into_iter()
                .map(|s| (s.name, s.text))
                .collect()
        }
        None => HashMap::new(),
    };

    let mut cantos = text.cantos();
    cantos.sort_by_key(|c| canto_sort_key(c.name));
    let files: Vec<String> = cantos.iter().map(|c| canto_file_name(c.name)).collect();

    for (i, canto) in cantos.iter().enumerate() {
        let prev = i.checked_sub(1).map(|p| files[p].as_str());
        let next = files.get(i + 1).map(String::as_str);
        let summary = summary_map.get(canto.name).map(String::as_str);
        if summary.is_none() && !summary_map.is_empty() {
            log::warn!("no summary for {}", canto.name);
        }

        let path = out_dir.join(&files[i]);
        std::fs::write(&path, canto_page(canto, summary, prev, next))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    let names: Vec<&str> = cantos.iter().map(|c| c.name).collect();
    let index = out_dir.join("index.html");
    std::fs::write(&index, index_page(&title, &names))
        .with_context(|| format!("Failed to write {}", index.display()))?;
    written.push(index);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bilingual::writer;
    use crate::summary::format::canto_block;

    #[test]
    fn test_canto_file_name() {
        assert_eq!(canto_file_name("Inferno • Canto IV"), "Inferno_Canto_IV.html");
    }

    #[test]
    fn test_canto_order() {
        let mut names = vec![
            "Paradiso • Canto I",
            "Inferno • Canto X",
            "Purgatorio • Canto II",
            "Inferno • Canto IX",
        ];
        names.sort_by_key(|n| canto_sort_key(n));
        assert_eq!(
            names,
            vec!["Inferno • Canto IX", "Inferno • Canto X", "Purgatorio • Canto II", "Paradiso • Canto I"]
        );
    }

    fn comedy() -> String {
        let mut content = writer::header("Commedia", Some("Dante Alighieri"));
        content.push_str(&writer::section(
            1,
            "<h3 class='canto-header'>Purgatorio • Canto I</h3>\n<p>Per correr miglior acque<br/>alza le vele</p>",
            "<p>To run over better waters</p>",
        ));
        content.push_str(&writer::section(
            2,
            "<h3 class='canto-header'>Inferno • Canto I</h3>\n<p>Nel mezzo del cammin</p>",
            "<p>Midway</p>",
        ));
        content
    }

    #[test]
    fn test_render_canto_pages() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("comedy_Bilingual.txt");
        std::fs::write(&input, comedy()).unwrap();
        let summaries = dir.path().join("sums.txt");
        std::fs::write(&summaries, canto_block("Inferno • Canto I", Some((2, 2)), "Dante is lost.")).unwrap();

        let out = dir.path().join("site");
        let written = render_html(&input, &out, Some(&summaries)).unwrap();
        assert_eq!(written.len(), 3);

        let inferno = std::fs::read_to_string(out.join("Inferno_Canto_I.html")).unwrap();
        assert!(inferno.contains("class=\"canto-summary\""));
        assert!(inferno.contains("Dante is lost."));
        assert!(inferno.contains("<a href=\"Purgatorio_Canto_I.html\">Next &rarr;</a>"));
        assert!(!inferno.contains("canto-header"));

        let purgatorio = std::fs::read_to_string(out.join("Purgatorio_Canto_I.html")).unwrap();
        assert!(purgatorio.contains("Per correr miglior acque<br/>\nalza le vele"));
        assert!(!purgatorio.contains("canto-summary\""));

        let index = std::fs::read_to_string(out.join("index.html")).unwrap();
        let inf = index.find("Inferno_Canto_I.html").unwrap();
        let purg = index.find("Purgatorio_Canto_I.html").unwrap();
        assert!(inf < purg);
    }

    #[test]
    fn test_single_page_without_cantos() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("screw_Bilingual.txt");
        let mut content = writer::header("The Turn of the Screw", None);
        content.push_str(&writer::section(1, "<p>The story had held us</p>", "<p>We were gripped</p>"));
        std::fs::write(&input, content).unwrap();

        let written = render_html(&input, dir.path(), None).unwrap();
        assert_eq!(written, vec![dir.path().join("screw_Bilingual.html")]);
        let page = std::fs::read_to_string(&written[0]).unwrap();
        assert!(page.contains("<p>The story had held us</p>"));
        assert!(page.contains("<div class='translation-content'><p>We were gripped</p></div>"));
    }
}
