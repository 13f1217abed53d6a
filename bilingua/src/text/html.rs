//! HTML helpers for EPUB content and the bilingual file.
//!
//! Book markup is handled with regular expressions rather than a DOM: the
//! documents are machine-generated XHTML and the pipeline only ever needs
//! headings, paragraphs and line breaks.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(h[1-6]|p)\b[^>]*>(.*?)</(?:h[1-6]|p)\s*>").unwrap());

static SCENE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:<br\s*/?>\s*){3,}").unwrap());

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

static VOID_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<(br|hr)(\s[^>]*?)?\s*/?>").unwrap());

const SCENE_BREAK_HTML: &str = "<br/>&nbsp;<br/>&nbsp;<br/>";

/// A heading or paragraph element found in a document, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name (`p`, `h1` … `h6`).
    pub tag: String,
    /// The element exactly as written, tags included.
    pub outer: String,
    /// Markup between the opening and closing tag.
    pub inner: String,
}

impl Element {
    pub fn text(&self) -> String {
        strip_tags(&self.inner)
    }
}

/// Headings and paragraphs of `html` in document order.
pub fn elements(html: &str) -> Vec<Element> {
    BLOCK
        .captures_iter(html)
        .map(|caps| Element {
            tag: caps[1].to_ascii_lowercase(),
            outer: caps[0].to_string(),
            inner: caps[2].to_string(),
        })
        .collect()
}

/// Literal `<p>` elements of `html`.
pub fn paragraphs(html: &str) -> Vec<String> {
    elements(html)
        .into_iter()
        .filter(|e| e.tag == "p")
        .map(|e| e.outer)
        .collect()
}

/// Text of the first non-empty `<h1>`, falling back to the first `<h2>`.
pub fn first_heading(html: &str) -> Option<String> {
    let blocks = elements(html);
    ["h1", "h2"].iter().find_map(|tag| {
        blocks
            .iter()
            .filter(|e| e.tag == *tag)
            .map(|e| super::squash_whitespace(&e.text()))
            .find(|t| !t.is_empty())
    })
}

/// Convert HTML to readable plain text.
pub fn html_to_text(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), 1000);
    decode_entities(&join_lines(&text))
}

/// Join wrapped lines, keeping one blank line between paragraphs.
fn join_lines(text: &str) -> String {
    let mut result = String::new();
    let mut paragraph_break = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !paragraph_break && !result.is_empty() {
                result.push_str("\n\n");
                paragraph_break = true;
            }
            continue;
        }

        paragraph_break = false;
        if !result.is_empty() && !result.ends_with('\n') {
            result.push(' ');
        }
        result.push_str(trimmed);
    }

    result.trim_end().to_string()
}

/// Remove all tags and decode entities. Line breaks become newlines.
pub fn strip_tags(html: &str) -> String {
    let with_newlines = LINE_BREAK.replace_all(html, "\n");
    decode_entities(&TAG.replace_all(&with_newlines, ""))
}

/// Decode named and numeric character references.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00a0}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "laquo" => '\u{00ab}',
        "raquo" => '\u{00bb}',
        "bull" => '\u{2022}',
        "middot" => '\u{00b7}',
        _ => return None,
    };
    Some(c)
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Each non-empty line of `text` as an escaped `<p>` paragraph.
pub fn lines_to_paragraphs(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>", escape(line)))
        .collect()
}

/// Keep triple line breaks as a visible scene break and turn single
/// breaks into spaces, so hard-wrapped prose reflows.
pub fn smooth_line_breaks(html: &str) -> String {
    const MARK: &str = "\u{0}SCENE\u{0}";
    let marked = SCENE_BREAK.replace_all(html, MARK);
    let spaced = LINE_BREAK.replace_all(&marked, " ");
    spaced.replace(MARK, SCENE_BREAK_HTML)
}

/// Make HTML fragments acceptable to an XML parser: self-closed void
/// elements, numeric `nbsp`, and stray ampersands escaped.
pub fn to_xhtml(html: &str) -> String {
    let closed = VOID_TAG.replace_all(html, |caps: &regex::Captures| {
        format!(
            "<{}{}/>",
            caps[1].to_ascii_lowercase(),
            caps.get(2).map_or("", |m| m.as_str().trim_end())
        )
    });
    escape_stray_ampersands(&closed.replace("&nbsp;", "&#160;"))
}

fn escape_stray_ampersands(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let is_reference = rest[1..].find(';').is_some_and(|semi| {
            let name = &rest[1..1 + semi];
            match name.strip_prefix('#') {
                Some(num) => match num.strip_prefix(['x', 'X']) {
                    Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
                    None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
                },
                None => {
                    matches!(name, "amp" | "lt" | "gt" | "quot" | "apos")
                }
            }
        });

        if is_reference {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = &rest[1..];
    }

    out.push_str(rest);
    out
}
