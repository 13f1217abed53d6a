// EPUB 3 packaging

use anyhow::{Context, Result};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::text::html::{escape, to_xhtml};

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

const STYLESHEET_HREF: &str = "style/nav.css";

/// One page of the book
#[derive(Debug, Clone)]
pub struct EpubChapter {
    pub title: String,
    /// Body markup; converted to XHTML when written
    pub body: String,
}

/// Collects pages and metadata, then writes a complete EPUB 3 package
/// with NCX and nav document for older readers.
#[derive(Debug, Clone)]
pub struct EpubBuilder {
    title: String,
    author: Option<String>,
    language: String,
    stylesheet: String,
    chapters: Vec<EpubChapter>,
}

impl EpubBuilder {
    pub fn new(title: &str, author: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            author: author.map(str::to_string),
            language: "en".to_string(),
            stylesheet: String::new(),
            chapters: Vec::new(),
        }
    }

    pub fn stylesheet(mut self, css: &str) -> Self {
        self.stylesheet = css.to_string();
        self
    }

    pub fn add_chapter(&mut self, title: &str, body: &str) {
        self.chapters.push(EpubChapter {
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    /// Stable identifier derived from title and author.
    pub fn identifier(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.title.as_bytes());
        hasher.update(b"\0");
        hasher.update(self.author.as_deref().unwrap_or_default().as_bytes());
        format!("bilingua-{}", &format!("{:x}", hasher.finalize())[..16])
    }

    /// Write the package to `path`
    pub fn write(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        self.write_to(file)
            .with_context(|| format!("Failed to write EPUB {}", path.display()))
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = zip::ZipWriter::new(writer);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // must be the first entry, uncompressed
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(self.package_document().as_bytes())?;

        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(self.ncx().as_bytes())?;

        zip.start_file("OEBPS/nav.xhtml", deflated)?;
        zip.write_all(self.nav_document().as_bytes())?;

        zip.start_file(format!("OEBPS/{}", STYLESHEET_HREF), deflated)?;
        zip.write_all(self.stylesheet.as_bytes())?;

        for (i, chapter) in self.chapters.iter().enumerate() {
            zip.start_file(format!("OEBPS/{}", chapter_href(i)), deflated)?;
            zip.write_all(self.chapter_document(chapter).as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    fn package_document(&self) -> String {
        let modified = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let creator = self
            .author
            .as_deref()
            .map(|a| format!("    <dc:creator>{}</dc:creator>\n", escape(a)))
            .unwrap_or_default();

        let mut manifest = String::new();
        let mut spine = String::from("    <itemref idref=\"nav\"/>\n");
        for i in 0..self.chapters.len() {
            manifest.push_str(&format!(
                "    <item id=\"{id}\" href=\"{href}\" media-type=\"application/xhtml+xml\"/>\n",
                id = chapter_id(i),
                href = chapter_href(i)
            ));
            spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", chapter_id(i)));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="book-id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="book-id">{identifier}</dc:identifier>
    <dc:title>{title}</dc:title>
{creator}    <dc:language>{language}</dc:language>
    <meta property="dcterms:modified">{modified}</meta>
  </metadata>
  <manifest>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
    <item id="nav" href="nav.xhtml" media-type="application/xhtml+xml" properties="nav"/>
    <item id="style_nav" href="{css}" media-type="text/css"/>
{manifest}  </manifest>
  <spine toc="ncx">
{spine}  </spine>
</package>
"#,
            identifier = self.identifier(),
            title = escape(&self.title),
            language = escape(&self.language),
            css = STYLESHEET_HREF,
        )
    }

    fn ncx(&self) -> String {
        let mut points = String::new();
        for (i, chapter) in self.chapters.iter().enumerate() {
            points.push_str(&format!(
                r#"    <navPoint id="navpoint-{n}" playOrder="{n}">
      <navLabel><text>{title}</text></navLabel>
      <content src="{href}"/>
    </navPoint>
"#,
                n = i + 1,
                title = escape(&chapter.title),
                href = chapter_href(i)
            ));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{identifier}"/>
    <meta name="dtb:depth" content="1"/>
  </head>
  <docTitle><text>{title}</text></docTitle>
  <navMap>
{points}  </navMap>
</ncx>
"#,
            identifier = self.identifier(),
            title = escape(&self.title),
        )
    }

    fn nav_document(&self) -> String {
        let items: String = self
            .chapters
            .iter()
            .enumerate()
            .map(|(i, c)| format!("      <li><a href=\"{}\">{}</a></li>\n", chapter_href(i), escape(&c.title)))
            .collect();

        self.xhtml_page(
            &self.title,
            &format!("  <nav epub:type=\"toc\" id=\"toc\">\n    <h1>{}</h1>\n    <ol>\n{}    </ol>\n  </nav>", escape(&self.title), items),
        )
    }

    fn chapter_document(&self, chapter: &EpubChapter) -> String {
        self.xhtml_page(&chapter.title, &to_xhtml(&chapter.body))
    }

    fn xhtml_page(&self, title: &str, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="{css}"/>
</head>
<body>
{body}
</body>
</html>
"#,
            lang = escape(&self.language),
            title = escape(title),
            css = STYLESHEET_HREF,
        )
    }
}

fn chapter_id(index: usize) -> String {
    format!("chap_{}", index + 1)
}

fn chapter_href(index: usize) -> String {
    format!("chap_{}.xhtml", index + 1)
}
