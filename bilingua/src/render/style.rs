//! Stylesheets shipped with the renderers.

/// Chapter edition: summary boxes and a layout that adapts to phones and
/// tablets.
pub const RESPONSIVE_CSS: &str = r#"body { font-family: serif; line-height: 1.5; margin: 0; padding: 1em; }
h1.chapter-title { text-align: center; color: #333; margin-bottom: 1.2em; font-size: 1.8em; }

.summary-box { margin-bottom: 15px; border: 1px solid #ddd; border-radius: 4px; overflow: hidden; }
summary { padding: 10px; background-color: #eeeeee; cursor: pointer; font-weight: bold; list-style: none; }
.summary-content {
    padding: 15px;
    background-color: #f6f6f6;
    border-top: 1px solid #ddd;
    font-style: italic;
    color: #444;
    font-size: 1em;
}
.summary-content p { margin-bottom: 1em; }

.original-text { color: #000; margin-top: 1.5em; display: block; font-size: 1.1em; }
.translation-content { color: #666; font-style: italic; margin-bottom: 1.5em; display: block; font-size: 1em; }

@media only screen and (max-width: 480px) {
    body { padding: 0.5em; }
    h1.chapter-title { font-size: 1.4em; }
    .summary-content { font-size: 0.9em; padding: 10px; }
    .original-text { font-size: 1em; }
    .translation-content { font-size: 0.9em; }
}

@media only screen and (min-width: 481px) and (max-width: 768px) {
    body { padding: 1.5em; }
    h1.chapter-title { font-size: 1.6em; }
    .summary-content { font-size: 0.95em; }
}
"#;

/// Single-page edition: justified original, boxed translations.
pub const READING_CSS: &str = r#"@namespace epub "http://www.idpf.org/2007/ops";

br { display: block; content: ""; margin-top: 0.5em; }
body {
    font-family: "Georgia", serif;
    padding: 1.5em;
    line-height: 1.7;
    background-color: #ffffff;
}
.justify-text {
    text-align: justify !important;
    text-justify: inter-word;
    hyphens: auto;
    display: block;
    margin-bottom: 2em;
    text-indent: 1.5em;
}
.original-text { color: #000000; }
.translation-content {
    font-family: "Helvetica", sans-serif;
    font-style: italic;
    color: #444444;
    background-color: #f9f9f9;
    padding: 15px;
    border-left: 3px solid #005a9c;
    margin-bottom: 30px;
    text-align: left;
    text-indent: 0;
}
summary {
    color: #005a9c;
    font-family: "Helvetica", sans-serif;
    font-weight: bold;
    cursor: pointer;
    padding: 12px;
    background: #f0f4f8;
    border-radius: 8px;
    margin-top: 15px;
}
"#;

/// Canto pages of the HTML edition.
pub const CANTO_CSS: &str = r#"body { font-family: "Georgia", serif; max-width: 46em; margin: 0 auto; padding: 1.5em; line-height: 1.6; }
.segment { margin-bottom: 2em; padding: 0; border-left: none; }
.source-text { font-style: italic; color: #2c3e50; margin-bottom: 10px; display: block; }
.original { white-space: pre-wrap; }
.translation { color: #7f8c8d; display: block; padding-left: 20px; border-left: 3px solid #eee; }
nav.pager { display: flex; justify-content: space-between; margin: 2em 0; }
ol.cantos li { margin: 0.3em 0; }
"#;

pub const CANTO_TITLE_STYLE: &str =
    "text-align: center; color: black !important; border-bottom: 2px solid #333; padding-bottom: 10px;";

pub const CANTO_SUMMARY_STYLE: &str =
    "background: #f0f4f8; border-left: 5px solid #2c3e50; padding: 15px; margin-bottom: 25px; font-style: italic;";

/// Default `style.css` of HTMLZ exports.
pub const HTMLZ_CSS: &str = r#"body { font-family: "Georgia", serif; max-width: 42em; margin: 0 auto; padding: 1em; line-height: 1.6; color: #222; }
h1 { text-align: center; }
.original-text { display: block; margin-top: 1.5em; }
.justify-text { text-align: justify; hyphens: auto; }
details.modern-translation summary { color: #005a9c; cursor: pointer; font-weight: bold; }
.translation-content { color: #555; font-style: italic; background: #f9f9f9; border-left: 3px solid #005a9c; padding: 0.8em 1em; }
.summary-box { margin-bottom: 1em; border: 1px solid #ddd; border-radius: 4px; }
.summary-content { padding: 0.8em 1em; background: #f6f6f6; font-style: italic; }
@media only screen and (max-width: 480px) {
    body { padding: 0.5em; }
}
"#;
