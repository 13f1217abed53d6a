//! Editions rendered from a bilingual file (EPUB, HTML) or from a finished
//! EPUB (HTMLZ).

pub mod epub;
pub mod html;
pub mod htmlz;
pub mod style;
