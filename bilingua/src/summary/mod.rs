//! LLM summaries of a bilingual file: per chapter for novels, per canto
//! for the Commedia.

pub mod cantos;
pub mod chapters;
pub mod format;
