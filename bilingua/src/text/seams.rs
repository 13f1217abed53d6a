//! Sentence splitting using the seams library (dialog-aware).

use once_cell::sync::Lazy;
use regex::Regex;
use seams::sentence_detector::dialog_detector::SentenceDetectorDialog;
use std::sync::OnceLock;

/// Global detector instance; `None` when the detector failed to build.
static DETECTOR: OnceLock<Option<SentenceDetectorDialog>> = OnceLock::new();

/// Terminal punctuation, optional closing quote, then whitespace.
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?;]["'\u{201d}\u{2019}»]?\s+"#).unwrap());

fn detector() -> Option<&'static SentenceDetectorDialog> {
    DETECTOR
        .get_or_init(|| {
            let detector = SentenceDetectorDialog::new().ok();
            if detector.is_none() {
                log::warn!("seams sentence detector unavailable, using punctuation splitting");
            }
            detector
        })
        .as_ref()
}

/// Split text into sentences, preferring the dialog-aware seams detector.
pub fn split_into_sentences(text: &str) -> Vec<String> {
    let detected = detector().and_then(|d| d.detect_sentences_borrowed(text).ok());

    match detected {
        Some(sentences) => sentences
            .iter()
            .map(|s| s.normalize())
            .filter(|s| !s.is_empty())
            .collect(),
        None => split_on_punctuation(text),
    }
}

/// Fallback splitter on sentence-final punctuation.
fn split_on_punctuation(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in SENTENCE_END.find_iter(text) {
        let sentence = text[start..m.end()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        start = m.end();
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_into_sentences() {
        let sentences = split_into_sentences("First sentence. Second sentence.");
        assert_eq!(sentences.len(), 2);
        assert!(sentences[0].contains("First"));
        assert!(sentences[1].contains("Second"));
    }

    #[test]
    fn test_punctuation_fallback() {
        let sentences = split_on_punctuation("Che fai? \"Vieni!\" disse. E poi");
        assert_eq!(sentences, vec!["Che fai?", "\"Vieni!\"", "disse.", "E poi"]);
    }
}
