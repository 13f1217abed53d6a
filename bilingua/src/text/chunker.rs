//! Splitting long passages into speech-synthesis requests.
//!
//! TTS endpoints cap the input length, so a chapter is cut at sentence
//! boundaries first, then at clause punctuation, then between words.

use super::cleaner::clean_text;
use super::seams::split_into_sentences;

/// Maximum recursion depth for splitting long sentences.
const MAX_SPLIT_DEPTH: usize = 10;

/// Clause delimiters tried in order of preference.
const DELIMITERS: &[&str] = &[";", ":", ",", " - "];

/// Split text into chunks that aim for `target_size` and never exceed `max_size` bytes.
pub fn chunk_text(text: &str, target_size: usize, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(target_size).max(1);
    let text = clean_text(text);

    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current_chunk = String::new();

    for sentence in split_into_sentences(&text) {
        if sentence.len() > max_size {
            if !current_chunk.is_empty() {
                chunks.push(std::mem::take(&mut current_chunk));
            }
            chunks.extend(
                split_long_sentence(&sentence, max_size, 0)
                    .into_iter()
                    .filter(|part| !part.is_empty()),
            );
        } else if current_chunk.is_empty() {
            current_chunk = sentence;
        } else if current_chunk.len() + sentence.len() + 1 <= target_size {
            current_chunk.push(' ');
            current_chunk.push_str(&sentence);
        } else {
            chunks.push(std::mem::replace(&mut current_chunk, sentence));
        }
    }

    let last = current_chunk.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }

    chunks
}

/// Chunks for one synthesis pass with a single size limit.
pub fn chunk_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    chunk_text(text, max_chars, max_chars)
}

/// Split a long sentence into smaller chunks at natural break points.
fn split_long_sentence(sentence: &str, max_length: usize, depth: usize) -> Vec<String> {
    if depth > MAX_SPLIT_DEPTH {
        return hard_split(sentence, max_length);
    }

    if sentence.len() <= max_length {
        return vec![sentence.to_string()];
    }

    for delimiter in DELIMITERS {
        if !sentence.contains(delimiter) {
            continue;
        }
        let parts: Vec<&str> = sentence.split(delimiter).collect();
        let chunks = reassemble_parts(&parts, delimiter, max_length);
        if chunks.len() > 1 {
            let mut final_chunks = Vec::new();
            for chunk in chunks {
                if chunk.len() > max_length {
                    final_chunks.extend(split_long_sentence(&chunk, max_length, depth + 1));
                } else if !chunk.is_empty() {
                    final_chunks.push(chunk);
                }
            }
            return final_chunks;
        }
    }

    let word_split = split_on_words(sentence, max_length);
    if word_split.len() > 1 && word_split.iter().all(|w| w.len() <= max_length) {
        return word_split;
    }

    hard_split(sentence, max_length)
}

/// Reassemble split parts into chunks that fit within max_length.
///
/// The delimiter stays attached to the part it ended.
fn reassemble_parts(parts: &[&str], delimiter: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let keep = delimiter.trim();

    for (i, part) in parts.iter().enumerate() {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let piece = if i + 1 < parts.len() && !keep.is_empty() {
            format!("{}{}", part, keep)
        } else {
            part.to_string()
        };

        if current.is_empty() {
            current = piece;
        } else if current.len() + piece.len() + 1 <= max_length {
            current.push(' ');
            current.push_str(&piece);
        } else {
            chunks.push(std::mem::replace(&mut current, piece));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split text on word boundaries.
fn split_on_words(text: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + word.len() + 1 <= max_length {
            current.push(' ');
            current.push_str(word);
        } else {
            chunks.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Hard split at byte budget, respecting char boundaries (last resort).
fn hard_split(text: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if current.len() + ch.len_utf8() > max_length && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_chunk_short_text() {
        let chunks = chunk_text("Hello world. How are you?", 280, 350);
        assert_eq!(chunks, vec!["Hello world. How are you?"]);
    }

    #[test]
    fn test_chunk_long_text() {
        let text = "First sentence. Second sentence. Third sentence. Fourth sentence. Fifth sentence. Sixth sentence. Seventh sentence. Eighth sentence.";
        let chunks = chunk_text(text, 50, 100);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 100, "Chunk too long: {} chars", chunk.len());
        }
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("", 280, 350).is_empty());
        assert!(chunk_text("   \n\n   ", 280, 350).is_empty());
    }

    #[test]
    fn test_split_long_sentence_keeps_punctuation() {
        let sentence = "She had waited, as she had waited so often, for her father to come in; and he kept her waiting unconscionably.";
        let parts = split_long_sentence(sentence, 60, 0);
        assert!(parts.len() > 1);
        assert!(parts[0].ends_with(';') || parts[0].ends_with(','));
        for part in &parts {
            assert!(part.len() <= 60, "Part too long: {}", part);
        }
    }

    #[test]
    fn test_hard_split_multibyte() {
        let parts = hard_split("àèìòù", 4);
        assert_eq!(parts, vec!["àè", "ìò", "ù"]);
    }

    #[test]
    fn test_split_on_words() {
        let parts = split_on_words("one two three four five", 10);
        assert_eq!(parts, vec!["one two", "three four", "five"]);
    }

    proptest! {
        #[test]
        fn chunks_never_exceed_max(words in proptest::collection::vec("[a-zà-ù]{1,12}[.,;]?", 1..200), max in 20usize..200) {
            let text = words.join(" ");
            for chunk in chunk_for_speech(&text, max) {
                prop_assert!(chunk.len() <= max, "{} > {}", chunk.len(), max);
                prop_assert!(!chunk.trim().is_empty());
            }
        }
    }
}
