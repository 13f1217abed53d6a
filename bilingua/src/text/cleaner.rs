//! Normalising prose before it is sent to a speech engine.

/// Typographic characters the TTS voices stumble over, with plain replacements.
fn replacement(c: char) -> Option<&'static str> {
    let plain = match c {
        '\u{2018}' | '\u{2019}' | '\u{2032}' => "'",
        '\u{201c}' | '\u{201d}' | '\u{2033}' | '\u{00ab}' | '\u{00bb}' => "\"",
        '\u{2011}'..='\u{2015}' => "-",
        '\u{2026}' => ".",
        '\u{00a0}' | '\u{2009}' | '\u{202f}' => " ",
        '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' | '\u{00ad}' => "",
        '\u{2039}' => "<",
        '\u{203a}' => ">",
        '\u{2022}' => "",
        _ => return None,
    };
    Some(plain)
}

/// Clean text for speech synthesis.
///
/// Smart quotes and dashes become ASCII, control characters other than
/// newline and tab are dropped, runs of blanks collapse, at most one blank
/// line is kept and repeated periods shrink to one.
pub fn clean_text(text: &str) -> String {
    let mut mapped = String::with_capacity(text.len());

    for c in text.chars() {
        match replacement(c) {
            Some(plain) => mapped.push_str(plain),
            None if c == '\n' || c == '\t' || !c.is_control() => mapped.push(c),
            None => {}
        }
    }

    collapse_periods(&collapse_whitespace(&mapped))
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    let mut newlines = 0;

    for c in text.chars() {
        match c {
            '\n' => {
                pending_space = false;
                newlines += 1;
                if newlines <= 2 {
                    // no trailing blank before a line break
                    while out.ends_with(' ') {
                        out.pop();
                    }
                    out.push('\n');
                }
            }
            ' ' | '\t' => pending_space = true,
            _ => {
                if pending_space && !out.is_empty() && !out.ends_with('\n') {
                    out.push(' ');
                }
                pending_space = false;
                newlines = 0;
                out.push(c);
            }
        }
    }

    out.trim().to_string()
}

fn collapse_periods(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_smart_quotes() {
        let text = "\u{201c}Hello,\u{201d} said John. \u{2018}It\u{2019}s nice.\u{2019}";
        assert_eq!(clean_text(text), "\"Hello,\" said John. 'It's nice.'");
    }

    #[test]
    fn test_clean_guillemets_and_dashes() {
        assert_eq!(clean_text("«Taci» – disse — «taci»"), "\"Taci\" - disse - \"taci\"");
    }

    #[test]
    fn test_clean_ellipsis_and_periods() {
        assert_eq!(clean_text("Wait… what?"), "Wait. what?");
        assert_eq!(clean_text("What.. is... this...."), "What. is. this.");
    }

    #[test]
    fn test_clean_whitespace() {
        assert_eq!(
            clean_text("Hello   world  \n\n\n\nNew\tparagraph"),
            "Hello world\n\nNew paragraph"
        );
    }

    #[test]
    fn test_clean_invisible_and_control_chars() {
        assert_eq!(clean_text("Hello\x00World\u{200b}\x07Te\u{00ad}st\u{feff}"), "HelloWorldTest");
    }

    #[test]
    fn test_canto_bullet_dropped() {
        assert_eq!(clean_text("Inferno \u{2022} Canto I"), "Inferno Canto I");
    }
}
