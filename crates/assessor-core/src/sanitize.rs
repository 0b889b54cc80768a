//! Text sanitization for anything bound for storage or for the model prompt.
//!
//! Removes:
//! - literal NUL and escaped NUL sequences (`\u0000`, `\x00`, `\0`)
//! - C0/C1 control characters other than `\t`, `\n`, `\r`, plus DEL
//! - the non-characters U+FFFE and U+FFFF
//! - `\uXXXX` escapes whose code point is neither printable ASCII
//!   (0x20-0x7E) nor in 0x00A0-0xFFFD, and truncated `\u` escapes
//!   (a `\u` with no hex digit after it, as in `'\u{41}'`, is not an escape)
//!
//! Passes repeat until nothing changes, so removing one sequence can never
//! leave a new one behind. That makes [`sanitize`] idempotent.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Error messages handed to storage are capped at this many characters.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

lazy_static! {
    /// One scan over backslash sequences. An escaped backslash (`\\`) is
    /// consumed as a unit, so only escapes preceded by an even number of
    /// backslashes are rewritten.
    /// - `pair`: `\\`, kept as is
    /// - `nul`: `\u0000` or `\x00`
    /// - `zero`: `\0`, with the next digit in `octal` when there is one
    /// - `hex`: `\u` followed by one to four hex digits
    static ref ESCAPE: Regex = Regex::new(
        r"(?P<pair>\\\\)|(?P<nul>\\(?:u0000|x00))|(?P<zero>\\0)(?P<octal>[0-9])?|\\u(?P<hex>[0-9a-fA-F]{1,4})"
    )
    .unwrap();
}

/// Sanitize `text`. Pure and total.
pub fn sanitize(text: &str) -> String {
    let mut current = sanitize_once(text);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Sanitize an error message before it is written next to a result.
pub fn sanitize_error_message(message: &str) -> String {
    let clean = sanitize(message);
    let mut chars = clean.chars();
    let head: String = chars.by_ref().take(MAX_ERROR_MESSAGE_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// True when `text` contains no character that [`sanitize`] strips.
pub fn is_clean(text: &str) -> bool {
    !text.chars().any(is_forbidden_char)
}

fn sanitize_once(text: &str) -> String {
    let filtered: String = text.chars().filter(|c| !is_forbidden_char(*c)).collect();
    ESCAPE
        .replace_all(&filtered, |caps: &Captures<'_>| {
            if caps.name("pair").is_some() || caps.name("octal").is_some() {
                return caps[0].to_string();
            }
            match caps.name("hex") {
                Some(hex) if hex.as_str().len() == 4 && is_safe_escape(hex.as_str()) => {
                    caps[0].to_string()
                }
                _ => String::new(),
            }
        })
        .into_owned()
}

fn is_safe_escape(hex: &str) -> bool {
    match u32::from_str_radix(hex, 16) {
        Ok(cp) => (0x20..=0x7E).contains(&cp) || (0x00A0..=0xFFFD).contains(&cp),
        Err(_) => false,
    }
}

fn is_forbidden_char(c: char) -> bool {
    let u = c as u32;
    match u {
        0x09 | 0x0A | 0x0D => false,
        0x00..=0x1F | 0x7F..=0x9F => true,
        0xFFFE | 0xFFFF => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_literal_and_escaped_nul() {
        assert_eq!(sanitize("a\0b"), "ab");
        assert_eq!(sanitize(r"a\u0000b"), "ab");
        assert_eq!(sanitize(r"a\x00b"), "ab");
        assert_eq!(sanitize(r"a\0b"), "ab");
        assert_eq!(sanitize(r"end\0"), "end");
    }

    #[test]
    fn keeps_standard_whitespace() {
        assert_eq!(sanitize("line1\nline2\r\n\tindented"), "line1\nline2\r\n\tindented");
    }

    #[test]
    fn strips_c0_c1_and_noncharacters() {
        let input = "a\u{0001}b\u{001B}[31mc\u{007F}d\u{0085}e\u{FFFE}f\u{FFFF}g";
        assert_eq!(sanitize(input), "ab[31mcdefg");
    }

    #[test]
    fn revalidates_unicode_escapes() {
        assert_eq!(sanitize(r"caf\u00e9"), r"caf\u00e9");
        assert_eq!(sanitize(r"quote \u0022"), r"quote \u0022");
        assert_eq!(sanitize(r"bell \u0007!"), "bell !");
        assert_eq!(sanitize(r"c1 \u0085!"), "c1 !");
        assert_eq!(sanitize(r"nonchar \uFFFF!"), "nonchar !");
        assert_eq!(sanitize(r"broken \u12"), "broken ");
        assert_eq!(sanitize(r"broken \uZZ"), r"broken \uZZ");
    }

    #[test]
    fn nested_sequences_collapse_fully() {
        // Removing the inner escape exposes an outer one.
        let input = r"\u\u000000000";
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
        assert!(!once.contains(r"\u0000"));
    }

    #[test]
    fn idempotent_over_samples() {
        let samples = [
            "",
            "plain text",
            "\0\0\0",
            r"\\0\0\u0000\x00",
            r"\u\u\u0041",
            "mixed \u{0002} \u{009F} ok \u{1F600}",
            r#"{"remark":"Good\u0000","feedback":"x\x00y"}"#,
        ];
        for s in samples {
            let once = sanitize(s);
            assert_eq!(sanitize(&once), once, "not idempotent for {:?}", s);
            assert!(is_clean(&once), "control chars left in {:?}", once);
        }
    }

    #[test]
    fn escaped_backslashes_are_kept_whole() {
        assert_eq!(sanitize(r"C:\\users\\me"), r"C:\\users\\me");
        assert_eq!(sanitize(r"group \\0 used"), r"group \\0 used");
        assert_eq!(sanitize(r"\\x00 and \\u0007"), r"\\x00 and \\u0007");
        assert_eq!(sanitize(r"\\\\u0000"), r"\\\\u0000");
        // An odd run still ends in a live escape.
        assert_eq!(sanitize(r"\\\u0007!"), r"\\!");
        assert_eq!(sanitize(r"\\\0x"), r"\\x");
    }

    #[test]
    fn source_code_escapes_survive_prompts() {
        assert_eq!(sanitize(r"let c = '\u{41}';"), r"let c = '\u{41}';");
        assert_eq!(sanitize(r"if (c == '\0') return;"), r"if (c == '') return;");
        assert_eq!(sanitize(r#"printf(\"%s\\n\", s);"#), r#"printf(\"%s\\n\", s);"#);
    }

    #[test]
    fn octal_like_escapes_untouched() {
        assert_eq!(sanitize(r"\012"), r"\012");
    }

    #[test]
    fn error_messages_are_capped() {
        let long = "x".repeat(MAX_ERROR_MESSAGE_CHARS + 10);
        let out = sanitize_error_message(&long);
        assert_eq!(out.chars().count(), MAX_ERROR_MESSAGE_CHARS + 3);
        assert!(out.ends_with("..."));
        assert_eq!(sanitize_error_message("boom\0"), "boom");
    }
}
