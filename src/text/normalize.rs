//! Whitespace normalisation.

/// Collapse every whitespace run (spaces, tabs, newlines, …) into a single
/// ASCII space and trim both ends.
///
/// Sentences must never be broken by the line wrapping of the source text,
/// so this runs before any boundary detection.
///
/// ```
/// use readaloud::text::normalize_whitespace;
///
/// assert_eq!(normalize_whitespace("  a\n\tb   c "), "a b c");
/// assert_eq!(normalize_whitespace("\n \n"), "");
/// ```
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn newlines_become_spaces() {
        assert_eq!(
            normalize_whitespace("This is a sentence\nspread across lines."),
            "This is a sentence spread across lines."
        );
    }

    #[test]
    fn crlf_and_tabs_collapse() {
        assert_eq!(normalize_whitespace("one\r\n\r\ntwo\t\tthree"), "one two three");
    }

    #[test]
    fn non_breaking_space_is_whitespace() {
        assert_eq!(normalize_whitespace("a\u{00A0}\u{00A0}b"), "a b");
    }
}
