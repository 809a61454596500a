//! Sentence segmentation for sequential narration.
//!
//! # Boundary rule
//!
//! ```text
//! normalised text ──scan──▶  <clause> [.!?]+ ["'”’]?  (whitespace | end)
//!                                      ^^^^^  ^^^^^^^
//!                                      run    one closing quote
//! ```
//!
//! A run of terminal marks counts as one boundary, so `...` and `?!` never
//! produce empty sentences.  A closing quote right after the run stays with
//! the clause it closes: `"Like this." He said.` yields `"Like this."` and
//! `He said.`.  Marks that are not followed by whitespace (`3.14`, `a.m.x`)
//! do not split.
//!
//! Abbreviations such as `Mr.` are not special-cased; every
//! terminal mark followed by a space ends a sentence.

use super::normalize::normalize_whitespace;

/// Returns `true` for the characters that end a sentence.
pub fn is_terminal_mark(ch: char) -> bool {
    matches!(ch, '.' | '!' | '?')
}

/// Returns `true` for quote characters that may close a sentence.
pub fn is_closing_quote(ch: char) -> bool {
    matches!(ch, '"' | '\'' | '\u{201D}' | '\u{2019}')
}

/// Split `text` into trimmed, non-empty sentences in reading order.
///
/// Whitespace-only input yields an empty `Vec`; text without any terminal
/// punctuation yields exactly one sentence.  Re-joining the result with
/// single spaces reproduces [`normalize_whitespace`]`(text)`.
///
/// ```
/// use readaloud::text::segment;
///
/// assert_eq!(
///     segment("Hello! How are you? I am fine."),
///     vec!["Hello!", "How are you?", "I am fine."]
/// );
/// assert!(segment("   ").is_empty());
/// ```
pub fn segment(text: &str) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    let mut sentences = Vec::new();
    if normalized.is_empty() {
        return sentences;
    }

    let mut start = 0;
    let mut chars = normalized.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        if !is_terminal_mark(ch) {
            continue;
        }

        let mut end = i + ch.len_utf8();

        // Swallow the rest of the terminal run.
        while let Some(&(j, next)) = chars.peek() {
            if !is_terminal_mark(next) {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }

        // At most one closing quote belongs to the clause.
        if let Some(&(j, next)) = chars.peek() {
            if is_closing_quote(next) {
                end = j + next.len_utf8();
                chars.next();
            }
        }

        let at_boundary = chars
            .peek()
            .map_or(true, |&(_, next)| next.is_whitespace());

        if at_boundary {
            push_trimmed(&mut sentences, &normalized[start..end]);
            start = end;
        }
    }

    push_trimmed(&mut sentences, &normalized[start..]);
    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        sentences.push(piece.to_string());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
