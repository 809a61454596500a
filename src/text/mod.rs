//! Text preparation for narration.
//!
//! Extracted reading text arrives with hard line wraps, runs of spaces and
//! mixed punctuation.  This module turns it into the sentence units that the
//! playback orchestrator feeds to the speech engine, one utterance each.
//!
//! Everything here is pure: no state, no I/O, no failure modes.
//!
//! # Quick start
//!
//! ```
//! use readaloud::text::segment;
//!
//! let sentences = segment("Hello world.\nThis is   a test.");
//! assert_eq!(sentences, vec!["Hello world.", "This is a test."]);
//! ```

pub mod normalize;
pub mod segment;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use normalize::normalize_whitespace;
pub use segment::{is_closing_quote, is_terminal_mark, segment};
