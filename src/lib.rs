//! readaloud — sentence segmentation and read-aloud playback orchestration.
//!
//! * [`text`] — turns extracted reading text into sentence units.
//! * [`speech`] — the single-utterance [`speech::SpeechEngine`] capability
//!   and the engines shipped with the crate.
//! * [`playback`] — the [`playback::PlaybackOrchestrator`] state machine.
//! * [`config`] — TOML settings.
//! * [`controls`] — terminal commands used by the `readaloud` binary.

pub mod config;
pub mod controls;
pub mod playback;
pub mod speech;
pub mod text;
