//! Speech engine capability and the engines shipped with the crate.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                 SpeechEngine (trait)                   │
//! │   speak(text).await · pause · resume · stop · rate     │
//! │                                                        │
//! │   ┌───────────────┐        ┌──────────────────────┐    │
//! │   │ ConsoleEngine │◀───────│ TimeoutEngine<E>     │    │
//! │   │ paced echo    │  wraps │ race vs. timer       │    │
//! │   └───────────────┘        └──────────────────────┘    │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! Platform backends (system TTS, cloud voices) live with the application
//! that embeds this crate; they only need to implement [`SpeechEngine`].
//!
//! # Quick start
//!
//! ```rust,no_run
//! use readaloud::speech::{ConsoleEngine, SpeechEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = ConsoleEngine::new(180, true);
//!     engine.set_rate(1.25);
//!     engine.speak("It was a bright cold day in April.").await.unwrap();
//! }
//! ```

pub mod console;
pub mod engine;
pub mod timeout;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use console::ConsoleEngine;
pub use engine::{
    clamp_rate, SpeechEngine, SpeechError, DEFAULT_RATE, MAX_RATE, MIN_RATE,
};
pub use timeout::TimeoutEngine;

// test-only re-export so the playback tests can import the mock without
// reaching into `speech::engine`.
#[cfg(test)]
pub use engine::{EngineCall, MockSpeechEngine};
