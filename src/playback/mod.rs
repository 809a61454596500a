//! Read-aloud playback: the orchestrator and the state it publishes.
//!
//! # Architecture
//!
//! ```text
//! UI / CLI ──speak · pause · resume · stop · set_rate──▶ PlaybackOrchestrator
//!                                                          │   │
//!                         text::segment ◀──────────────────┘   │
//!                                                              ▼
//!                                          Arc<dyn SpeechEngine> (one utterance at a time)
//!
//! watch::Receiver<PlaybackState> ◀── published after every change ── UI / CLI
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use readaloud::playback::PlaybackOrchestrator;
//! use readaloud::speech::ConsoleEngine;
//!
//! #[tokio::main]
//! async fn main() {
//!     let player = Arc::new(PlaybackOrchestrator::with_rate(
//!         Arc::new(ConsoleEngine::new(180, true)),
//!         1.25,
//!     ));
//!
//!     let mut updates = player.subscribe();
//!     tokio::spawn(async move {
//!         while updates.changed().await.is_ok() {
//!             let st = updates.borrow_and_update().clone();
//!             println!("{} {:?}", st.phase().label(), st.current_sentence_index);
//!         }
//!     });
//!
//!     player.speak("It was the best of times. It was the worst of times.").await.unwrap();
//! }
//! ```

pub mod cancel;
pub mod orchestrator;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use cancel::CancelToken;
pub use orchestrator::{PlaybackError, PlaybackOrchestrator};
pub use state::{PlaybackPhase, PlaybackState};
