//! Core `SpeechEngine` trait, error type and the test-only mock engine.
//!
//! # Overview
//!
//! [`SpeechEngine`] is the capability the playback orchestrator drives.  It
//! speaks **one utterance at a time**: [`speak`](SpeechEngine::speak) resolves
//! when that utterance finishes or is stopped, and the synchronous control
//! signals (`pause`, `resume`, `stop`) act on whichever utterance is active.
//!
//! The trait is object-safe and `Send + Sync` so the orchestrator can hold it
//! behind an `Arc<dyn SpeechEngine>`.
//!
//! [`MockSpeechEngine`] (available under `#[cfg(test)]`) records every call
//! and can hold utterances open, which lets tests observe the orchestrator
//! mid-sentence without a real synthesis backend.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Rate limits
// ---------------------------------------------------------------------------

/// Slowest supported speech rate multiplier.
pub const MIN_RATE: f32 = 0.1;
/// Fastest supported speech rate multiplier.
pub const MAX_RATE: f32 = 2.0;
/// Normal speaking speed.
pub const DEFAULT_RATE: f32 = 1.0;

/// Clamp `rate` into `[MIN_RATE, MAX_RATE]`.
///
/// Non-finite input falls back to [`DEFAULT_RATE`].
///
/// ```
/// use readaloud::speech::{clamp_rate, MAX_RATE, MIN_RATE};
///
/// assert_eq!(clamp_rate(1.5), 1.5);
/// assert_eq!(clamp_rate(9.0), MAX_RATE);
/// assert_eq!(clamp_rate(0.0), MIN_RATE);
/// assert_eq!(clamp_rate(f32::NAN), 1.0);
/// ```
pub fn clamp_rate(rate: f32) -> f32 {
    if rate.is_finite() {
        rate.clamp(MIN_RATE, MAX_RATE)
    } else {
        DEFAULT_RATE
    }
}

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors a speech engine can report for a single utterance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    /// The backend rejected or failed to synthesise the utterance.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),

    /// The utterance did not finish within the allowed time.
    #[error("utterance timed out after {0:?}")]
    Timeout(Duration),

    /// The backend is not available at all (missing voice, device, …).
    #[error("speech engine unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// SpeechEngine trait
// ---------------------------------------------------------------------------

/// Single-utterance speech synthesis capability.
///
/// # Contract
///
/// - `speak` resolves `Ok(())` when the utterance finishes normally **or**
///   was explicitly stopped; it rejects only on a synthesis error.
/// - A new `speak` supersedes any utterance still in flight.
/// - `pause`, `resume` and `stop` are fire-and-forget and are no-ops when
///   nothing is being spoken.
/// - `set_rate` clamps to [`MIN_RATE`]..=[`MAX_RATE`] and affects only
///   utterances started afterwards.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Speak `text` and wait until the utterance is over.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Suspend the active utterance.
    fn pause(&self);

    /// Continue a paused utterance where it left off.
    fn resume(&self);

    /// Abandon the active utterance; its `speak` call resolves `Ok(())`.
    fn stop(&self);

    /// Set the rate multiplier for future utterances.
    fn set_rate(&self, rate: f32);

    /// Current (clamped) rate multiplier.
    fn rate(&self) -> f32;

    /// Whether an utterance is in flight (paused counts as speaking).
    async fn is_speaking(&self) -> bool;
}

// Compile-time assertion: Box<dyn SpeechEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechEngine>) {}
};

// ---------------------------------------------------------------------------
// MockSpeechEngine  (test-only)
// ---------------------------------------------------------------------------

/// One recorded interaction with [`MockSpeechEngine`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Speak(String),
    Pause,
    Resume,
    Stop,
    SetRate(f32),
}

/// A test double that records every call.
///
/// * [`instant`](Self::instant) — every utterance completes immediately.
/// * [`holding`](Self::holding) — every utterance stays open until
///   [`release`](Self::release) or `stop()` is called.
/// * [`failing_at`](Self::failing_at) — the n-th `speak` call (0-based)
///   rejects with [`SpeechError::Synthesis`].
/// * [`failing_on_stop`](Self::failing_on_stop) — like `holding`, but an
///   utterance cut short by `stop()` rejects instead of resolving `Ok`.
#[cfg(test)]
pub struct MockSpeechEngine {
    calls: std::sync::Mutex<Vec<EngineCall>>,
    hold: bool,
    fail_at: Option<usize>,
    fail_on_stop: bool,
    stop_requested: std::sync::atomic::AtomicBool,
    rate: std::sync::Mutex<f32>,
    in_flight: std::sync::atomic::AtomicUsize,
    started: tokio::sync::Notify,
    release: tokio::sync::Notify,
}

#[cfg(test)]
impl MockSpeechEngine {
    fn build(hold: bool, fail_at: Option<usize>, fail_on_stop: bool) -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
            hold,
            fail_at,
            fail_on_stop,
            stop_requested: std::sync::atomic::AtomicBool::new(false),
            rate: std::sync::Mutex::new(DEFAULT_RATE),
            in_flight: std::sync::atomic::AtomicUsize::new(0),
            started: tokio::sync::Notify::new(),
            release: tokio::sync::Notify::new(),
        }
    }

    pub fn instant() -> Self {
        Self::build(false, None, false)
    }

    pub fn holding() -> Self {
        Self::build(true, None, false)
    }

    pub fn failing_at(index: usize) -> Self {
        Self::build(false, Some(index), false)
    }

    pub fn failing_on_stop() -> Self {
        Self::build(true, None, true)
    }

    /// Every call in the order it was made.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the texts passed to `speak`, in order.
    pub fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Speak(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Wait until an utterance has started (consumes one start signal).
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let the held utterance finish.
    pub fn release(&self) {
        self.release.notify_one();
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[cfg(test)]
#[async_trait]
impl SpeechEngine for MockSpeechEngine {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        use std::sync::atomic::Ordering;

        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(EngineCall::Speak(text.to_string()));
            calls
                .iter()
                .filter(|c| matches!(c, EngineCall::Speak(_)))
                .count()
                - 1
        };

        if self.fail_at == Some(index) {
            return Err(SpeechError::Synthesis(format!("mock failure on {text:?}")));
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        if self.hold {
            self.release.notified().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_on_stop && self.stop_requested.swap(false, Ordering::SeqCst) {
            return Err(SpeechError::Synthesis(format!("interrupted: {text:?}")));
        }
        Ok(())
    }

    fn pause(&self) {
        self.record(EngineCall::Pause);
    }

    fn resume(&self) {
        self.record(EngineCall::Resume);
    }

    fn stop(&self) {
        self.record(EngineCall::Stop);
        if self.hold && self.in_flight.load(std::sync::atomic::Ordering::SeqCst) > 0 {
            self.stop_requested
                .store(true, std::sync::atomic::Ordering::SeqCst);
            self.release.notify_one();
        }
    }

    fn set_rate(&self, rate: f32) {
        self.record(EngineCall::SetRate(rate));
        *self.rate.lock().unwrap() = clamp_rate(rate);
    }

    fn rate(&self) -> f32 {
        *self.rate.lock().unwrap()
    }

    async fn is_speaking(&self) -> bool {
        self.in_flight.load(std::sync::atomic::Ordering::SeqCst) > 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    // --- clamp_rate ---

    #[test]
    fn clamp_rate_keeps_values_in_range() {
        assert_eq!(clamp_rate(0.5), 0.5);
        assert_eq!(clamp_rate(MIN_RATE), MIN_RATE);
        assert_eq!(clamp_rate(MAX_RATE), MAX_RATE);
    }

    #[test]
    fn clamp_rate_limits_out_of_range_values() {
        assert_eq!(clamp_rate(-3.0), MIN_RATE);
        assert_eq!(clamp_rate(2.5), MAX_RATE);
        assert_eq!(clamp_rate(f32::INFINITY), DEFAULT_RATE);
    }

    // --- SpeechError display ---

    #[test]
    fn speech_error_display_includes_cause() {
        let e = SpeechError::Synthesis("voice missing".into());
        assert!(e.to_string().contains("voice missing"));

        let e = SpeechError::Timeout(Duration::from_secs(2));
        assert!(e.to_string().contains("2s"));
    }

    // --- MockSpeechEngine ---

    #[tokio::test]
    async fn mock_instant_records_speak_calls() {
        let engine = MockSpeechEngine::instant();
        engine.speak("one").await.unwrap();
        engine.speak("two").await.unwrap();
        assert_eq!(engine.spoken(), vec!["one", "two"]);
        assert!(!engine.is_speaking().await);
    }

    #[tokio::test]
    async fn mock_failing_at_rejects_only_that_call() {
        let engine = MockSpeechEngine::failing_at(1);
        assert!(engine.speak("a").await.is_ok());
        assert!(matches!(
            engine.speak("b").await,
            Err(SpeechError::Synthesis(_))
        ));
        assert!(engine.speak("c").await.is_ok());
    }

    #[tokio::test]
    async fn mock_holding_resolves_on_stop() {
        let engine = Arc::new(MockSpeechEngine::holding());
        let task = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.speak("held").await })
        };

        engine.wait_started().await;
        assert!(engine.is_speaking().await);
        engine.stop();

        assert!(task.await.unwrap().is_ok());
        assert!(!engine.is_speaking().await);
    }

    #[test]
    fn mock_set_rate_clamps() {
        let engine = MockSpeechEngine::instant();
        engine.set_rate(5.0);
        assert_eq!(engine.rate(), MAX_RATE);
        assert_eq!(engine.calls(), vec![EngineCall::SetRate(5.0)]);
    }

    #[test]
    fn box_dyn_speech_engine_compiles() {
        let _engine: Box<dyn SpeechEngine> = Box::new(MockSpeechEngine::instant());
    }
}
