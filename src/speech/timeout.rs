//! Bounded-wait wrapper — stops any [`SpeechEngine`] whose utterance hangs.
//!
//! The orchestrator itself has no timeout: it waits for each utterance to
//! resolve.  A backend that never reports completion would therefore stall
//! playback forever.  [`TimeoutEngine`] races every utterance against a timer;
//! when the timer wins it stops the inner engine and rejects the utterance
//! with [`SpeechError::Timeout`], which the orchestrator treats like any other
//! synthesis failure.
//!
//! Paused time never counts: the timer does not fire while the utterance is
//! paused, and every `resume()` starts a fresh `limit`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use super::engine::{SpeechEngine, SpeechError};

// ---------------------------------------------------------------------------
// TimeoutEngine
// ---------------------------------------------------------------------------

/// Wraps an engine and bounds each utterance to `limit`.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use readaloud::speech::{ConsoleEngine, TimeoutEngine};
///
/// let engine = TimeoutEngine::new(ConsoleEngine::new(180, false), Duration::from_secs(30));
/// assert_eq!(engine.limit(), Duration::from_secs(30));
/// ```
pub struct TimeoutEngine<E: SpeechEngine> {
    inner: E,
    limit: Duration,
    paused: AtomicBool,
    /// Bumped on every `resume()`; an in-flight `speak` restarts its window.
    resumes: watch::Sender<u64>,
}

impl<E: SpeechEngine> TimeoutEngine<E> {
    /// Wrap `inner`, allowing each utterance at most `limit` since it
    /// started or was last resumed.
    pub fn new(inner: E, limit: Duration) -> Self {
        let (resumes, _) = watch::channel(0);
        Self {
            inner,
            limit,
            paused: AtomicBool::new(false),
            resumes,
        }
    }

    /// Return a reference to the wrapped engine.
    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// The per-utterance time limit.
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

#[async_trait]
impl<E: SpeechEngine> SpeechEngine for TimeoutEngine<E> {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.paused.store(false, Ordering::SeqCst);

        let mut resumes = self.resumes.subscribe();
        let utterance = self.inner.speak(text);
        tokio::pin!(utterance);

        loop {
            tokio::select! {
                biased;

                result = &mut utterance => return result,
                Ok(()) = resumes.changed() => continue,
                () = tokio::time::sleep(self.limit) => {
                    if self.paused.load(Ordering::SeqCst) {
                        // Wait for resume (or completion) without a deadline.
                        tokio::select! {
                            biased;

                            result = &mut utterance => return result,
                            _ = resumes.changed() => continue,
                        }
                    }
                    log::warn!(
                        "speech: utterance exceeded {:?}, stopping engine (len={})",
                        self.limit,
                        text.len()
                    );
                    self.inner.stop();
                    return Err(SpeechError::Timeout(self.limit));
                }
            }
        }
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        self.inner.pause();
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.inner.resume();
        self.resumes.send_modify(|n| *n = n.wrapping_add(1));
    }

    fn stop(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.inner.stop();
    }

    fn set_rate(&self, rate: f32) {
        self.inner.set_rate(rate);
    }

    fn rate(&self) -> f32 {
        self.inner.rate()
    }

    async fn is_speaking(&self) -> bool {
        self.inner.is_speaking().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
