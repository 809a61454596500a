//! Playback orchestrator — drives a sentence sequence through a speech engine.
//!
//! [`PlaybackOrchestrator`] owns the [`PlaybackState`] and turns one block of
//! reading text into an ordered, interruptible series of single-utterance
//! engine calls.
//!
//! # Session flow
//!
//! ```text
//! speak(text)
//!   └─▶ segment(text) ── empty ──▶ return Ok (state untouched)
//!   └─▶ supersede old session (cancel token, engine.stop)
//!   └─▶ for each sentence:
//!         check token ─▶ publish (sentence, index) ─▶ engine.speak().await
//!         check token ─┬─ cancelled ──▶ break
//!                      └─ Err ────────▶ abort with PlaybackError::Engine
//!   └─▶ SessionGuard::drop ─▶ reset to Idle (only if still the active session)
//! ```
//!
//! The per-sentence engine await is the only suspension point, apart from
//! holding the next sentence back while paused between utterances.  Publishing a
//! sentence and `stop()` both run under the session lock, so once `stop()`
//! has reset the visible state no stale sentence can be published over it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::watch;

use crate::speech::{SpeechEngine, SpeechError};
use crate::text::segment;

use super::cancel::CancelToken;
use super::state::PlaybackState;

// ---------------------------------------------------------------------------
// PlaybackError
// ---------------------------------------------------------------------------

/// Errors that end a `speak` call early.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The speech engine rejected sentence `index`; the rest of the sequence
    /// was abandoned.
    #[error("speech engine failed on sentence {index}: {source}")]
    Engine {
        index: usize,
        #[source]
        source: SpeechError,
    },
}

// ---------------------------------------------------------------------------
// PlaybackOrchestrator
// ---------------------------------------------------------------------------

/// Sequences speech-engine calls over the sentences of a text and exposes a
/// consistent Idle / Playing / Paused state machine.
///
/// Share it behind an `Arc` so one task can `speak` while another issues
/// `pause` / `resume` / `stop`.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use readaloud::playback::PlaybackOrchestrator;
/// use readaloud::speech::ConsoleEngine;
///
/// # async fn example() {
/// let player = Arc::new(PlaybackOrchestrator::new(Arc::new(ConsoleEngine::default())));
///
/// let reader = Arc::clone(&player);
/// let narration = tokio::spawn(async move {
///     reader.speak("Call me Ishmael. Some years ago, never mind how long.").await
/// });
///
/// player.pause();
/// player.resume();
/// narration.await.unwrap().unwrap();
/// # }
/// ```
pub struct PlaybackOrchestrator {
    engine: Arc<dyn SpeechEngine>,
    state: watch::Sender<PlaybackState>,
    session: Mutex<Option<CancelToken>>,
}

impl PlaybackOrchestrator {
    /// Create an idle orchestrator that adopts the engine's current rate.
    pub fn new(engine: Arc<dyn SpeechEngine>) -> Self {
        let (state, _) = watch::channel(PlaybackState::new(engine.rate()));
        Self {
            engine,
            state,
            session: Mutex::new(None),
        }
    }

    /// Create an idle orchestrator and apply `rate` to the engine up front.
    pub fn with_rate(engine: Arc<dyn SpeechEngine>, rate: f32) -> Self {
        engine.set_rate(rate);
        Self::new(engine)
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// A copy of the current state.
    pub fn snapshot(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn rate(&self) -> f32 {
        self.state.borrow().rate
    }

    /// Ask the engine whether an utterance is in flight.
    pub async fn is_speaking(&self) -> bool {
        self.engine.is_speaking().await
    }

    // -----------------------------------------------------------------------
    // Controls
    // -----------------------------------------------------------------------

    /// Read `text` aloud, sentence by sentence.
    ///
    /// Resolves when the whole sequence has been spoken, when it was stopped
    /// (`Ok(())` in both cases) or when the engine rejected a sentence.  A
    /// sequence already in progress is stopped first.  Text without any
    /// speakable content returns immediately and leaves the state untouched.
    ///
    /// The state is reset to Idle before this returns, on every path.
    /// Dropping the returned future also stops the engine and resets the
    /// state.
    pub async fn speak(&self, text: &str) -> Result<(), PlaybackError> {
        let sentences = segment(text);
        if sentences.is_empty() {
            log::debug!("playback: nothing to speak");
            return Ok(());
        }

        let token = self.begin_session();
        let mut guard = SessionGuard {
            orchestrator: self,
            token: token.clone(),
            settled: false,
        };

        log::debug!("playback: speaking {} sentence(s)", sentences.len());
        let result = self.run_sequence(&token, &sentences).await;
        guard.settled = true;
        result
    }

    /// Suspend the current utterance.  No-op unless playing.
    pub fn pause(&self) {
        let _session = self.lock_session();
        let playing = {
            let st = self.state.borrow();
            st.is_playing && !st.is_paused
        };
        if !playing {
            log::debug!("playback: pause ignored, nothing playing");
            return;
        }

        self.engine.pause();
        self.state.send_modify(|st| st.is_paused = true);
        log::debug!("playback: Playing → Paused");
    }

    /// Continue a paused utterance.  No-op unless paused.
    pub fn resume(&self) {
        let _session = self.lock_session();
        if !self.state.borrow().is_paused {
            log::debug!("playback: resume ignored, not paused");
            return;
        }

        self.engine.resume();
        self.state.send_modify(|st| st.is_paused = false);
        log::debug!("playback: Paused → Playing");
    }

    /// Abandon the current sequence and return to Idle immediately.
    ///
    /// The visible state is reset before the running `speak` loop has
    /// observed the cancellation; the loop exits as soon as the engine
    /// releases its current utterance.  Safe to call while idle.
    pub fn stop(&self) {
        let mut session = self.lock_session();
        if let Some(token) = session.take() {
            token.cancel();
            log::debug!("playback: stop requested");
        }
        self.engine.stop();
        self.state.send_if_modified(PlaybackState::reset);
    }

    /// Change the speech rate for subsequent utterances.
    ///
    /// The engine clamps the value; the clamped rate is what the state
    /// reports.
    pub fn set_rate(&self, rate: f32) {
        self.engine.set_rate(rate);
        let applied = self.engine.rate();
        self.state.send_if_modified(|st| {
            let changed = st.rate != applied;
            st.rate = applied;
            changed
        });
        log::debug!("playback: rate set to {applied} (requested {rate})");
    }

    // -----------------------------------------------------------------------
    // Session internals
    // -----------------------------------------------------------------------

    fn lock_session(&self) -> MutexGuard<'_, Option<CancelToken>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a fresh token, cancelling and silencing any previous session.
    fn begin_session(&self) -> CancelToken {
        let token = CancelToken::new();
        let mut session = self.lock_session();
        if let Some(previous) = session.replace(token.clone()) {
            log::debug!("playback: superseding the active sequence");
            previous.cancel();
            self.engine.stop();
        }
        // A new session starts unpaused; this also wakes a superseded loop
        // parked between utterances.
        self.state
            .send_if_modified(|st| std::mem::replace(&mut st.is_paused, false));
        token
    }

    async fn run_sequence(
        &self,
        token: &CancelToken,
        sentences: &[String],
    ) -> Result<(), PlaybackError> {
        let total = sentences.len();

        for (index, sentence) in sentences.iter().enumerate() {
            loop {
                match self.publish(token, index, sentence, total) {
                    Publish::Published => break,
                    Publish::Cancelled => return Ok(()),
                    // Paused between two utterances: hold the next one back.
                    Publish::Paused => self.wait_until_resumed().await,
                }
            }

            let outcome = self.engine.speak(sentence).await;

            if token.is_cancelled() {
                log::debug!("playback: stopped during sentence {index}");
                break;
            }

            if let Err(source) = outcome {
                log::error!("playback: speech engine failed on sentence {index}: {source}");
                return Err(PlaybackError::Engine { index, source });
            }
        }

        Ok(())
    }

    /// Publish the sentence about to be spoken, unless the session was
    /// cancelled or is paused.
    fn publish(&self, token: &CancelToken, index: usize, sentence: &str, total: usize) -> Publish {
        let _session = self.lock_session();
        if token.is_cancelled() {
            return Publish::Cancelled;
        }
        if self.state.borrow().is_paused {
            return Publish::Paused;
        }
        self.state
            .send_modify(|st| st.start_sentence(index, sentence, total));
        Publish::Published
    }

    /// Wait until the pause flag clears (`resume()` or `stop()`).
    async fn wait_until_resumed(&self) {
        let mut updates = self.state.subscribe();
        let _ = updates.wait_for(|st| !st.is_paused).await;
    }
}

enum Publish {
    Published,
    Cancelled,
    Paused,
}

// ---------------------------------------------------------------------------
// SessionGuard
// ---------------------------------------------------------------------------

/// Resets the state when a `speak` call ends, however it ends.
struct SessionGuard<'a> {
    orchestrator: &'a PlaybackOrchestrator,
    token: CancelToken,
    /// `false` when the `speak` future was dropped before finishing.
    settled: bool,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        let orchestrator = self.orchestrator;
        let mut session = orchestrator.lock_session();

        let is_current = session
            .as_ref()
            .is_some_and(|active| active.same_as(&self.token));
        if !is_current {
            // stop() already reset the state, or a newer session owns it.
            return;
        }

        *session = None;
        self.token.cancel();
        if !self.settled {
            log::debug!("playback: speak dropped mid-sequence, stopping engine");
            orchestrator.engine.stop();
        }
        orchestrator.state.send_if_modified(PlaybackState::reset);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::playback::PlaybackPhase;
    use crate::speech::{EngineCall, MockSpeechEngine};

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn make_orchestrator(
        engine: MockSpeechEngine,
    ) -> (Arc<PlaybackOrchestrator>, Arc<MockSpeechEngine>) {
        let engine = Arc::new(engine);
        let orc = Arc::new(PlaybackOrchestrator::new(engine.clone()));
        (orc, engine)
    }

    fn spawn_speak(
        orc: &Arc<PlaybackOrchestrator>,
        text: &'static str,
    ) -> tokio::task::JoinHandle<Result<(), PlaybackError>> {
        let orc = Arc::clone(orc);
        tokio::spawn(async move { orc.speak(text).await })
    }

    fn assert_idle(st: &PlaybackState) {
        assert_eq!(st.phase(), PlaybackPhase::Idle);
        assert_eq!(st.current_sentence, "");
        assert_eq!(st.current_sentence_index, None);
        assert_eq!(st.total_sentences, 0);
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn initial_state_is_idle() {
        let (orc, _engine) = make_orchestrator(MockSpeechEngine::instant());
        let st = orc.snapshot();
        assert_idle(&st);
        assert_eq!(st.rate, 1.0);
        assert!(!orc.is_speaking().await);
    }

    /// Two sentences → two sequential engine calls, ending Idle.
    #[tokio::test]
    async fn speaks_each_sentence_in_order() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::instant());

        orc.speak("Hello World. This is a test.").await.unwrap();

        assert_eq!(engine.spoken(), vec!["Hello World.", "This is a test."]);
        assert_idle(&orc.snapshot());
    }

    #[tokio::test]
    async fn empty_text_returns_without_touching_state() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::instant());
        let rx = orc.subscribe();

        orc.speak("  \n\t ").await.unwrap();

        assert!(engine.calls().is_empty());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn publishes_each_sentence_before_speaking_it() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());
        let task = spawn_speak(&orc, "One. Two.");

        engine.wait_started().await;
        let st = orc.snapshot();
        assert_eq!(st.phase(), PlaybackPhase::Playing);
        assert_eq!(st.current_sentence, "One.");
        assert_eq!(st.current_sentence_index, Some(0));
        assert_eq!(st.total_sentences, 2);
        assert_eq!(st.progress(), Some(0.0));
        assert!(st.is_consistent());

        engine.release();
        engine.wait_started().await;
        let st = orc.snapshot();
        assert_eq!(st.current_sentence, "Two.");
        assert_eq!(st.current_sentence_index, Some(1));
        assert!(st.is_consistent());

        engine.release();
        task.await.unwrap().unwrap();
        assert_idle(&orc.snapshot());
    }

    /// Stopping during the first of three sentences must prevent the second
    /// and third engine calls and read back Idle immediately.
    #[tokio::test]
    async fn stop_during_first_sentence_cancels_the_rest() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());
        let task = spawn_speak(&orc, "One. Two. Three.");

        engine.wait_started().await;
        orc.stop();

        let st = orc.snapshot();
        assert_eq!(st.current_sentence_index, None);
        assert_idle(&st);

        task.await.unwrap().unwrap();
        assert_eq!(engine.spoken(), vec!["One."]);
        assert!(engine.calls().contains(&EngineCall::Stop));
        assert_idle(&orc.snapshot());
    }

    /// Pause + resume keeps the position and never re-issues the utterance.
    #[tokio::test]
    async fn pause_and_resume_keep_position() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());
        let task = spawn_speak(&orc, "One. Two.");

        engine.wait_started().await;

        orc.pause();
        let st = orc.snapshot();
        assert_eq!(st.phase(), PlaybackPhase::Paused);
        assert_eq!(st.current_sentence_index, Some(0));
        assert!(st.is_consistent());

        orc.resume();
        let st = orc.snapshot();
        assert_eq!(st.phase(), PlaybackPhase::Playing);
        assert_eq!(st.current_sentence_index, Some(0));
        assert_eq!(engine.spoken(), vec!["One."]);

        engine.release();
        engine.wait_started().await;
        engine.release();
        task.await.unwrap().unwrap();

        assert_eq!(engine.spoken(), vec!["One.", "Two."]);
        assert_eq!(
            engine.calls(),
            vec![
                EngineCall::Speak("One.".into()),
                EngineCall::Pause,
                EngineCall::Resume,
                EngineCall::Speak("Two.".into()),
            ]
        );
    }

    /// A pause that lands between two utterances holds the next one back
    /// until resume.
    #[tokio::test]
    async fn pause_between_sentences_defers_the_next_utterance() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());
        let task = spawn_speak(&orc, "One. Two.");
        engine.wait_started().await;

        // Pause while sentence 0 is still the published one, then let the
        // engine finish it: the loop must not dispatch sentence 1.
        orc.pause();
        engine.release();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(engine.spoken(), vec!["One."]);
        assert_eq!(orc.snapshot().current_sentence_index, Some(0));

        orc.resume();
        engine.wait_started().await;
        assert_eq!(orc.snapshot().current_sentence_index, Some(1));
        engine.release();
        task.await.unwrap().unwrap();
        assert_eq!(engine.spoken(), vec!["One.", "Two."]);
    }

    #[tokio::test]
    async fn stop_while_paused_returns_to_idle() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());
        let task = spawn_speak(&orc, "One. Two.");

        engine.wait_started().await;
        orc.pause();
        orc.stop();

        assert_idle(&orc.snapshot());
        task.await.unwrap().unwrap();
        assert_eq!(engine.spoken(), vec!["One."]);
    }

    /// An engine failure aborts the sequence, surfaces the error and leaves
    /// the orchestrator Idle and usable.
    #[tokio::test]
    async fn engine_failure_aborts_and_resets() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::failing_at(1));

        let err = orc.speak("A. B. C.").await.unwrap_err();

        assert!(matches!(
            err,
            PlaybackError::Engine {
                index: 1,
                source: SpeechError::Synthesis(_)
            }
        ));
        assert!(err.to_string().contains("sentence 1"));
        assert_eq!(engine.spoken(), vec!["A.", "B."]);
        assert_idle(&orc.snapshot());

        orc.speak("D.").await.unwrap();
        assert_eq!(engine.spoken(), vec!["A.", "B.", "D."]);
    }

    /// A new `speak` silences the old sequence; the old loop must neither
    /// cancel nor reset the new one while it unwinds.
    /// An engine that rejects the utterance it was told to stop does not
    /// turn the stop into a failure.
    #[tokio::test]
    async fn error_after_stop_counts_as_the_stop() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::failing_on_stop());
        let task = spawn_speak(&orc, "One. Two. Three.");
        engine.wait_started().await;

        orc.stop();

        assert!(task.await.unwrap().is_ok());
        assert_idle(&orc.snapshot());
        assert_eq!(engine.spoken(), vec!["One."]);
    }

    #[tokio::test]
    async fn error_after_supersede_counts_as_the_stop() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::failing_on_stop());
        let first = spawn_speak(&orc, "One. Two.");
        engine.wait_started().await;

        let second = spawn_speak(&orc, "Three.");
        assert!(first.await.unwrap().is_ok());
        engine.wait_started().await;
        engine.release();
        assert!(second.await.unwrap().is_ok());

        assert_eq!(engine.spoken(), vec!["One.", "Three."]);
        assert_idle(&orc.snapshot());
    }

    #[tokio::test]
    async fn new_speak_supersedes_the_running_sequence() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());
        let first = spawn_speak(&orc, "One. Two.");
        engine.wait_started().await;

        let second = spawn_speak(&orc, "Three. Four.");
        first.await.unwrap().unwrap();
        engine.wait_started().await;

        let st = orc.snapshot();
        assert_eq!(st.current_sentence, "Three.");
        assert_eq!(st.current_sentence_index, Some(0));
        assert_eq!(st.total_sentences, 2);

        engine.release();
        engine.wait_started().await;
        engine.release();
        second.await.unwrap().unwrap();

        assert_eq!(engine.spoken(), vec!["One.", "Three.", "Four."]);
        assert_idle(&orc.snapshot());
    }

    #[tokio::test]
    async fn speak_while_paused_starts_unpaused() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());
        let first = spawn_speak(&orc, "One. Two.");
        engine.wait_started().await;
        orc.pause();

        let second = spawn_speak(&orc, "Three.");
        first.await.unwrap().unwrap();
        engine.wait_started().await;

        let st = orc.snapshot();
        assert_eq!(st.phase(), PlaybackPhase::Playing);
        assert_eq!(st.current_sentence, "Three.");

        engine.release();
        second.await.unwrap().unwrap();
        assert_eq!(engine.spoken(), vec!["One.", "Three."]);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_speak_stops_engine_and_resets() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());

        let outcome = tokio::time::timeout(Duration::from_secs(1), orc.speak("One. Two.")).await;

        assert!(outcome.is_err());
        assert_eq!(engine.calls().last(), Some(&EngineCall::Stop));
        assert_idle(&orc.snapshot());
    }

    // ---- Idle no-ops ---

    #[tokio::test]
    async fn controls_while_idle_are_noops() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::instant());
        let rx = orc.subscribe();

        orc.pause();
        orc.resume();
        orc.stop();

        assert_idle(&orc.snapshot());
        assert!(!rx.has_changed().unwrap());
        // stop always silences the engine; pause/resume are not forwarded.
        assert_eq!(engine.calls(), vec![EngineCall::Stop]);
    }

    // ---- Rate ---

    #[tokio::test]
    async fn set_rate_updates_state_and_engine() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::instant());

        orc.set_rate(1.5);
        assert_eq!(orc.rate(), 1.5);
        assert_eq!(engine.calls(), vec![EngineCall::SetRate(1.5)]);

        orc.set_rate(9.0);
        assert_eq!(orc.rate(), 2.0);
    }

    #[tokio::test]
    async fn rate_persists_across_sessions() {
        let engine = Arc::new(MockSpeechEngine::instant());
        let orc = PlaybackOrchestrator::with_rate(engine.clone(), 0.75);
        assert_eq!(orc.rate(), 0.75);

        orc.speak("One. Two.").await.unwrap();
        assert_eq!(orc.snapshot().rate, 0.75);
    }

    #[tokio::test]
    async fn subscribers_see_sentence_changes() {
        let (orc, engine) = make_orchestrator(MockSpeechEngine::holding());
        let mut rx = orc.subscribe();
        let task = spawn_speak(&orc, "Only one.");

        engine.wait_started().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().current_sentence, "Only one.");

        engine.release();
        task.await.unwrap().unwrap();
        assert!(rx.has_changed().unwrap());
        assert_idle(&rx.borrow_and_update());
    }

    #[test]
    fn orchestrator_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PlaybackOrchestrator>();
    }
}
