//! Playback state machine and the observable state snapshot.
//!
//! [`PlaybackPhase`] is the three-state machine the UI renders (play button,
//! pause button, idle).  [`PlaybackState`] is the full snapshot the
//! orchestrator publishes after every change: phase flags, rate and the
//! sentence currently being spoken.
//!
//! Only the orchestrator mutates a `PlaybackState`; consumers receive clones
//! through [`PlaybackOrchestrator::snapshot`] or a `watch` receiver from
//! [`PlaybackOrchestrator::subscribe`].
//!
//! [`PlaybackOrchestrator::snapshot`]: super::PlaybackOrchestrator::snapshot
//! [`PlaybackOrchestrator::subscribe`]: super::PlaybackOrchestrator::subscribe

use crate::speech::DEFAULT_RATE;

// ---------------------------------------------------------------------------
// PlaybackPhase
// ---------------------------------------------------------------------------

/// States of the read-aloud player.
///
/// ```text
/// Idle ──speak(text)──▶ Playing ──pause()──▶ Paused
///                        ▲                     │
///                        └──────resume()───────┘
/// Playing | Paused ──stop() / sequence done / engine error──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// Nothing is being read.
    #[default]
    Idle,

    /// A sentence sequence is being spoken.
    Playing,

    /// The sequence is suspended mid-utterance and can be resumed.
    Paused,
}

impl PlaybackPhase {
    /// Returns `true` while a sequence is in progress (playing or paused).
    ///
    /// ```
    /// use readaloud::playback::PlaybackPhase;
    ///
    /// assert!(!PlaybackPhase::Idle.is_active());
    /// assert!(PlaybackPhase::Playing.is_active());
    /// assert!(PlaybackPhase::Paused.is_active());
    /// ```
    pub fn is_active(&self) -> bool {
        !matches!(self, PlaybackPhase::Idle)
    }

    /// A short human-readable label suitable for a status line.
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackPhase::Idle => "Idle",
            PlaybackPhase::Playing => "Playing",
            PlaybackPhase::Paused => "Paused",
        }
    }
}

// ---------------------------------------------------------------------------
// PlaybackState
// ---------------------------------------------------------------------------

/// Snapshot of the player, published by the orchestrator on every change.
///
/// Invariants (checked by [`is_consistent`](Self::is_consistent)):
///
/// * `is_paused` implies `is_playing`.
/// * While playing, `current_sentence_index` is `Some(i)` with
///   `i < total_sentences`; otherwise it is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    /// `true` from the first published sentence until the sequence ends.
    pub is_playing: bool,

    /// `true` while the current utterance is suspended.
    pub is_paused: bool,

    /// Speech rate multiplier.  Survives across sequences.
    pub rate: f32,

    /// The sentence being spoken, empty when idle.
    pub current_sentence: String,

    /// Position of `current_sentence` in the active sequence; `None` is the
    /// idle sentinel.
    pub current_sentence_index: Option<usize>,

    /// Length of the active sequence, `0` when idle.
    pub total_sentences: usize,
}

impl PlaybackState {
    /// An idle state with the given rate.
    pub fn new(rate: f32) -> Self {
        Self {
            is_playing: false,
            is_paused: false,
            rate,
            current_sentence: String::new(),
            current_sentence_index: None,
            total_sentences: 0,
        }
    }

    /// The state-machine phase implied by the flags.
    pub fn phase(&self) -> PlaybackPhase {
        match (self.is_playing, self.is_paused) {
            (false, _) => PlaybackPhase::Idle,
            (true, false) => PlaybackPhase::Playing,
            (true, true) => PlaybackPhase::Paused,
        }
    }

    /// Fraction of the sequence already behind the current sentence, in
    /// `[0.0, 1.0)`.  `None` when idle.
    ///
    /// ```
    /// use readaloud::playback::PlaybackState;
    ///
    /// let mut st = PlaybackState::default();
    /// assert_eq!(st.progress(), None);
    ///
    /// st.is_playing = true;
    /// st.current_sentence_index = Some(1);
    /// st.total_sentences = 4;
    /// assert_eq!(st.progress(), Some(0.25));
    /// ```
    pub fn progress(&self) -> Option<f32> {
        match self.current_sentence_index {
            Some(index) if self.is_playing && self.total_sentences > 0 => {
                Some(index as f32 / self.total_sentences as f32)
            }
            _ => None,
        }
    }

    /// Whether the documented invariants hold.
    pub fn is_consistent(&self) -> bool {
        if self.is_paused && !self.is_playing {
            return false;
        }
        match self.current_sentence_index {
            Some(index) => self.is_playing && index < self.total_sentences,
            None => !self.is_playing,
        }
    }

    /// Enter (or stay in) the playing phase at sentence `index`.
    pub(crate) fn start_sentence(&mut self, index: usize, sentence: &str, total: usize) {
        self.is_playing = true;
        self.total_sentences = total;
        self.current_sentence_index = Some(index);
        self.current_sentence.clear();
        self.current_sentence.push_str(sentence);
    }

    /// Return to the idle defaults, keeping the rate.
    ///
    /// Returns `true` when anything changed.
    pub(crate) fn reset(&mut self) -> bool {
        let idle = Self::new(self.rate);
        if *self == idle {
            return false;
        }
        *self = idle;
        true
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(DEFAULT_RATE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
