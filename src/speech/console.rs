//! Paced console narrator — a [`SpeechEngine`] without an audio backend.
//!
//! [`ConsoleEngine`] "speaks" an utterance by echoing it to stdout and then
//! holding for as long as a human narrator would need to read it aloud:
//!
//! ```text
//! duration = words × 60 s / (words_per_minute × rate)
//! ```
//!
//! It honours the full engine contract: `pause` freezes the remaining time,
//! `resume` continues it, `stop` resolves the pending `speak` immediately,
//! and a new `speak` supersedes an utterance still in flight.
//!
//! Control signals travel over a `tokio::sync::watch` channel.  Every
//! utterance takes a fresh generation number, so a signal aimed at an old
//! utterance can never leak into a newer one.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::config::NarratorConfig;

use super::engine::{clamp_rate, SpeechEngine, SpeechError, DEFAULT_RATE};

// ---------------------------------------------------------------------------
// Control channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Speaking,
    Paused,
}

#[derive(Debug, Clone, Copy)]
struct Control {
    generation: u64,
    mode: Mode,
}

// ---------------------------------------------------------------------------
// ConsoleEngine
// ---------------------------------------------------------------------------

/// Narrates to the terminal at a fixed reading pace.
pub struct ConsoleEngine {
    words_per_minute: u32,
    echo: bool,
    rate: Mutex<f32>,
    control: watch::Sender<Control>,
}

impl ConsoleEngine {
    /// Create a narrator reading at `words_per_minute` (at rate 1.0).
    ///
    /// When `echo` is `true` every utterance is printed to stdout as it
    /// starts.
    pub fn new(words_per_minute: u32, echo: bool) -> Self {
        let (control, _) = watch::channel(Control {
            generation: 0,
            mode: Mode::Idle,
        });
        Self {
            words_per_minute: words_per_minute.max(1),
            echo,
            rate: Mutex::new(DEFAULT_RATE),
            control,
        }
    }

    /// Build a narrator from application config.
    pub fn from_config(config: &NarratorConfig) -> Self {
        Self::new(config.words_per_minute, config.echo)
    }

    /// How long `text` takes to narrate at the current rate.
    pub fn utterance_duration(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count().max(1) as f64;
        let per_minute = f64::from(self.words_per_minute) * f64::from(self.rate());
        Duration::from_secs_f64(words * 60.0 / per_minute)
    }

    fn lock_rate(&self) -> std::sync::MutexGuard<'_, f32> {
        self.rate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark utterance `generation` finished, unless a newer one took over.
    fn finish(&self, generation: u64) {
        self.control.send_if_modified(|c| {
            if c.generation == generation && c.mode != Mode::Idle {
                c.mode = Mode::Idle;
                true
            } else {
                false
            }
        });
    }

    fn transition(&self, from: Mode, to: Mode) {
        self.control.send_if_modified(|c| {
            if c.mode == from {
                c.mode = to;
                true
            } else {
                false
            }
        });
    }
}

impl Default for ConsoleEngine {
    fn default() -> Self {
        Self::from_config(&NarratorConfig::default())
    }
}

#[async_trait]
impl SpeechEngine for ConsoleEngine {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let mut remaining = self.utterance_duration(text);

        let mut generation = 0;
        self.control.send_modify(|c| {
            c.generation += 1;
            c.mode = Mode::Speaking;
            generation = c.generation;
        });
        let mut rx = self.control.subscribe();

        log::debug!("console: utterance #{generation} for {remaining:?}");
        if self.echo {
            println!("{text}");
        }

        loop {
            let control = *rx.borrow_and_update();
            if control.generation != generation || control.mode == Mode::Idle {
                log::debug!("console: utterance #{generation} stopped");
                return Ok(());
            }

            if control.mode == Mode::Paused {
                if rx.changed().await.is_err() {
                    return Ok(());
                }
                continue;
            }

            let started = Instant::now();
            tokio::select! {
                _ = tokio::time::sleep(remaining) => {
                    self.finish(generation);
                    return Ok(());
                }
                changed = rx.changed() => {
                    remaining = remaining.saturating_sub(started.elapsed());
                    if changed.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn pause(&self) {
        self.transition(Mode::Speaking, Mode::Paused);
    }

    fn resume(&self) {
        self.transition(Mode::Paused, Mode::Speaking);
    }

    fn stop(&self) {
        self.control.send_if_modified(|c| {
            let active = c.mode != Mode::Idle;
            c.mode = Mode::Idle;
            active
        });
    }

    fn set_rate(&self, rate: f32) {
        *self.lock_rate() = clamp_rate(rate);
    }

    fn rate(&self) -> f32 {
        *self.lock_rate()
    }

    async fn is_speaking(&self) -> bool {
        self.control.borrow().mode != Mode::Idle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
