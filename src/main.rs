//! Application entry point — read a text file aloud in the terminal.
//!
//! # Usage
//!
//! ```text
//! readaloud <file>      # narrate <file>; type p / r / s / + / - / q + Enter
//! readaloud -           # narrate stdin (no interactive controls)
//! ```
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Read the text to narrate.
//! 3. Load [`AppConfig`] from disk (returns default on first run).
//! 4. Build the speech engine ([`ConsoleEngine`], optionally bounded by
//!    [`TimeoutEngine`]).
//! 5. Build the [`PlaybackOrchestrator`] and spawn a state observer.
//! 6. Spawn the stdin control listener thread.
//! 7. Narrate until done, stopped, or Ctrl-C.
//! 8. Save the final rate back to `settings.toml`.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use readaloud::{
    config::AppConfig,
    controls::{self, ControlCommand, StdinListener},
    playback::{PlaybackOrchestrator, PlaybackPhase},
    speech::{ConsoleEngine, SpeechEngine, TimeoutEngine},
};

// ---------------------------------------------------------------------------
// Engine wiring
// ---------------------------------------------------------------------------

fn build_engine(config: &AppConfig) -> Arc<dyn SpeechEngine> {
    let console = ConsoleEngine::from_config(&config.narrator);
    match config.playback.utterance_timeout_secs {
        Some(secs) => {
            log::info!("Utterance timeout: {secs} s");
            Arc::new(TimeoutEngine::new(console, Duration::from_secs(secs)))
        }
        None => Arc::new(console),
    }
}

fn read_text(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {source}"))
    }
}

/// Log phase and position changes as the orchestrator publishes them.
async fn observe(player: Arc<PlaybackOrchestrator>) {
    let mut updates = player.subscribe();
    let mut last = (PlaybackPhase::Idle, None);

    while updates.changed().await.is_ok() {
        let st = updates.borrow_and_update().clone();
        let current = (st.phase(), st.current_sentence_index);
        if current == last {
            continue;
        }
        last = current;

        match st.current_sentence_index {
            Some(index) => log::info!(
                "[{}/{}] {} (rate {:.2})",
                index + 1,
                st.total_sentences,
                st.phase().label(),
                st.rate
            ),
            None => log::info!("{}", st.phase().label()),
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Input
    let source = std::env::args()
        .nth(1)
        .context("usage: readaloud <file | ->")?;
    let text = read_text(&source)?;

    // 3. Configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 4–5. Engine + orchestrator
    let player = Arc::new(PlaybackOrchestrator::with_rate(
        build_engine(&config),
        config.playback.rate,
    ));
    let observer = tokio::spawn(observe(Arc::clone(&player)));

    // 6. Controls (stdin is the text source when reading from "-")
    let (command_tx, mut command_rx) = mpsc::channel::<ControlCommand>(16);
    let _listener = if source == "-" {
        None
    } else {
        log::info!("Controls: p pause · r resume · Enter toggle · s stop · +/- rate · q quit");
        Some(StdinListener::start(command_tx).context("failed to start control listener")?)
    };

    // 7. Narrate
    let mut narration = {
        let player = Arc::clone(&player);
        tokio::spawn(async move { player.speak(&text).await })
    };

    loop {
        tokio::select! {
            outcome = &mut narration => {
                match outcome {
                    Ok(Ok(())) => log::info!("Finished reading {source}"),
                    Ok(Err(e)) => log::error!("Playback failed: {e}"),
                    Err(e) => log::error!("Playback task panicked: {e}"),
                }
                break;
            }
            Some(command) = command_rx.recv() => {
                controls::apply(&player, command);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    log::warn!("Ctrl-C handler failed: {e}");
                }
                player.stop();
            }
        }
    }

    observer.abort();

    // 8. Persist the rate chosen during this session
    if (config.playback.rate - player.rate()).abs() > f32::EPSILON {
        config.playback.rate = player.rate();
        if let Err(e) = config.save() {
            log::warn!("Failed to save config: {e}");
        }
    }

    Ok(())
}
