//! Terminal playback controls for the `readaloud` binary.
//!
//! # Design
//!
//! Reading a line from stdin is a blocking call, so it runs on a **dedicated
//! OS thread** ([`StdinListener`]) that parses each line into a
//! [`ControlCommand`] and forwards it over a `tokio::sync::mpsc` channel.  The
//! async side applies commands to the orchestrator with [`apply`].
//!
//! | Input            | Command        |
//! |------------------|----------------|
//! | `p`, `pause`     | Pause          |
//! | `r`, `resume`    | Resume         |
//! | *(empty line)*   | TogglePause    |
//! | `s`, `stop`      | Stop           |
//! | `+`, `faster`    | Faster         |
//! | `-`, `slower`    | Slower         |
//! | `q`, `quit`      | Quit           |
//!
//! # Usage
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use readaloud::controls::StdinListener;
//!
//! let (tx, mut rx) = mpsc::channel(16);
//! let _listener = StdinListener::start(tx).expect("spawn stdin thread");
//!
//! // In your async loop:
//! // while let Some(cmd) = rx.recv().await { readaloud::controls::apply(&player, cmd); }
//! ```

pub mod listener;

pub use listener::StdinListener;

use crate::playback::PlaybackOrchestrator;

/// Rate change applied by one `Faster` / `Slower` command.
pub const RATE_STEP: f32 = 0.25;

// ---------------------------------------------------------------------------
// ControlCommand
// ---------------------------------------------------------------------------

/// Commands a listener can issue while a text is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Pause,
    Resume,
    /// Pause when playing, resume when paused.
    TogglePause,
    Stop,
    Faster,
    Slower,
    /// Stop playback and leave the program.
    Quit,
}

// ---------------------------------------------------------------------------
// parse_command
// ---------------------------------------------------------------------------

/// Parse one line of terminal input into a [`ControlCommand`].
///
/// Matching is case-insensitive and ignores surrounding whitespace.
/// Returns `None` for unrecognised input.
///
/// # Examples
///
/// ```
/// use readaloud::controls::{parse_command, ControlCommand};
///
/// assert_eq!(parse_command("p"),     Some(ControlCommand::Pause));
/// assert_eq!(parse_command(" Stop"), Some(ControlCommand::Stop));
/// assert_eq!(parse_command(""),      Some(ControlCommand::TogglePause));
/// assert_eq!(parse_command("xyz"),   None);
/// ```
pub fn parse_command(input: &str) -> Option<ControlCommand> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" => Some(ControlCommand::TogglePause),
        "p" | "pause" => Some(ControlCommand::Pause),
        "r" | "resume" => Some(ControlCommand::Resume),
        "s" | "stop" => Some(ControlCommand::Stop),
        "+" | "faster" => Some(ControlCommand::Faster),
        "-" | "slower" => Some(ControlCommand::Slower),
        "q" | "quit" | "exit" => Some(ControlCommand::Quit),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Apply `command` to `player`.
pub fn apply(player: &PlaybackOrchestrator, command: ControlCommand) {
    log::debug!("controls: {command:?}");
    match command {
        ControlCommand::Pause => player.pause(),
        ControlCommand::Resume => player.resume(),
        ControlCommand::TogglePause => {
            if player.snapshot().is_paused {
                player.resume();
            } else {
                player.pause();
            }
        }
        ControlCommand::Stop | ControlCommand::Quit => player.stop(),
        ControlCommand::Faster => player.set_rate(player.rate() + RATE_STEP),
        ControlCommand::Slower => player.set_rate(player.rate() - RATE_STEP),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
