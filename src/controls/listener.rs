//! Dedicated OS-thread reader for terminal control commands.
//!
//! Reading stdin blocks, so [`StdinListener`] owns a thread that reads line
//! by line, parses each line with [`parse_command`] and forwards the result
//! with `blocking_send`.  Dropping the handle sets a stop flag so further
//! lines are discarded.
//!
//! # Shutdown caveat
//!
//! A thread blocked in `read_line` cannot be interrupted.  After the stop
//! flag is set the thread stays parked until the next line or EOF arrives,
//! then exits without forwarding anything.

use std::io::BufRead;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::{parse_command, ControlCommand};

// ---------------------------------------------------------------------------
// StdinListener
// ---------------------------------------------------------------------------

/// Handle to a running input-reader thread.
pub struct StdinListener {
    /// Shared stop flag — set `true` on [`Drop`].
    stop: Arc<AtomicBool>,
    /// Kept so the thread is not detached; never joined because it may be
    /// blocked on input.
    _thread: std::thread::JoinHandle<()>,
}

impl StdinListener {
    /// Spawn a thread that reads commands from the process's stdin.
    pub fn start(tx: mpsc::Sender<ControlCommand>) -> std::io::Result<Self> {
        Self::spawn_reader(std::io::BufReader::new(std::io::stdin()), tx)
    }

    /// Spawn a thread that reads commands from any line-oriented `reader`.
    ///
    /// The thread exits at EOF, on a read error, after a `Quit` command, or
    /// when the receiving side of `tx` is closed.
    pub fn spawn_reader<R>(reader: R, tx: mpsc::Sender<ControlCommand>) -> std::io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("controls-listener".into())
            .spawn(move || {
                for line in reader.lines() {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }

                    let line = match line {
                        Ok(line) => line,
                        Err(e) => {
                            log::error!("controls-listener: read failed: {e}");
                            return;
                        }
                    };

                    let Some(command) = parse_command(&line) else {
                        log::warn!("controls-listener: unknown command {:?}", line.trim());
                        continue;
                    };

                    // blocking_send is safe to call from non-async threads.
                    if tx.blocking_send(command).is_err() || command == ControlCommand::Quit {
                        return;
                    }
                }
                log::debug!("controls-listener: input closed");
            })?;

        Ok(Self {
            stop,
            _thread: thread,
        })
    }
}

impl Drop for StdinListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
