//! Stdin shortcut source.
//!
//! Reads one shortcut event per line from standard input.
//!
//! Accepted lines:
//! - JSON, e.g. `{"shortcut":"stop_execution","phase":"up"}`
//! - the shorthands `stop` and `capture`, meaning a release of the respective shortcut
//!
//! Blank lines are skipped, malformed lines are logged with `warn!` and ignored,
//! and EOF ends the task. Useful for driving the engine from a pipe or a
//! wrapper process that owns the real global hotkeys.
//!
//! Lines are read on a detached OS thread so a pending read never holds up
//! runtime shutdown.

use std::io::{self, BufRead};
use std::thread;

use tokio::{
    sync::{broadcast::Sender, mpsc},
    task::JoinHandle,
};
use tracing::{info, trace, warn};

use super::{Shortcut, ShortcutEvent, SignalSource};

#[derive(Debug, Clone, Default)]
pub struct StdinSignals;

impl StdinSignals {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Parse a single input line. `None` for blank lines.
pub fn parse_line(line: &str) -> Option<Result<ShortcutEvent, serde_json::Error>> {
    let raw = line.trim();
    if raw.is_empty() {
        return None;
    }
    let event = match raw.to_ascii_lowercase().as_str() {
        "stop" => Ok(ShortcutEvent::released(Shortcut::StopExecution)),
        "capture" => Ok(ShortcutEvent::released(Shortcut::CapturePosition)),
        _ => serde_json::from_str::<ShortcutEvent>(raw),
    };
    Some(event)
}

impl SignalSource for StdinSignals {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn start(&self, sender: Sender<ShortcutEvent>) -> JoinHandle<()> {
        let (line_tx, mut line_rx) = mpsc::channel::<String>(16);

        let spawned = thread::Builder::new()
            .name("automotion-stdin".into())
            .spawn(move || {
                for line in io::stdin().lock().lines() {
                    match line {
                        Ok(line) => {
                            if line_tx.blocking_send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(
                                target: "automotion::signals",
                                error = %e,
                                "Error reading from stdin; terminating reader"
                            );
                            break;
                        }
                    }
                }
            });
        if let Err(e) = spawned {
            warn!(target: "automotion::signals", error = %e, "Failed to spawn stdin reader");
        }

        tokio::spawn(async move {
            info!(target: "automotion::signals", "StdinSignals task started (reading lines)");
            while let Some(line) = line_rx.recv().await {
                match parse_line(&line) {
                    None => continue,
                    Some(Ok(event)) => {
                        trace!(target: "automotion::signals", ?event, "Parsed shortcut from stdin");
                        if sender.send(event).is_err() {
                            trace!(target: "automotion::signals", "No subscribers for stdin event");
                        }
                    }
                    Some(Err(e)) => {
                        warn!(
                            target: "automotion::signals",
                            error = %e,
                            line = line.trim(),
                            "Failed to parse shortcut line"
                        );
                    }
                }
            }
            info!(target: "automotion::signals", "EOF on stdin; StdinSignals exiting");
        })
    }
}
