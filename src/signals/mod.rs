/*!
Shortcut signals (orchestration layer).

Global shortcut capture happens outside this crate. Whatever captures the
keys publishes [`ShortcutEvent`]s on a `tokio::sync::broadcast` channel; the
engine only subscribes.

- `bridge.rs`       -> `StopSignalBridge` (stop shortcut released => stop the run)
- `stdin_source.rs` -> `StdinSignals`     (shortcut events typed on standard input)
- `ctrl_c.rs`       -> `CtrlCSignals`     (Ctrl+C acts as the stop shortcut)

Sources never panic: they log and continue, or exit when their input ends.
A send with no subscribers is not an error; events are simply not buffered.
*/

use serde::{Deserialize, Serialize};
use tokio::{sync::broadcast::Sender, task::JoinHandle};
use tracing::info;

use crate::config::EngineSettings;

pub mod bridge;
pub mod ctrl_c;
pub mod stdin_source;

pub use bridge::StopSignalBridge;
pub use ctrl_c::CtrlCSignals;
pub use stdin_source::StdinSignals;

/// Shortcuts the engine reacts to.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Shortcut {
    /// Stop the active run.
    StopExecution,
    /// Capture the current pointer position.
    CapturePosition,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KeyPhase {
    Down,
    Up,
}

/// A press or release of a configured shortcut.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ShortcutEvent {
    pub shortcut: Shortcut,
    pub phase: KeyPhase,
}

impl ShortcutEvent {
    pub const fn released(shortcut: Shortcut) -> Self {
        Self {
            shortcut,
            phase: KeyPhase::Up,
        }
    }

    pub const fn pressed(shortcut: Shortcut) -> Self {
        Self {
            shortcut,
            phase: KeyPhase::Down,
        }
    }

    /// True for the key-up of `shortcut`; shortcuts fire on release.
    pub fn is_release_of(&self, shortcut: Shortcut) -> bool {
        self.shortcut == shortcut && self.phase == KeyPhase::Up
    }
}

/// Trait implemented by all shortcut sources.
pub trait SignalSource: Send + Sync {
    /// Static human-readable identifier (used in logs).
    fn name(&self) -> &'static str;

    /// Start producing events in the background.
    fn start(&self, sender: Sender<ShortcutEvent>) -> JoinHandle<()>;
}

/// Construct the sources enabled in `settings`.
pub fn build_sources(settings: &EngineSettings) -> Vec<Box<dyn SignalSource>> {
    let mut out: Vec<Box<dyn SignalSource>> = Vec::new();
    if settings.ctrl_c_stops {
        out.push(Box::new(CtrlCSignals::new()));
    }
    if settings.stdin_signals {
        out.push(Box::new(StdinSignals::new()));
    }
    out
}

/// Spawn every source, returning their `JoinHandle`s.
pub fn spawn_all_sources(
    sources: &[Box<dyn SignalSource>],
    sender: &Sender<ShortcutEvent>,
) -> Vec<JoinHandle<()>> {
    sources
        .iter()
        .map(|src| {
            info!(
                target: "automotion::signals",
                source = %src.name(),
                "Starting signal source"
            );
            src.start(sender.clone())
        })
        .collect()
}
