//! Ctrl+C as the stop shortcut.
//!
//! Every interrupt is published as a release of `StopExecution`, so a running
//! workflow can be halted from the terminal that started it.

use tokio::{signal, sync::broadcast::Sender, task::JoinHandle};
use tracing::{info, trace, warn};

use super::{Shortcut, ShortcutEvent, SignalSource};

#[derive(Debug, Clone, Default)]
pub struct CtrlCSignals;

impl CtrlCSignals {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SignalSource for CtrlCSignals {
    fn name(&self) -> &'static str {
        "ctrl_c"
    }

    fn start(&self, sender: Sender<ShortcutEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                if let Err(e) = signal::ctrl_c().await {
                    warn!(
                        target: "automotion::signals",
                        error = %e,
                        "Unable to listen for Ctrl+C; CtrlCSignals exiting"
                    );
                    break;
                }
                info!(target: "automotion::signals", "Received Ctrl+C");
                if sender
                    .send(ShortcutEvent::released(Shortcut::StopExecution))
                    .is_err()
                {
                    trace!(target: "automotion::signals", "No subscribers for Ctrl+C");
                }
            }
        })
    }
}
