//! Stop-signal bridge.
//!
//! Turns key-up events of the stop shortcut into `stop()` calls on a run
//! controller. Nothing is buffered: a release while idle is a no-op.
//!
//! Lifecycle:
//! - The bridge holds only a weak handle, so it never keeps the controller alive.
//! - Dropping the bridge cancels its task; `shutdown` also waits for it.
//! - The task ends on its own when the channel closes or the controller is gone.

use tokio::{
    sync::broadcast::{Receiver, error::RecvError},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{Shortcut, ShortcutEvent};
use crate::executor::RunHandle;

pub struct StopSignalBridge {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl StopSignalBridge {
    /// Subscribe `target` to `signals`. Must be called within a Tokio runtime.
    pub fn spawn(target: RunHandle, mut signals: Receiver<ShortcutEvent>) -> Self {
        let token = CancellationToken::new();
        let cancel = token.clone();

        let handle = tokio::spawn(async move {
            trace!(target: "automotion::signals", "Stop bridge listening");
            loop {
                let received = tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = signals.recv() => received,
                };
                match received {
                    Ok(event) if event.is_release_of(Shortcut::StopExecution) => {
                        info!(target: "automotion::signals", "Stop shortcut released");
                        if !target.stop() {
                            debug!(target: "automotion::signals", "Run controller gone");
                            break;
                        }
                    }
                    Ok(event) => {
                        trace!(target: "automotion::signals", ?event, "Ignoring shortcut event");
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // A missed event may have been a stop.
                        warn!(
                            target: "automotion::signals",
                            missed,
                            "Signal receiver lagged; stopping to be safe"
                        );
                        if !target.stop() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!(target: "automotion::signals", "Signal channel closed");
                        break;
                    }
                }
            }
            trace!(target: "automotion::signals", "Stop bridge ended");
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Stop listening and wait for the task to finish.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for StopSignalBridge {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
