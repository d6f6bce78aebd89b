use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::config::Step;
use crate::executor::actions::{StepExecutor, StepOutcome, Wait, cancellable_sleep};
use crate::signals::{ShortcutEvent, StopSignalBridge};

/// How a run ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Stopped before the step at `at_step` (position in the run) finished.
    Cancelled { at_step: usize },
}

/// The run currently allowed to inject events.
struct ActiveRun {
    generation: u64,
    token: CancellationToken,
}

/// State shared between the controller, its run task and stop bridges.
pub(crate) struct RunState {
    active: Mutex<Option<ActiveRun>>,
    executing: watch::Sender<bool>,
    generations: AtomicU64,
}

impl RunState {
    fn new() -> Self {
        let (executing, _) = watch::channel(false);
        Self {
            active: Mutex::new(None),
            executing,
            generations: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `value`, notifying watchers only on a real transition.
    fn set_executing(&self, value: bool) {
        self.executing.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    pub(crate) fn stop(&self) {
        let mut active = self.lock();
        if let Some(run) = active.take() {
            run.token.cancel();
            info!(
                target: "automotion::runtime",
                generation = run.generation,
                "Cancelled execution"
            );
        }
        self.set_executing(false);
    }

    /// Clears the slot only if it still belongs to `generation`, so a
    /// superseded run can never mark its successor idle.
    fn finish(&self, generation: u64) {
        let mut active = self.lock();
        if active.as_ref().is_some_and(|run| run.generation == generation) {
            *active = None;
            self.set_executing(false);
        }
    }
}

/// A non-owning handle that can stop runs without keeping the controller alive.
#[derive(Clone)]
pub struct RunHandle {
    state: Weak<RunState>,
}

impl RunHandle {
    /// Stop the active run, if the controller still exists. Returns whether it did.
    pub fn stop(&self) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                state.stop();
                true
            }
            None => false,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state.strong_count() > 0
    }
}

/// Owns the run lifecycle: at most one run is alive at any time.
///
/// `run` cancels whatever is running, snapshots the steps and drives them on
/// a Tokio task. `stop` cancels. `is_executing` reflects the lifecycle and can
/// be watched through [`RunController::subscribe`].
///
/// Dropping the controller cancels the active run and detaches every stop
/// bridge attached with [`RunController::listen`].
pub struct RunController {
    executor: Arc<StepExecutor>,
    state: Arc<RunState>,
    bridges: Vec<StopSignalBridge>,
}

impl RunController {
    pub fn new(executor: StepExecutor) -> Self {
        Self {
            executor: Arc::new(executor),
            state: Arc::new(RunState::new()),
            bridges: Vec::new(),
        }
    }

    /// Start executing `steps` in ascending `order`.
    ///
    /// Any active run is cancelled first. `is_executing` goes straight from
    /// the old run to the new one without an intermediate `false`. The steps
    /// are copied, so later edits to the caller's list do not affect this run.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(&self, steps: &[Step]) {
        let mut snapshot = steps.to_vec();
        snapshot.sort_by_key(|s| s.order);

        let mut active = self.state.lock();
        if let Some(previous) = active.take() {
            previous.token.cancel();
            trace!(
                target: "automotion::runtime",
                generation = previous.generation,
                "Superseded active run"
            );
        }

        let generation = self.state.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();
        *active = Some(ActiveRun {
            generation,
            token: token.clone(),
        });
        self.state.set_executing(true);

        info!(
            target: "automotion::runtime",
            generation, steps = snapshot.len(),
            "Executing steps"
        );

        let executor = self.executor.clone();
        let state = Arc::downgrade(&self.state);
        // Spawned while the slot is locked: the task cannot clear the slot
        // before it has been installed.
        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = drive(&executor, &snapshot, &token).await;
            match outcome {
                RunOutcome::Completed => info!(
                    target: "automotion::runtime",
                    generation, elapsed_ms = started.elapsed().as_millis() as u64,
                    "Completed execution"
                ),
                RunOutcome::Cancelled { at_step } => info!(
                    target: "automotion::runtime",
                    generation, at_step,
                    "Execution stopped early"
                ),
            }
            if let Some(state) = state.upgrade() {
                state.finish(generation);
            }
        });
    }

    /// Cancel the active run, if any. Idempotent.
    pub fn stop(&self) {
        self.state.stop();
    }

    pub fn is_executing(&self) -> bool {
        *self.state.executing.borrow()
    }

    /// Observe `is_executing` changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.executing.subscribe()
    }

    /// Wait until no run is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|executing| !*executing).await;
    }

    /// A weak handle other layers can use to stop runs.
    pub fn handle(&self) -> RunHandle {
        RunHandle {
            state: Arc::downgrade(&self.state),
        }
    }

    /// Stop the active run whenever a stop shortcut is released on `signals`.
    /// The subscription lives as long as this controller.
    pub fn listen(&mut self, signals: broadcast::Receiver<ShortcutEvent>) {
        let bridge = StopSignalBridge::spawn(self.handle(), signals);
        self.bridges.push(bridge);
    }
}

impl Drop for RunController {
    fn drop(&mut self) {
        self.state.stop();
    }
}

/// Execute `steps` strictly in sequence until done or cancelled.
async fn drive(
    executor: &StepExecutor,
    steps: &[Step],
    cancel: &CancellationToken,
) -> RunOutcome {
    for (idx, step) in steps.iter().enumerate() {
        if cancel.is_cancelled() {
            return RunOutcome::Cancelled { at_step: idx };
        }
        trace!(
            target: "automotion::runtime",
            step_index = idx, order = step.order, kind = ?step.kind,
            delay_ms = step.delay.as_millis() as u64,
            "Waiting for step"
        );
        if cancellable_sleep(step.delay, cancel).await == Wait::Cancelled {
            return RunOutcome::Cancelled { at_step: idx };
        }
        if executor.execute(step, cancel).await == StepOutcome::Cancelled {
            return RunOutcome::Cancelled { at_step: idx };
        }
    }
    RunOutcome::Completed
}
