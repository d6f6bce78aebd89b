/*!
Executor module for automotion.

This module wires together:
- `pointer`: the injection boundary (Enigo backend and a dry-run backend)
- `actions`: per-step execution with eased travel and jittered pauses
- `runtime`: the run lifecycle (one active run, cancellation, `is_executing`)

Typical usage:
```no_run
use std::sync::Arc;
use automotion::config::{Easing, Step, StepKind};
use automotion::executor::{DryRunPointer, RunController, StepExecutor};
use automotion::utils::UniformJitter;

# async fn demo() {
let executor = StepExecutor::new(Arc::new(DryRunPointer::new()), Arc::new(UniformJitter::default()));
let controller = RunController::new(executor);
let steps = vec![Step::new(StepKind::PrimaryClick).with_target(50.0, 50.0).with_easing(Easing::Off)];
controller.run(&steps);
controller.wait_idle().await;
# }
```
*/

pub mod actions;
pub mod pointer;
pub mod runtime;

pub use actions::{StepExecutor, StepOutcome, Wait, cancellable_sleep};
pub use pointer::{
    DryRunPointer, EnigoPointer, MouseButton, Pointer, PointerError, PointerEvent,
};
pub use runtime::{RunController, RunHandle, RunOutcome};
