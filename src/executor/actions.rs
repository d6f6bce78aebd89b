use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::task;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::{Easing, Point, Step, StepKind};
use crate::executor::pointer::{MouseButton, Pointer, PointerEvent};
use crate::utils::jitter::JitterSource;
use crate::utils::trajectory;

/// Result of a cancellable wait.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Wait {
    Elapsed,
    Cancelled,
}

/// Result of executing one step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// Cancellation was observed part way; the remaining events were skipped.
    Cancelled,
}

/// Sleep for `duration` unless `cancel` fires first.
///
/// A zero duration does not yield, but a token that is already cancelled is
/// still reported.
pub async fn cancellable_sleep(duration: Duration, cancel: &CancellationToken) -> Wait {
    if cancel.is_cancelled() {
        return Wait::Cancelled;
    }
    if duration.is_zero() {
        return Wait::Elapsed;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Wait::Cancelled,
        _ = sleep(duration) => Wait::Elapsed,
    }
}

/// Turns a single [`Step`] into pointer events.
///
/// Eased travel starts from the pointer's live position, since a human may
/// have moved it since the last step.
pub struct StepExecutor {
    pointer: Arc<dyn Pointer>,
    jitter: Arc<dyn JitterSource>,
}

impl StepExecutor {
    pub fn new(pointer: Arc<dyn Pointer>, jitter: Arc<dyn JitterSource>) -> Self {
        Self { pointer, jitter }
    }

    /// Perform `step`. `cancel` is checked after every synthesized point.
    pub async fn execute(&self, step: &Step, cancel: &CancellationToken) -> StepOutcome {
        trace!(
            target: "automotion::actions",
            kind = ?step.kind, x = step.target.x, y = step.target.y,
            "execute step"
        );
        match step.kind {
            StepKind::Move => self.travel(step, cancel).await,
            StepKind::PrimaryClick => self.click(step, MouseButton::Left, cancel).await,
            StepKind::SecondaryClick => self.click(step, MouseButton::Right, cancel).await,
            StepKind::DragStart => {
                if self.travel(step, cancel).await == StepOutcome::Cancelled {
                    return StepOutcome::Cancelled;
                }
                self.pointer
                    .inject(PointerEvent::ButtonDown(MouseButton::Left), step.target);
                StepOutcome::Completed
            }
            StepKind::DragEnd => {
                // Without easing there is no drag path: the button is released
                // straight at the target.
                let outcome = match step.easing {
                    Easing::Off => StepOutcome::Completed,
                    Easing::Cubic { factor } => {
                        self.animate(
                            step.target,
                            factor,
                            PointerEvent::Drag(MouseButton::Left),
                            cancel,
                        )
                        .await
                    }
                };
                // Released even when cancelled so the button is not left held.
                self.pointer
                    .inject(PointerEvent::ButtonUp(MouseButton::Left), step.target);
                outcome
            }
        }
    }

    /// Move to the step's target, eased or direct.
    async fn travel(&self, step: &Step, cancel: &CancellationToken) -> StepOutcome {
        match step.easing {
            Easing::Off => {
                self.pointer.inject(PointerEvent::Move, step.target);
                StepOutcome::Completed
            }
            Easing::Cubic { factor } => {
                self.animate(step.target, factor, PointerEvent::Move, cancel)
                    .await
            }
        }
    }

    async fn click(
        &self,
        step: &Step,
        button: MouseButton,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        if self.travel(step, cancel).await == StepOutcome::Cancelled {
            return StepOutcome::Cancelled;
        }
        self.pointer
            .inject(PointerEvent::ButtonDown(button), step.target);
        self.pointer.inject(PointerEvent::ButtonUp(button), step.target);
        StepOutcome::Completed
    }

    /// Inject `event` along the eased path from the live pointer position to
    /// `to`, pausing a jittered interval after every point.
    ///
    /// The pauses are a few hundred microseconds, finer than the Tokio timer,
    /// so the whole path is walked on the blocking pool with thread sleeps.
    async fn animate(
        &self,
        to: Point,
        factor: f64,
        event: PointerEvent,
        cancel: &CancellationToken,
    ) -> StepOutcome {
        let pointer = self.pointer.clone();
        let jitter = self.jitter.clone();
        let cancel = cancel.clone();
        let walk = task::spawn_blocking(move || {
            walk_path(pointer.as_ref(), jitter.as_ref(), to, factor, event, &cancel)
        });
        match walk.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    target: "automotion::actions",
                    ?event, error = %e,
                    "Trajectory task failed"
                );
                StepOutcome::Cancelled
            }
        }
    }
}

/// Blocking body of [`StepExecutor::animate`]. Cancellation is checked after
/// each pause, so it lands within one jitter interval.
fn walk_path(
    pointer: &dyn Pointer,
    jitter: &dyn JitterSource,
    to: Point,
    factor: f64,
    event: PointerEvent,
    cancel: &CancellationToken,
) -> StepOutcome {
    let from = pointer.position();
    let path = trajectory::synthesize(from, to, factor);
    trace!(
        target: "automotion::actions",
        ?event, points = path.len(), %from, %to,
        "animate"
    );

    for (i, point) in path.enumerate() {
        pointer.inject(event, point);
        let pause = jitter.next_delay();
        if !pause.is_zero() {
            thread::sleep(pause);
        }
        if cancel.is_cancelled() {
            debug!(
                target: "automotion::actions",
                ?event, injected = i + 1,
                "Trajectory cancelled"
            );
            return StepOutcome::Cancelled;
        }
    }
    StepOutcome::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::pointer::DryRunPointer;
    use crate::utils::jitter::{NoJitter, UniformJitter};

    fn executor() -> (Arc<DryRunPointer>, StepExecutor) {
        let pointer = Arc::new(DryRunPointer::recording());
        let exec = StepExecutor::new(pointer.clone(), Arc::new(NoJitter));
        (pointer, exec)
    }

    fn step(kind: StepKind, x: f64, y: f64, easing: Easing) -> Step {
        Step::new(kind)
            .with_target(x, y)
            .with_easing(easing)
            .with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn direct_move_is_a_single_event() {
        let (pointer, exec) = executor();
        let token = CancellationToken::new();
        let outcome = exec
            .execute(&step(StepKind::Move, 100.0, 100.0, Easing::Off), &token)
            .await;
        assert_eq!(outcome, StepOutcome::Completed);
        assert_eq!(
            pointer.events(),
            vec![(PointerEvent::Move, Point::new(100.0, 100.0))]
        );
    }

    #[tokio::test]
    async fn eased_move_emits_formula_count() {
        let (pointer, exec) = executor();
        let token = CancellationToken::new();
        exec.execute(
            &step(StepKind::Move, 300.0, 0.0, Easing::Cubic { factor: 100.0 }),
            &token,
        )
        .await;

        let events = pointer.events();
        assert_eq!(events.len(), 301);
        assert!(events.iter().all(|(e, _)| *e == PointerEvent::Move));
        assert!(events[0].1.x < 0.01 && events[0].1.y == 0.0);
        assert_eq!(events[300].1, Point::new(300.0, 0.0));
    }

    #[tokio::test]
    async fn click_moves_then_presses_and_releases() {
        let (pointer, exec) = executor();
        let token = CancellationToken::new();
        exec.execute(&step(StepKind::PrimaryClick, 50.0, 50.0, Easing::Off), &token)
            .await;
        let at = Point::new(50.0, 50.0);
        assert_eq!(
            pointer.events(),
            vec![
                (PointerEvent::Move, at),
                (PointerEvent::ButtonDown(MouseButton::Left), at),
                (PointerEvent::ButtonUp(MouseButton::Left), at),
            ]
        );
    }

    #[tokio::test]
    async fn secondary_click_uses_right_button() {
        let (pointer, exec) = executor();
        let token = CancellationToken::new();
        exec.execute(&step(StepKind::SecondaryClick, 5.0, 5.0, Easing::Off), &token)
            .await;
        let kinds: Vec<PointerEvent> = pointer.events().into_iter().map(|(e, _)| e).collect();
        assert_eq!(
            kinds,
            vec![
                PointerEvent::Move,
                PointerEvent::ButtonDown(MouseButton::Right),
                PointerEvent::ButtonUp(MouseButton::Right),
            ]
        );
    }

    #[tokio::test]
    async fn drag_start_presses_without_release() {
        let (pointer, exec) = executor();
        let token = CancellationToken::new();
        exec.execute(
            &step(StepKind::DragStart, 10.0, 0.0, Easing::Cubic { factor: 50.0 }),
            &token,
        )
        .await;
        let events = pointer.events();
        // floor(10 * 50 / 100) + 1 eased moves, then the press.
        assert_eq!(events.len(), 7);
        assert!(events[..6].iter().all(|(e, _)| *e == PointerEvent::Move));
        assert_eq!(
            events[6],
            (PointerEvent::ButtonDown(MouseButton::Left), Point::new(10.0, 0.0))
        );
    }

    #[tokio::test]
    async fn eased_drag_end_drags_then_releases() {
        let (pointer, exec) = executor();
        pointer.warp(Point::new(0.0, 20.0));
        let token = CancellationToken::new();
        exec.execute(
            &step(StepKind::DragEnd, 0.0, 0.0, Easing::Cubic { factor: 50.0 }),
            &token,
        )
        .await;
        let events = pointer.events();
        assert_eq!(events.len(), 12);
        assert!(
            events[..11]
                .iter()
                .all(|(e, _)| *e == PointerEvent::Drag(MouseButton::Left))
        );
        assert_eq!(
            events[11],
            (PointerEvent::ButtonUp(MouseButton::Left), Point::new(0.0, 0.0))
        );
    }

    // Documented quirk: a drag end without easing never drags, it only releases.
    #[tokio::test]
    async fn drag_end_without_easing_only_releases() {
        let (pointer, exec) = executor();
        pointer.warp(Point::new(400.0, 400.0));
        let token = CancellationToken::new();
        exec.execute(&step(StepKind::DragEnd, 10.0, 10.0, Easing::Off), &token)
            .await;
        assert_eq!(
            pointer.events(),
            vec![(
                PointerEvent::ButtonUp(MouseButton::Left),
                Point::new(10.0, 10.0)
            )]
        );
    }

    #[tokio::test]
    async fn trajectory_starts_from_live_position() {
        let (pointer, exec) = executor();
        pointer.warp(Point::new(1000.0, 1000.0));
        let token = CancellationToken::new();
        exec.execute(
            &step(StepKind::Move, 1000.0, 1010.0, Easing::Cubic { factor: 100.0 }),
            &token,
        )
        .await;
        let events = pointer.events();
        assert_eq!(events.len(), 11);
        assert!(events[0].1.y < 1000.1 && events[0].1.x == 1000.0);
    }

    #[tokio::test]
    async fn cancelled_click_skips_buttons() {
        let (pointer, exec) = executor();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = exec
            .execute(
                &step(
                    StepKind::PrimaryClick,
                    300.0,
                    0.0,
                    Easing::Cubic { factor: 100.0 },
                ),
                &token,
            )
            .await;
        assert_eq!(outcome, StepOutcome::Cancelled);
        // One point may already be in flight when cancellation is observed.
        let events = pointer.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, PointerEvent::Move);
    }

    #[tokio::test]
    async fn cancelled_drag_end_still_releases() {
        let (pointer, exec) = executor();
        let token = CancellationToken::new();
        token.cancel();
        let outcome = exec
            .execute(
                &step(StepKind::DragEnd, 100.0, 0.0, Easing::Cubic { factor: 100.0 }),
                &token,
            )
            .await;
        assert_eq!(outcome, StepOutcome::Cancelled);
        let kinds: Vec<PointerEvent> = pointer.events().into_iter().map(|(e, _)| e).collect();
        assert_eq!(
            kinds,
            vec![
                PointerEvent::Drag(MouseButton::Left),
                PointerEvent::ButtonUp(MouseButton::Left),
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn jittered_points_are_paced_in_microseconds() {
        let pointer = Arc::new(DryRunPointer::recording());
        let exec = StepExecutor::new(pointer.clone(), Arc::new(UniformJitter::default()));
        let token = CancellationToken::new();

        let started = std::time::Instant::now();
        let outcome = exec
            .execute(
                &step(StepKind::Move, 300.0, 0.0, Easing::Cubic { factor: 100.0 }),
                &token,
            )
            .await;
        let elapsed = started.elapsed();

        assert_eq!(outcome, StepOutcome::Completed);
        assert_eq!(pointer.events().len(), 301);
        // At least 200 us per point, and well under the 1 ms a timer tick would take.
        assert!(elapsed >= Duration::from_micros(200 * 301), "{elapsed:?}");
        assert!(elapsed < Duration::from_micros(2 * 300 * 301), "{elapsed:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cancellation_lands_mid_trajectory() {
        let pointer = Arc::new(DryRunPointer::recording());
        let exec = StepExecutor::new(pointer.clone(), Arc::new(UniformJitter::default()));
        let token = CancellationToken::new();

        // 1001 points, roughly a quarter of a second.
        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let outcome = exec
            .execute(
                &step(
                    StepKind::PrimaryClick,
                    1000.0,
                    0.0,
                    Easing::Cubic { factor: 100.0 },
                ),
                &token,
            )
            .await;

        assert_eq!(outcome, StepOutcome::Cancelled);
        let events = pointer.events();
        assert!(!events.is_empty() && events.len() < 1001, "{}", events.len());
        assert!(events.iter().all(|(e, _)| *e == PointerEvent::Move));
    }

    /// Answers position queries slowly, like a backend with a busy queue.
    #[derive(Default)]
    struct SlowPointer(DryRunPointer);

    impl Pointer for SlowPointer {
        fn position(&self) -> Point {
            thread::sleep(Duration::from_millis(100));
            self.0.position()
        }

        fn inject(&self, event: PointerEvent, at: Point) {
            self.0.inject(event, at);
        }
    }

    #[tokio::test]
    async fn slow_position_query_leaves_runtime_free() {
        let exec = StepExecutor::new(Arc::new(SlowPointer::default()), Arc::new(NoJitter));
        let token = CancellationToken::new();

        let started = std::time::Instant::now();
        let walk = tokio::spawn(async move {
            exec.execute(
                &step(StepKind::Move, 10.0, 0.0, Easing::Cubic { factor: 100.0 }),
                &token,
            )
            .await
        });
        tokio::task::yield_now().await;
        sleep(Duration::from_millis(10)).await;
        assert!(started.elapsed() < Duration::from_millis(80));
        assert_eq!(walk.await.unwrap(), StepOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellable_sleep_reports_cancellation() {
        let token = CancellationToken::new();
        assert_eq!(
            cancellable_sleep(Duration::from_millis(5), &token).await,
            Wait::Elapsed
        );

        let canceller = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });
        assert_eq!(
            cancellable_sleep(Duration::from_secs(60), &token).await,
            Wait::Cancelled
        );
        assert_eq!(cancellable_sleep(Duration::ZERO, &token).await, Wait::Cancelled);
    }
}
