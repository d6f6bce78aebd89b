//! Pointer backends: the boundary where synthesized events leave the engine.
//!
//! The engine only needs two things from the environment: where the pointer
//! is right now, and a fire-and-forget way to inject an event. Backends never
//! report failures to the engine; they log and carry on.

use std::sync::mpsc::{self, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread;

use enigo::{Button as EButton, Coordinate, Direction, Enigo, Mouse as _, Settings};
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::config::Point;

/// Mouse buttons the engine drives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// A single synthesized pointer event.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerEvent {
    /// Plain move with no button held.
    Move,
    /// Move while `button` is held.
    Drag(MouseButton),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
}

/// Source of the current pointer position and sink for injected events.
///
/// Positions use a top-left origin with y growing downward.
pub trait Pointer: Send + Sync {
    /// Current global pointer location, read fresh from the environment.
    ///
    /// May block until the backend answers. Call it from blocking code, e.g.
    /// inside `tokio::task::spawn_blocking`, not directly on a runtime worker.
    fn position(&self) -> Point;

    /// Inject `event` at `at`. Best effort: failures are swallowed.
    fn inject(&self, event: PointerEvent, at: Point);
}

#[derive(Debug, Error)]
pub enum PointerError {
    #[error("failed to connect to the input backend: {0}")]
    Connect(String),
    #[error("failed to spawn the input thread")]
    Thread(#[from] std::io::Error),
}

enum Command {
    Inject(PointerEvent, Point),
    Locate(Sender<Point>),
}

/// Real input backend built on Enigo.
///
/// The `Enigo` handle lives on a dedicated thread that executes commands in
/// the order they were sent. Enigo already reports and expects top-left
/// coordinates on every platform; positions are rounded to whole pixels here.
pub struct EnigoPointer {
    commands: Sender<Command>,
}

impl EnigoPointer {
    /// Start the input thread and connect to the platform backend.
    pub fn spawn() -> Result<Self, PointerError> {
        let (tx, rx) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        thread::Builder::new()
            .name("automotion-input".into())
            .spawn(move || {
                let mut enigo = match Enigo::new(&Settings::default()) {
                    Ok(enigo) => {
                        let _ = ready_tx.send(Ok(()));
                        enigo
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let mut last = enigo
                    .location()
                    .map(|(x, y)| Point::new(f64::from(x), f64::from(y)))
                    .unwrap_or_default();

                for command in rx {
                    match command {
                        Command::Inject(event, at) => {
                            inject_with(&mut enigo, event, at);
                            last = at;
                        }
                        Command::Locate(reply) => {
                            let here = match enigo.location() {
                                Ok((x, y)) => Point::new(f64::from(x), f64::from(y)),
                                Err(e) => {
                                    warn!(
                                        target: "automotion::pointer",
                                        error = %e,
                                        "Pointer location unavailable; using last injected position"
                                    );
                                    last
                                }
                            };
                            let _ = reply.send(here);
                        }
                    }
                }
                trace!(target: "automotion::pointer", "Input thread exiting");
            })?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(target: "automotion::pointer", "Enigo input backend ready");
                Ok(Self { commands: tx })
            }
            Ok(Err(e)) => Err(PointerError::Connect(e)),
            Err(_) => Err(PointerError::Connect("input thread exited early".into())),
        }
    }

    fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }
}

impl Pointer for EnigoPointer {
    /// Waits for the input thread to drain the commands queued before it.
    fn position(&self) -> Point {
        let (reply_tx, reply_rx) = mpsc::channel();
        if self.send(Command::Locate(reply_tx)) {
            if let Ok(point) = reply_rx.recv() {
                return point;
            }
        }
        warn!(target: "automotion::pointer", "Input thread unavailable; reporting origin");
        Point::default()
    }

    fn inject(&self, event: PointerEvent, at: Point) {
        if !self.send(Command::Inject(event, at)) {
            warn!(target: "automotion::pointer", ?event, "Input thread unavailable; event dropped");
        }
    }
}

fn inject_with(enigo: &mut Enigo, event: PointerEvent, at: Point) {
    let (x, y) = (at.x.round() as i32, at.y.round() as i32);
    trace!(target: "automotion::pointer", ?event, x, y, "inject");

    // Enigo emits drag events by itself while a button is held.
    let moved = enigo.move_mouse(x, y, Coordinate::Abs);
    let result = match event {
        PointerEvent::Move | PointerEvent::Drag(_) => moved,
        PointerEvent::ButtonDown(button) => {
            moved.and(enigo.button(map_button(button), Direction::Press))
        }
        PointerEvent::ButtonUp(button) => {
            moved.and(enigo.button(map_button(button), Direction::Release))
        }
    };
    if let Err(e) = result {
        warn!(
            target: "automotion::pointer",
            ?event, x, y, error = %e,
            "Injection failed; ignoring"
        );
    }
}

fn map_button(button: MouseButton) -> EButton {
    match button {
        MouseButton::Left => EButton::Left,
        MouseButton::Right => EButton::Right,
    }
}

#[derive(Debug, Default)]
struct DryRunState {
    position: Point,
    journal: Option<Vec<(PointerEvent, Point)>>,
}

/// Backend that logs events instead of injecting them.
///
/// Tracks a virtual pointer that follows every injected event. Built with
/// [`DryRunPointer::recording`], it also keeps a journal of what it received.
#[derive(Debug, Default)]
pub struct DryRunPointer {
    state: Mutex<DryRunState>,
}

impl DryRunPointer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dry-run pointer that remembers every injected event.
    pub fn recording() -> Self {
        Self {
            state: Mutex::new(DryRunState {
                position: Point::default(),
                journal: Some(Vec::new()),
            }),
        }
    }

    /// Place the virtual pointer without recording an event, as a human would.
    pub fn warp(&self, to: Point) {
        self.lock().position = to;
    }

    /// Events received so far (empty unless built with `recording`).
    pub fn events(&self) -> Vec<(PointerEvent, Point)> {
        self.lock().journal.clone().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DryRunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Pointer for DryRunPointer {
    fn position(&self) -> Point {
        self.lock().position
    }

    fn inject(&self, event: PointerEvent, at: Point) {
        match event {
            PointerEvent::Move | PointerEvent::Drag(_) => {
                trace!(target: "automotion::pointer", ?event, x = at.x, y = at.y, "DRY-RUN inject");
            }
            PointerEvent::ButtonDown(_) | PointerEvent::ButtonUp(_) => {
                info!(target: "automotion::pointer", ?event, x = at.x, y = at.y, "DRY-RUN inject");
            }
        }
        let mut state = self.lock();
        state.position = at;
        if let Some(journal) = state.journal.as_mut() {
            journal.push((event, at));
        }
    }
}
