#![forbid(unsafe_code)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! automotion: timed pointer automation with eased, cancellable trajectories.
//!
//! A workflow is an ordered list of steps (move, click, drag start/end), each
//! with a target, an easing mode and a delay. The engine runs one workflow at
//! a time and can be stopped at any moment:
//! - `config`: step/workflow models, the dense-order step list, JSON loading.
//! - `executor`: pointer backends, per-step execution, the run controller.
//! - `signals`: shortcut sources and the stop-signal bridge.
//! - `utils`: trajectory synthesis and jitter.
//!
//! Use `automotion::prelude::*` to bring commonly used items into scope quickly.

/// Public module: configuration (models, step list, loader).
pub mod config;
/// Public module: execution engine (pointer, actions, runtime).
pub mod executor;
/// Public module: shortcut signal sources and the stop bridge.
pub mod signals;
/// Public module: utilities (trajectory, jitter).
pub mod utils;

/// Crate-level constants for consumers that want to inspect package metadata at runtime.
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version (e.g., "0.1.0").
#[inline]
pub const fn version() -> &'static str {
    PKG_VERSION
}

/// Parse a plain level name (trace|debug|info|warn|error).
pub fn parse_level(s: &str) -> Option<tracing::Level> {
    use tracing::Level;
    match s.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Initialize tracing (logging) with a reasonable default.
/// - `level` wins when given and valid.
/// - Otherwise honors the `RUST_LOG` environment variable as a plain level.
/// - Falls back to `info`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::fmt;

    let level = level
        .and_then(parse_level)
        .or_else(|| std::env::var("RUST_LOG").ok().as_deref().and_then(parse_level))
        .unwrap_or(tracing::Level::INFO);

    // Ignore the error if the global subscriber was already set.
    let _ = fmt().with_max_level(level).try_init();
}

/// A convenient set of exports for most consumers.
///
/// Bring this into scope with:
/// `use automotion::prelude::*;`
pub mod prelude {
    pub use anyhow::{Context, Error, Result, anyhow, bail, ensure};

    pub use serde::{Deserialize, Serialize};

    pub use tracing::{debug, error, info, instrument, trace, warn};

    pub use std::time::Duration;

    pub use crate as automotion;
    pub use enigo;

    pub use crate::config::{Easing, Point, Step, StepKind, StepList, Workflow};
    pub use crate::executor::{DryRunPointer, EnigoPointer, Pointer, RunController, StepExecutor};
    pub use crate::signals::{Shortcut, ShortcutEvent, StopSignalBridge};
    pub use crate::utils::{JitterSource, NoJitter, UniformJitter};
    pub use crate::{config, executor, signals, utils};
}
