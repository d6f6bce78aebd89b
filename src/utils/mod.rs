//! Utilities for automotion.
//!
//! Submodules:
//! - `trajectory`: cubic easing curve and eased point synthesis.
//! - `jitter`: randomized pauses between synthesized points.

pub mod jitter;
pub mod trajectory;

pub use jitter::{JitterSource, NoJitter, UniformJitter};
pub use trajectory::{Trajectory, cubic_ease_out, step_count, synthesize};
