use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_valid::Validate;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::executor::pointer::Pointer;

/// Root configuration for automotion.
///
/// Deserialized from a JSON file. It carries:
/// - engine `settings` (jitter bounds, which signal sources to start)
/// - named `workflows`, each an ordered list of steps
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct Config {
    /// Engine-wide settings.
    #[serde(default)]
    pub settings: EngineSettings,

    /// Named workflows. The CLI picks one by name.
    #[serde(default)]
    pub workflows: Workflows,
}

/// Workflows keyed by name.
pub type Workflows = BTreeMap<String, Workflow>;

/// Settings shared by every run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// Lower bound (inclusive) of the pause between synthesized points, in microseconds.
    pub jitter_min_us: u64,
    /// Upper bound (exclusive) of the pause between synthesized points, in microseconds.
    pub jitter_max_us: u64,
    /// Read shortcut events from standard input.
    pub stdin_signals: bool,
    /// Treat Ctrl+C as the stop shortcut.
    pub ctrl_c_stops: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            jitter_min_us: 200,
            jitter_max_us: 300,
            stdin_signals: true,
            ctrl_c_stops: true,
        }
    }
}

/// A titled, ordered list of steps.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, Default)]
pub struct Workflow {
    /// Human readable title.
    #[serde(default)]
    pub title: String,

    /// Steps of the workflow; `order` values must be exactly `0..len`.
    #[serde(default)]
    #[validate]
    pub steps: Vec<Step>,
}

/// A 2D screen position. Origin is the top-left corner, y grows downward.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation toward `to` by `t` (not clamped).
    pub fn lerp(&self, to: Point, t: f64) -> Point {
        Point {
            x: self.x + t * (to.x - self.x),
            y: self.y + t * (to.y - self.y),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// What a step does once its delay has elapsed.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Travel to the target.
    Move,
    /// Travel to the target, then press and release the left button.
    PrimaryClick,
    /// Travel to the target, then press and release the right button.
    SecondaryClick,
    /// Travel to the target, then press the left button and keep it down.
    DragStart,
    /// Drag to the target (only when easing is on), then release the left button.
    DragEnd,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepKind::Move => "Mouse Move",
            StepKind::PrimaryClick => "Primary Click",
            StepKind::SecondaryClick => "Secondary Click",
            StepKind::DragStart => "Drag Start",
            StepKind::DragEnd => "Drag End",
        };
        f.write_str(label)
    }
}

/// How the pointer travels to a step's target.
///
/// A larger cubic factor yields more synthesized points and therefore a
/// slower, smoother movement.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Easing {
    /// Jump straight to the target.
    Off,
    /// Cubic ease-in-out travel.
    Cubic {
        #[validate(minimum = 50.0)]
        #[validate(maximum = 2500.0)]
        factor: f64,
    },
}

/// Coarse speed bucket of a cubic easing factor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EasingSpeed {
    VeryFast,
    Fast,
    Medium,
    Slow,
    VerySlow,
    OutOfRange,
}

impl fmt::Display for EasingSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EasingSpeed::VeryFast => "Very Fast",
            EasingSpeed::Fast => "Fast",
            EasingSpeed::Medium => "Medium",
            EasingSpeed::Slow => "Slow",
            EasingSpeed::VerySlow => "Very Slow",
            EasingSpeed::OutOfRange => "Out of Range",
        };
        f.write_str(label)
    }
}

impl Easing {
    pub const CUBIC_LOWER_BOUND: f64 = 50.0;
    pub const CUBIC_UPPER_BOUND: f64 = 2500.0;
    pub const CUBIC_DEFAULT_FACTOR: f64 = 300.0;

    pub const fn cubic_default() -> Self {
        Easing::Cubic {
            factor: Self::CUBIC_DEFAULT_FACTOR,
        }
    }

    /// Whether the pointer is animated toward the target.
    pub fn is_on(&self) -> bool {
        match self {
            Easing::Off => false,
            Easing::Cubic { .. } => true,
        }
    }

    pub fn cubic_factor(&self) -> Option<f64> {
        match self {
            Easing::Off => None,
            Easing::Cubic { factor } => Some(*factor),
        }
    }

    /// Speed bucket of a cubic factor, `None` when easing is off.
    ///
    /// The bound range is split in five equal sub-ranges. The first bucket is
    /// `[lower, width)` rather than `[lower, lower + width)`, so factors in
    /// `[width, lower + width)` already count as `Fast`.
    pub fn speed(&self) -> Option<EasingSpeed> {
        let factor = self.cubic_factor()?;
        let width = (Self::CUBIC_UPPER_BOUND - Self::CUBIC_LOWER_BOUND) / 5.0;
        let speed = if (Self::CUBIC_LOWER_BOUND..width).contains(&factor) {
            EasingSpeed::VeryFast
        } else if (width..width * 2.0).contains(&factor) {
            EasingSpeed::Fast
        } else if (width * 2.0..width * 3.0).contains(&factor) {
            EasingSpeed::Medium
        } else if (width * 3.0..width * 4.0).contains(&factor) {
            EasingSpeed::Slow
        } else if (width * 4.0..=Self::CUBIC_UPPER_BOUND).contains(&factor) {
            EasingSpeed::VerySlow
        } else {
            EasingSpeed::OutOfRange
        };
        Some(speed)
    }
}

impl Default for Easing {
    fn default() -> Self {
        Self::cubic_default()
    }
}

/// One unit of automated pointer input.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate, PartialEq)]
pub struct Step {
    pub kind: StepKind,

    /// Where the pointer should end up.
    #[serde(default)]
    pub target: Point,

    #[serde(default)]
    #[validate]
    pub easing: Easing,

    /// Wait before acting, counted from the moment this step becomes current.
    /// Serialized as fractional seconds.
    #[serde(default = "default_delay", with = "secs_f64")]
    #[schemars(with = "f64")]
    pub delay: Duration,

    /// Position within the owning list.
    #[serde(default)]
    pub order: usize,
}

fn default_delay() -> Duration {
    Step::DEFAULT_DELAY
}

impl Step {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

    /// A step of `kind` with the default target, easing and delay.
    pub fn new(kind: StepKind) -> Self {
        Self {
            kind,
            target: Point::default(),
            easing: Easing::default(),
            delay: Self::DEFAULT_DELAY,
            order: 0,
        }
    }

    pub fn with_target(mut self, x: f64, y: f64) -> Self {
        self.target = Point::new(x, y);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    /// Set the target to wherever the pointer currently is.
    pub fn capture_pointer_position(&mut self, pointer: &dyn Pointer) {
        self.target = pointer.position();
    }
}

/// Serde adapter storing a `Duration` as fractional seconds.
mod secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|e| D::Error::custom(format!("invalid delay {secs}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_parses_with_defaults() {
        let step: Step = serde_json::from_value(json!({"kind": "primary_click"})).unwrap();
        assert_eq!(step.kind, StepKind::PrimaryClick);
        assert_eq!(step.target, Point::default());
        assert_eq!(step.easing, Easing::Cubic { factor: 300.0 });
        assert_eq!(step.delay, Duration::from_millis(500));
        assert_eq!(step.order, 0);
    }

    #[test]
    fn step_parses_full_form() {
        let step: Step = serde_json::from_value(json!({
            "kind": "drag_end",
            "target": {"x": 10.5, "y": 20.0},
            "easing": {"type": "off"},
            "delay": 1.25,
            "order": 3
        }))
        .unwrap();
        assert_eq!(step.kind, StepKind::DragEnd);
        assert_eq!(step.target, Point::new(10.5, 20.0));
        assert_eq!(step.easing, Easing::Off);
        assert_eq!(step.delay, Duration::from_millis(1250));
        assert_eq!(step.order, 3);
    }

    #[test]
    fn negative_delay_is_rejected() {
        let res = serde_json::from_value::<Step>(json!({"kind": "move", "delay": -1.0}));
        assert!(res.is_err());
    }

    #[test]
    fn easing_factor_bounds_are_validated() {
        let slow = Step::new(StepKind::Move).with_easing(Easing::Cubic { factor: 2500.0 });
        assert!(slow.validate().is_ok());

        let too_fast = Step::new(StepKind::Move).with_easing(Easing::Cubic { factor: 10.0 });
        assert!(too_fast.validate().is_err());

        let too_slow = Step::new(StepKind::Move).with_easing(Easing::Cubic { factor: 2600.0 });
        assert!(too_slow.validate().is_err());

        let off = Step::new(StepKind::Move).with_easing(Easing::Off);
        assert!(off.validate().is_ok());
    }

    #[test]
    fn speed_buckets() {
        let speed = |factor| Easing::Cubic { factor }.speed().unwrap();
        assert_eq!(speed(50.0), EasingSpeed::VeryFast);
        assert_eq!(speed(300.0), EasingSpeed::VeryFast);
        assert_eq!(speed(490.0), EasingSpeed::Fast);
        assert_eq!(speed(1000.0), EasingSpeed::Medium);
        assert_eq!(speed(1500.0), EasingSpeed::Slow);
        assert_eq!(speed(2500.0), EasingSpeed::VerySlow);
        assert_eq!(speed(10.0), EasingSpeed::OutOfRange);
        assert_eq!(Easing::Off.speed(), None);
    }

    #[test]
    fn point_distance_and_lerp() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.lerp(b, 0.5), Point::new(1.5, 2.0));
    }
}
