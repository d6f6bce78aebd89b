//! Configuration module for automotion.
//!
//! Data models (steps, easing, workflows), the dense-order step list, and
//! loading/validation helpers.
//!
//! Example:
//! use automotion::config::{Config, load_from_path};
//!
//! let cfg = load_from_path("config/default.json")?;

pub mod loader;
pub mod models;
pub mod step_list;

pub use models::{
    Config, Easing, EasingSpeed, EngineSettings, Point, Step, StepKind, Workflow, Workflows,
};
pub use step_list::{StepList, StepListError};

pub use loader::{
    generate_schema, load_from_path, load_from_path_async, load_from_reader, load_from_str,
    validate_config, write_schema_to_writer,
};
