use anyhow::{Context, Result, bail};
use schemars::{Schema, schema_for};
use serde_valid::Validate;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use super::models::{Config, Workflow};

/// Load configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config =
        serde_json::from_str(s).context("Failed to parse JSON config string into Config")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<Config> {
    let cfg: Config =
        serde_json::from_reader(reader).context("Failed to parse JSON config from reader")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open config file {}", path_ref.display()))?;
    let cfg = load_from_reader(file)?;
    debug!(target: "automotion::config", "Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Load configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Config> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let cfg: Config = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    validate_config(&cfg)?;
    debug!(target: "automotion::config", "Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Generate the JSON Schema for the Config model.
pub fn generate_schema() -> Schema {
    schema_for!(Config)
}

/// Write the JSON Schema for the Config model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Sanity checks that serde alone cannot express:
/// - jitter bounds are ordered
/// - every workflow passes field validation (easing factor bounds)
/// - every workflow's `order` values are exactly `0..len`
pub fn validate_config(cfg: &Config) -> Result<()> {
    let settings = &cfg.settings;
    if settings.jitter_min_us > settings.jitter_max_us {
        bail!(
            "jitter_min_us ({}) must not exceed jitter_max_us ({})",
            settings.jitter_min_us,
            settings.jitter_max_us
        );
    }

    for (name, workflow) in &cfg.workflows {
        workflow
            .validate()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid step in workflow '{name}'"))?;
        validate_order(workflow).with_context(|| format!("Invalid order in workflow '{name}'"))?;
    }

    Ok(())
}

fn validate_order(workflow: &Workflow) -> Result<()> {
    let mut seen = vec![false; workflow.steps.len()];
    for (idx, step) in workflow.steps.iter().enumerate() {
        match seen.get_mut(step.order) {
            Some(slot) if !*slot => *slot = true,
            Some(_) => bail!("step {idx} repeats order {}", step.order),
            None => bail!(
                "step {idx} has order {} but the workflow only has {} steps",
                step.order,
                workflow.steps.len()
            ),
        }
    }
    Ok(())
}
