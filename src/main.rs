use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use automotion::config::{self as cfg, Config, Workflow};
use automotion::executor::{DryRunPointer, EnigoPointer, Pointer, RunController, StepExecutor};
use automotion::signals::{self, Shortcut, ShortcutEvent};
use automotion::utils::UniformJitter;

/// automotion CLI
#[derive(Debug, Parser)]
#[command(
    name = automotion::PKG_NAME,
    version = automotion::PKG_VERSION,
    about = "Run timed pointer workflows with eased, cancellable movement"
)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short = 'c', long = "config", default_value = "config/default.json")]
    config: PathBuf,

    /// Workflow to run (optional when the config holds exactly one)
    #[arg(short = 'w', long = "workflow")]
    workflow: Option<String>,

    /// Enable dry-run mode (log pointer events instead of injecting them)
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the configuration and exit
    #[arg(long = "print-schema")]
    print_schema: bool,

    /// List the configured workflows and exit
    #[arg(long = "list")]
    list: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    automotion::init_tracing(args.log_level.as_deref());

    if args.print_schema {
        let schema = cfg::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    info!(
        version = automotion::PKG_VERSION,
        config = %args.config.display(),
        dry_run = args.dry_run,
        "Starting automotion"
    );

    let config = cfg::load_from_path_async(&args.config).await?;
    debug!(target: "automotion", "Configuration loaded successfully");

    if args.list {
        print_workflows(&config);
        return Ok(());
    }

    let (name, workflow) = select_workflow(&config, args.workflow.as_deref())?;

    let pointer: Arc<dyn Pointer> = if args.dry_run {
        Arc::new(DryRunPointer::new())
    } else {
        Arc::new(EnigoPointer::spawn().context("Failed to start the input backend")?)
    };
    let jitter = UniformJitter::new(config.settings.jitter_min_us, config.settings.jitter_max_us);
    let mut controller = RunController::new(StepExecutor::new(pointer.clone(), Arc::new(jitter)));

    // Shortcut events fan out to the stop bridge and the capture handler.
    let (tx, _) = broadcast::channel::<ShortcutEvent>(64);
    let sources = signals::build_sources(&config.settings);
    if sources.is_empty() {
        warn!("No signal sources configured. The run can only end by completing.");
    }
    controller.listen(tx.subscribe());
    let capture = tokio::spawn(log_captured_positions(tx.subscribe(), pointer));
    let _handles = signals::spawn_all_sources(&sources, &tx);

    info!(workflow = %name, title = %workflow.title, steps = workflow.steps.len(), "Running workflow");
    controller.run(&workflow.steps);
    controller.wait_idle().await;

    capture.abort();
    info!("automotion exited");
    Ok(())
}

fn select_workflow<'a>(
    config: &'a Config,
    requested: Option<&'a str>,
) -> anyhow::Result<(&'a str, &'a Workflow)> {
    match requested {
        Some(name) => config
            .workflows
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .with_context(|| format!("Unknown workflow '{name}'")),
        None => {
            let mut all = config.workflows.iter();
            match (all.next(), all.next()) {
                (Some((k, v)), None) => Ok((k.as_str(), v)),
                (None, _) => bail!("The configuration defines no workflows"),
                _ => bail!("Several workflows are configured; pick one with --workflow"),
            }
        }
    }
}

fn print_workflows(config: &Config) {
    for (name, workflow) in &config.workflows {
        println!("{name}: {} ({} steps)", workflow.title, workflow.steps.len());
        for step in &workflow.steps {
            let speed = step
                .easing
                .speed()
                .map_or_else(|| "direct".to_string(), |s| s.to_string());
            println!(
                "  #{} {} -> {} after {:.2}s, {}",
                step.order,
                step.kind,
                step.target,
                step.delay.as_secs_f64(),
                speed
            );
        }
    }
}

/// Log the pointer position whenever the capture shortcut is released, so it
/// can be pasted into a step's `target`.
async fn log_captured_positions(
    mut signals: broadcast::Receiver<ShortcutEvent>,
    pointer: Arc<dyn Pointer>,
) {
    loop {
        match signals.recv().await {
            Ok(event) if event.is_release_of(Shortcut::CapturePosition) => {
                let pointer = pointer.clone();
                match tokio::task::spawn_blocking(move || pointer.position()).await {
                    Ok(at) => info!(x = at.x, y = at.y, "Captured pointer position"),
                    Err(e) => warn!(error = %e, "Position capture failed"),
                }
            }
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
