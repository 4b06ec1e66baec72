use std::path::PathBuf;

use billing_showcase_core::{
    AppConfig, Catalog, RotationSignal, SchedulerHandle, SharedStage, Stage, TierRotator, Viewport,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

fn main() -> billing_showcase_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            width,
            duration_ms,
            catalog,
            config,
        } => run_simulate(width, duration_ms, catalog.as_ref(), config.as_ref()),
        Commands::Validate { catalog } => run_validate(catalog.as_ref()),
    }
}

fn load_catalog(path: Option<&PathBuf>) -> billing_showcase_core::Result<Catalog> {
    match path {
        Some(path) => Catalog::from_path(path),
        None => Ok(Catalog::billing_demo()),
    }
}

fn run_simulate(
    width: u32,
    duration_ms: u64,
    catalog: Option<&PathBuf>,
    config: Option<&PathBuf>,
) -> billing_showcase_core::Result<()> {
    let config = match config {
        Some(path) => AppConfig::from_path(path)?,
        None => AppConfig::default(),
    };
    let (tiers, table) = load_catalog(catalog)?.into_parts()?;
    let viewport = Viewport::new(width, &config.viewport);
    tracing::info!(width, duration_ms, "starting simulation");

    let scheduler: SchedulerHandle<RotationSignal> = SchedulerHandle::new();
    let stage = SharedStage::new(Stage::default());
    let mut rotator = TierRotator::builder(scheduler.clone(), stage.clone(), stage.clone())
        .table(table)
        .timing(config.rotation.clone())
        .pointer(config.pointer.clone())
        .start_with(tiers, viewport)?;

    println!("{:>8}  {}", 0, stage.describe());
    let mut last_commits = rotator.commits();
    scheduler.run_until(duration_ms, |event| {
        rotator.dispatch(event.event);
        if rotator.commits() != last_commits {
            last_commits = rotator.commits();
            println!("{:>8}  {}", event.due_ms, stage.describe());
        }
    });

    rotator.stop()?;
    tracing::info!(
        commits = rotator.commits(),
        mode = rotator.current_name(),
        "simulation finished"
    );
    Ok(())
}

fn run_validate(catalog: Option<&PathBuf>) -> billing_showcase_core::Result<()> {
    let catalog = load_catalog(catalog)?;
    catalog.validate()?;

    for configuration in catalog.configurations.iter() {
        let names: Vec<&str> = configuration
            .project(&catalog.tiers)
            .into_iter()
            .map(|tier| tier.name.as_str())
            .collect();
        println!(
            "{:<14} {:<14} {}",
            configuration.name,
            configuration.layout,
            names.join(", ")
        );
    }
    tracing::info!(
        tiers = catalog.tiers.len(),
        configurations = catalog.configurations.len(),
        "catalog is valid"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Billing page pricing-card rotation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mount the pricing card and run its rotation on a virtual timeline.
    Simulate {
        /// Viewport width in pixels.
        #[arg(short, long, default_value_t = 1280)]
        width: u32,
        /// How much timeline to run, in milliseconds.
        #[arg(short, long, default_value_t = 30_000)]
        duration_ms: u64,
        /// Catalog JSON with tiers and configurations.
        #[arg(long)]
        catalog: Option<PathBuf>,
        /// Application config JSON.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Check a catalog and list what each configuration shows.
    Validate {
        /// Catalog JSON; the built-in billing catalog when omitted.
        catalog: Option<PathBuf>,
    },
}
