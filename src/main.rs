//! layerstack - CLI host for the layer stack manager
//!
//! Validates configuration, lists layers and drives a layout from a script.

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use layerstack::config::Config;
use layerstack::core::{InputSuspension, LoggingInputSink};
use layerstack::script::{parse_script, ScriptRunner};
use layerstack::{LayoutController, LayoutServices, UiSubsystem};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "layerstack")]
#[command(about = "Layered widget stack manager for game UIs", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Custom data directory (default: ~/.layerstack)
    /// Can also be set via LAYERSTACK_DIR environment variable
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Session name for log lines
    #[arg(long, default_value = "local")]
    session: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate configuration (layers, widget classes, theme)
    Validate,
    /// List the configured layers, bottom to top
    Layers,
    /// Run a layout script
    Run {
        /// Script file
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Print a JSON snapshot of the layout when the script ends
        #[arg(long)]
        snapshot: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set custom data directory if specified (via CLI or environment variable)
    if let Some(data_dir) = &cli.data_dir {
        std::env::set_var("LAYERSTACK_DIR", data_dir);
    }

    let config = Config::load(cli.config.as_deref())?;
    let log_file = config.log_file_path()?;
    layerstack::logging::init(&config.logging, log_file.as_deref())?;

    match &config.source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using embedded default config"),
    }

    match cli.command {
        Commands::Validate => validate(&config),
        Commands::Layers => {
            list_layers(&config);
            Ok(())
        }
        Commands::Run { script, snapshot } => {
            // Use tokio runtime for async class loads
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(run_script(config, cli.session, script, snapshot))
        }
    }
}

fn validate(config: &Config) -> Result<()> {
    match &config.source {
        Some(path) => println!("Validating config file: {:?}", path),
        None => println!("Validating embedded default config"),
    }
    println!(
        "  {} layers, {} widget classes, theme '{}'",
        config.layers.len(),
        config.widgets.classes.len(),
        config.theme.name
    );

    let result = config.validate();
    for error in result.errors() {
        eprintln!("✗ Error: {}", error.message());
    }
    for warning in result.warnings() {
        println!("⚠ Warning: {}", warning.message());
    }

    if result.issues.is_empty() {
        println!("✓ Config is valid with no issues");
    } else {
        if result.has_errors() {
            eprintln!("\n✗ Found {} error(s)", result.errors().len());
        }
        if result.has_warnings() {
            println!("⚠ Found {} warning(s)", result.warnings().len());
        }
    }

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn list_layers(config: &Config) {
    for (index, layer) in config.layers.iter().enumerate().rev() {
        println!(
            "{:>2}  {:<24} {}",
            index,
            layer.id.as_str(),
            if layer.policy.modal {
                "modal"
            } else {
                "passthrough"
            }
        );
    }
}

async fn run_script(
    config: Config,
    session: String,
    script_path: PathBuf,
    snapshot: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(&script_path)
        .context(format!("Failed to read script: {:?}", script_path))?;
    let script = parse_script(&text).context(format!("Invalid script: {:?}", script_path))?;

    let validation = config.validate();
    for error in validation.errors() {
        tracing::error!("Config error: {}", error.message());
    }

    let mut subsystem = UiSubsystem::new(session, InputSuspension::new(LoggingInputSink));
    let catalog = config.catalog();
    let services = LayoutServices::new(
        Box::new(catalog.clone()),
        Box::new(catalog),
        subsystem.input_suspension().clone(),
    )
    .with_theme(config.theme());
    let layout = LayoutController::with_layers(config.layers.clone(), services)
        .context("Failed to initialize layout")?;
    subsystem.register_primary_game_layout(layout);

    let layout = subsystem
        .get_primary_game_layout_mut()
        .context("Primary game layout missing after registration")?;
    let stdout = std::io::stdout();
    let summary = ScriptRunner::new(layout, stdout.lock()).run(&script).await?;

    if snapshot {
        let json = serde_json::to_string_pretty(&layout.snapshot())
            .context("Failed to serialize layout snapshot")?;
        println!("{}", json);
    }

    subsystem.shutdown();
    println!(
        "{} command(s), {} rejected, {} failed load(s)",
        summary.commands, summary.failures, summary.failed_loads
    );
    Ok(())
}
