use clap::Parser;
use std::path::PathBuf;
use vre_runner::app::{launch, LaunchPaths};
use vre_runner::config::{AdapterKind, ToolSettings};
use vre_runner::shared::logging::{init_logging, LogOptions};

/// Runs one VRE job through an external tool adapter.
#[derive(Debug, Parser)]
#[command(name = "vre-runner")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Job descriptor (input roles, arguments, output declarations)
    #[arg(long)]
    config: PathBuf,

    /// Catalog of the input files' metadata
    #[arg(long = "in_metadata")]
    in_metadata: PathBuf,

    /// Where to write the job result descriptor
    #[arg(long = "out_metadata")]
    out_metadata: PathBuf,

    /// Adapter settings (YAML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long = "log_file")]
    log_file: Option<PathBuf>,

    /// Adapter to run; overrides the settings file
    #[arg(long, value_parser = AdapterKind::parse)]
    adapter: Option<AdapterKind>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn run() -> Result<(), String> {
    let cli = Cli::parse();
    init_logging(&LogOptions {
        verbose: cli.verbose,
        log_file: cli.log_file.clone(),
    })
    .map_err(|err| format!("failed to initialise logging: {err}"))?;

    let mut settings = match &cli.settings {
        Some(path) => ToolSettings::from_path(path).map_err(|err| err.to_string())?,
        None => ToolSettings::default(),
    };
    if let Some(adapter) = cli.adapter {
        settings.adapter = adapter;
        settings.validate().map_err(|err| err.to_string())?;
    }

    let base_dir = std::env::current_dir()
        .map_err(|err| format!("failed to read current directory: {err}"))?;
    let outcome = launch(
        &LaunchPaths {
            config: cli.config,
            in_metadata: cli.in_metadata,
            out_metadata: cli.out_metadata,
            base_dir,
        },
        settings,
    );
    match outcome.failure_message() {
        Some(message) => Err(message),
        None => Ok(()),
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
