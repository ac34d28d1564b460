//! Avatar closet CLI.
//!
//! Runs the closet pipeline over a scene document and manages `closet.json`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod context;
mod output;

#[derive(Parser)]
#[command(name = "closet")]
#[command(about = "Generate and maintain avatar closet menus")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the local closet.json (defaults to current dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the closet inventory and generated module without changing anything
    Validate(commands::pipeline::PipelineArgs),

    /// Validate, repair and apply, then save the scene
    Run(commands::pipeline::RunArgs),

    /// Show the collected inventory, module metadata and registration record
    Inspect(commands::inspect::InspectArgs),

    /// Delete the stored registration record so the next run takes the caller's list
    Forget(commands::forget::ForgetArgs),

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

fn init_tracing(verbose: u8, config: &closet_config::LoggingConfig) {
    let level = match verbose {
        0 => config.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let fmt = if config.json {
        fmt.json().boxed()
    } else {
        fmt.with_target(false).boxed()
    };
    tracing_subscriber::registry().with(filter).with(fmt).init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    if let Commands::Config { command } = cli.command {
        return commands::config::execute(command, &config_dir).map(|()| ExitCode::SUCCESS);
    }

    let loaded = closet_config::load_merged(&config_dir)?;
    init_tracing(cli.verbose, &loaded.config.logging);
    for warning in &loaded.warnings {
        tracing::warn!(%warning, "Configuration warning");
    }
    let app = context::AppContext::from_config(&loaded.config)?;

    match cli.command {
        Commands::Validate(args) => commands::pipeline::validate(&app, &args),
        Commands::Run(args) => commands::pipeline::run(&app, &args),
        Commands::Inspect(args) => commands::inspect::execute(&app, &args),
        Commands::Forget(args) => commands::forget::execute(&app, &args),
        Commands::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}
