//! Configuration management commands for `closet.json`.

use anyhow::Result;
use clap::Subcommand;
use closet_config::ClosetConfig;
use closet_config::loader::{global_config_path, load_merged, local_config_path};
use closet_config::writer::{write_config, write_config_new};
use colored::Colorize;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Create the global config instead of the local one
        #[arg(long)]
        global: bool,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the merged configuration
    Show {
        /// Output compact JSON
        #[arg(long)]
        json: bool,
    },

    /// Output the JSON Schema for closet.json
    Schema,

    /// Validate configuration and show warnings
    Validate,
}

pub fn execute(cmd: ConfigCommands, config_dir: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Init { global, force } => cmd_init(config_dir, global, force),
        ConfigCommands::Show { json } => cmd_show(config_dir, json),
        ConfigCommands::Schema => {
            println!("{}", closet_config::schema_json_pretty()?);
            Ok(())
        }
        ConfigCommands::Validate => cmd_validate(config_dir),
    }
}

fn cmd_init(config_dir: &Path, global: bool, force: bool) -> Result<()> {
    let path = if global {
        global_config_path()?
    } else {
        local_config_path(config_dir)
    };

    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}\nUse --force to overwrite",
            path.display()
        );
    }

    let config = ClosetConfig::default();
    if force {
        write_config(&path, &config)?;
    } else {
        write_config_new(&path, &config)?;
    }

    println!(
        "{} Created {}",
        "OK".green(),
        path.display().to_string().cyan()
    );
    Ok(())
}

fn cmd_show(config_dir: &Path, json: bool) -> Result<()> {
    let loaded = load_merged(config_dir)?;
    for warning in &loaded.warnings {
        eprintln!("{} {warning}", "WARN".yellow());
    }

    if json {
        println!("{}", serde_json::to_string(&loaded.config)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&loaded.config)?);
    }
    Ok(())
}

fn cmd_validate(config_dir: &Path) -> Result<()> {
    let loaded = load_merged(config_dir)?;

    if loaded.warnings.is_empty() {
        println!("{} Configuration is valid", "OK".green());
    } else {
        println!(
            "{} Configuration has {} warning(s):",
            "WARN".yellow(),
            loaded.warnings.len()
        );
        for warning in &loaded.warnings {
            println!("  - {warning}");
        }
    }

    println!("\nConfig files:");
    println!("  Global: {}", loaded.paths.global.display());
    println!("  Local:  {}", loaded.paths.local.display());
    Ok(())
}
