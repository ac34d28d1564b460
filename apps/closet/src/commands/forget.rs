//! `closet forget`: drop the stored registration record.

use crate::context::{AppContext, save_scene};
use anyhow::{Context, Result};
use clap::Args;
use closet_core::scene;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct ForgetArgs {
    /// Scene document (JSON)
    #[arg(long)]
    pub scene: PathBuf,

    /// Avatar root path inside the scene
    #[arg(long)]
    pub avatar: String,

    /// Report what would be removed without saving
    #[arg(long)]
    pub dry_run: bool,
}

pub fn execute(app: &AppContext, args: &ForgetArgs) -> Result<ExitCode> {
    let mut scene = scene::load_document(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    let avatar = scene
        .find_path(&args.avatar)
        .with_context(|| format!("Avatar '{}' not found in scene", args.avatar))?;

    if !app.pipeline.forget_registration(&mut scene, avatar)? {
        println!("{}", "No registration record found".dimmed());
        return Ok(ExitCode::SUCCESS);
    }

    if args.dry_run {
        println!("{} Registration record would be removed", "OK".green());
    } else {
        save_scene(&scene, &args.scene)?;
        println!("{} Registration record removed", "OK".green());
    }
    Ok(ExitCode::SUCCESS)
}
