//! `closet validate` and `closet run`.

use crate::context::{AppContext, SceneArgs};
use crate::output::{self, JournalEntry};
use anyhow::Result;
use clap::Args;
use closet_core::pipeline::summary_line;
use closet_core::{PipelineResult, PipelineStatus};
use closet_journal::RunTimer;
use colored::Colorize;
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub common: PipelineArgs,

    /// Run the pipeline without saving the scene
    #[arg(long)]
    pub dry_run: bool,
}

pub fn validate(app: &AppContext, args: &PipelineArgs) -> Result<ExitCode> {
    let timer = RunTimer::start();
    let loaded = args.scene.load()?;
    let validation = app.pipeline.validate(&loaded.scene, &loaded.request);

    let status = if validation.has_error {
        "Validation failed"
    } else if validation.needs_repair {
        "Validation passed; repair needed"
    } else {
        "Validation passed"
    };
    let result = PipelineResult {
        has_error: validation.has_error,
        applied: false,
        repaired: false,
        final_status: PipelineStatus::Done,
        summary: summary_line(status, &validation.messages),
        messages: validation.messages,
    };

    report(app, args, &timer, &result, "validate", false)
}

pub fn run(app: &AppContext, args: &RunArgs) -> Result<ExitCode> {
    let timer = RunTimer::start();
    let common = &args.common;
    let mut loaded = common.scene.load()?;

    let quiet = common.json;
    let result = app
        .pipeline
        .run(&mut loaded.scene, &loaded.request, |status| {
            if !quiet && status != PipelineStatus::Done {
                eprintln!("{}", status.to_string().dimmed());
            }
        });

    if result.applied || result.repaired {
        if args.dry_run {
            tracing::info!("Dry run; scene not saved");
        } else {
            common.scene.save(&loaded.scene)?;
            tracing::info!(scene = %common.scene.scene.display(), "Saved scene");
        }
    }

    report(app, common, &timer, &result, "run", args.dry_run)
}

fn report(
    app: &AppContext,
    args: &PipelineArgs,
    timer: &RunTimer,
    result: &PipelineResult,
    command: &str,
    dry_run: bool,
) -> Result<ExitCode> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        output::print_messages(&result.messages);
        output::print_summary(result);
    }

    let scene = args.scene.scene.display().to_string();
    let entry = JournalEntry {
        command,
        scene: &scene,
        avatar: &args.scene.avatar,
        dry_run,
    };
    match app.journal.append(&entry.record(timer, result)) {
        Ok(Some(path)) => tracing::debug!(path = %path.display(), "Journal updated"),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Failed to append run journal"),
    }

    Ok(if result.has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
