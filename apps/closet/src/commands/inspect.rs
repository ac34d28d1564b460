//! `closet inspect`: read-only report of what the generator sees.

use crate::context::{AppContext, SceneArgs};
use anyhow::Result;
use clap::Args;
use closet_core::scene::SceneGraph;
use closet_core::{Scene, generated, inventory};
use colored::Colorize;
use serde_json::{Value, json};
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute(app: &AppContext, args: &InspectArgs) -> Result<ExitCode> {
    let loaded = args.scene.load()?;
    let report = build_report(app, &loaded.scene, loaded.avatar)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(ExitCode::SUCCESS)
}

fn build_report(app: &AppContext, scene: &Scene, avatar: closet_core::NodeId) -> Result<Value> {
    let path = |node| scene.full_path(node).unwrap_or_default();

    let inventory = inventory::collect(scene, avatar)?;
    let roots: Vec<Value> = inventory
        .roots
        .iter()
        .map(|root| {
            json!({
                "name": root.display_name,
                "path": path(root.node),
                "set_parameter": root.set_parameter,
                "sets": root.sets.iter().map(|set| json!({
                    "index": set.set_index,
                    "name": set.display_name,
                    "path": path(set.node),
                    "parameter": set.toggle_parameter(root),
                    "default_on": set.default_on,
                    "parts": set.parts.iter().map(|part| json!({
                        "name": part.display_name,
                        "path": path(part.node),
                        "parameter": part.parameter,
                        "default_on": part.default_on,
                    })).collect::<Vec<_>>(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();

    let settings = app.pipeline.settings();
    let modules = generated::module_candidates(scene, avatar, settings)?
        .into_iter()
        .map(|module| -> Result<Value> {
            let metadata = generated::read_metadata(scene, module)?.map(|meta| {
                json!({
                    "schema_version": meta.schema_version,
                    "generated_item_count": meta.generated_item_count,
                    "generator_version": meta.generator_version,
                    "marker_id": meta.marker_id,
                })
            });
            let wired =
                generated::has_expected_wiring(scene, app.pipeline.adapter(), module).ok();
            Ok(json!({
                "path": path(module),
                "metadata": metadata,
                "wired": wired,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let store = match generated::find_store(scene, avatar)? {
        Some(holder) => generated::read_store(scene, holder)?.map(|store| {
            json!({
                "path": path(holder),
                "healthy": generated::store_is_healthy(scene, store),
                "entries": store.entries.iter().map(|entry| json!({
                    "name": entry.display_name,
                    "target": entry.target.map(path),
                    "group": entry.group_name,
                    "parameter_key": entry.parameter_key,
                    "binding_fingerprint": entry.binding_fingerprint,
                })).collect::<Vec<_>>(),
            })
        }),
        None => None,
    };

    Ok(json!({
        "avatar": path(avatar),
        "framework": app.pipeline.adapter().layout().id.as_str(),
        "menu_roots": roots,
        "modules": modules,
        "registration": store,
    }))
}

fn print_report(report: &Value) {
    let text = |v: &Value| v.as_str().unwrap_or_default().to_string();

    println!("{} {}", "Avatar:".bold(), text(&report["avatar"]));
    println!("{} {}", "Framework:".bold(), text(&report["framework"]));

    let roots = report["menu_roots"].as_array().cloned().unwrap_or_default();
    println!("\n{} ({})", "Menu roots".bold(), roots.len());
    for root in &roots {
        println!("  {} [{}]", text(&root["name"]).cyan(), text(&root["set_parameter"]));
        for set in root["sets"].as_array().into_iter().flatten() {
            println!(
                "    #{} {} -> {}",
                set["index"],
                text(&set["name"]),
                text(&set["parameter"])
            );
            for part in set["parts"].as_array().into_iter().flatten() {
                println!("      - {} -> {}", text(&part["name"]), text(&part["parameter"]));
            }
        }
    }

    let modules = report["modules"].as_array().cloned().unwrap_or_default();
    println!("\n{} ({})", "Generated modules".bold(), modules.len());
    for module in &modules {
        let marker = module["metadata"]["marker_id"]
            .as_str()
            .map_or_else(|| "no metadata".red().to_string(), str::to_string);
        let wired = if module["wired"].as_bool() == Some(true) {
            "wired".green()
        } else {
            "drifted".yellow()
        };
        println!("  {} ({marker}, {wired})", text(&module["path"]));
    }

    println!("\n{}", "Registration record".bold());
    match report["registration"].as_object() {
        None => println!("  {}", "none".dimmed()),
        Some(store) => {
            let health = if store["healthy"].as_bool() == Some(true) {
                "healthy".green()
            } else {
                "unhealthy".red()
            };
            println!("  {} ({health})", text(&store["path"]));
            for entry in store["entries"].as_array().into_iter().flatten() {
                println!(
                    "    {} -> {} [{}]",
                    text(&entry["name"]),
                    text(&entry["target"]),
                    text(&entry["parameter_key"])
                );
            }
        }
    }
}
