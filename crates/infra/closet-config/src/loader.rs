//! Two-layer configuration loading with env overrides.
//!
//! 1. Read the global `closet.json` under the platform config dir
//! 2. Read the local `./closet.json`
//! 3. Merge the JSON values (RFC 7396)
//! 4. Deserialize once into [`ClosetConfig`]
//! 5. Apply env var overrides
//! 6. Run advisory validation

use crate::merge::merge_layers;
use crate::types::ClosetConfig;
use crate::validation::AdvisoryWarning;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const LOCAL_FILE: &str = "closet.json";

/// Directory name under `config_dir` for the global config.
pub const GLOBAL_DIR: &str = "avatar-closet";

pub const GLOBAL_FILE: &str = "closet.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosetConfigPaths {
    pub local: PathBuf,
    pub global: PathBuf,
}

#[derive(Debug)]
pub struct LoadedClosetConfig {
    pub config: ClosetConfig,
    pub warnings: Vec<AdvisoryWarning>,
    pub paths: ClosetConfigPaths,
}

pub fn global_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config dir")?;
    Ok(base.join(GLOBAL_DIR).join(GLOBAL_FILE))
}

pub fn local_config_path(local_dir: &Path) -> PathBuf {
    local_dir.join(LOCAL_FILE)
}

/// Load the global and local config for `local_dir`.
pub fn load_merged(local_dir: &Path) -> Result<LoadedClosetConfig> {
    load_from_paths(ClosetConfigPaths {
        local: local_config_path(local_dir),
        global: global_config_path()?,
    })
}

/// Load from explicit file locations. Missing files count as empty layers.
pub fn load_from_paths(paths: ClosetConfigPaths) -> Result<LoadedClosetConfig> {
    let merged = merge_layers([
        read_json_object_or_empty(&paths.global)?,
        read_json_object_or_empty(&paths.local)?,
    ]);

    let mut config: ClosetConfig =
        serde_json::from_value(merged).context("Failed to deserialize merged closet config")?;
    apply_env_overrides(&mut config);

    let warnings = crate::validation::validate(&config);
    for warning in &warnings {
        tracing::debug!(%warning, "Config advisory");
    }

    Ok(LoadedClosetConfig {
        config,
        warnings,
        paths,
    })
}

fn apply_env_overrides(config: &mut ClosetConfig) {
    if let Some(v) = env_trimmed("CLOSET_FRAMEWORK") {
        config.framework.layout = v;
    }
    if let Some(v) = env_trimmed("CLOSET_LOG_LEVEL") {
        config.logging.level = v;
    }
    if let Some(v) = env_trimmed("CLOSET_LOG_JSON") {
        config.logging.json = is_truthy(&v);
    }
    if let Some(v) = env_trimmed("CLOSET_JOURNAL_DIR") {
        config.journal.dir = Some(v);
    }
    if env_trimmed("CLOSET_JOURNAL_DISABLED").is_some_and(|v| is_truthy(&v)) {
        config.journal.enabled = false;
    }
}

fn is_truthy(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// Trimmed env var, `None` when unset or blank.
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn read_json_object_or_empty(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let value: Value = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    match value {
        Value::Object(_) => Ok(value),
        _ => anyhow::bail!("Config root must be a JSON object: {}", path.display()),
    }
}
