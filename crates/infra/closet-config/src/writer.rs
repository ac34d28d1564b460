//! Atomic writes of config files.

use crate::types::ClosetConfig;
use anyhow::{Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile, DisallowOverwrite};
use std::io::Write;
use std::path::Path;

/// Write `config` as pretty JSON, replacing any existing file.
pub fn write_config(path: &Path, config: &ClosetConfig) -> Result<()> {
    let json = render(config)?;
    ensure_parent(path)?;
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(json.as_bytes()))
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Write `config` only when `path` does not exist yet.
pub fn write_config_new(path: &Path, config: &ClosetConfig) -> Result<()> {
    let json = render(config)?;
    ensure_parent(path)?;
    AtomicFile::new(path, DisallowOverwrite)
        .write(|f| f.write_all(json.as_bytes()))
        .with_context(|| format!("Refusing to overwrite config file: {}", path.display()))
}

fn render(config: &ClosetConfig) -> Result<String> {
    let mut json =
        serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")?;
    json.push('\n');
    Ok(json)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
