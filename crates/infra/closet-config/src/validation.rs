//! Advisory validation for [`ClosetConfig`].
//!
//! Warnings never stop the config from being used; the CLI prints them and
//! carries on.

use crate::types::{ClosetConfig, FRAMEWORK_LAYOUTS};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisoryWarning {
    /// Machine-readable warning code.
    pub code: &'static str,

    pub message: String,

    /// JSON path to the offending field.
    pub path: &'static str,
}

impl fmt::Display for AdvisoryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.path, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

pub fn validate(cfg: &ClosetConfig) -> Vec<AdvisoryWarning> {
    let mut warnings = vec![];
    let generator = &cfg.generator;

    for (value, path, code) in [
        (
            &generator.module_name,
            "generator.module_name",
            "generator.module_name.empty",
        ),
        (
            &generator.store_name,
            "generator.store_name",
            "generator.store_name.empty",
        ),
        (
            &generator.closet_menu_label,
            "generator.closet_menu_label",
            "generator.closet_menu_label.empty",
        ),
        (
            &generator.parts_menu_label,
            "generator.parts_menu_label",
            "generator.parts_menu_label.empty",
        ),
    ] {
        if value.trim().is_empty() {
            warnings.push(AdvisoryWarning {
                code,
                path,
                message: "Value cannot be empty".into(),
            });
        }
    }

    if !generator.module_name.trim().is_empty() && generator.module_name == generator.store_name {
        warnings.push(AdvisoryWarning {
            code: "generator.names.duplicate",
            path: "generator",
            message: format!(
                "module_name and store_name are the same: '{}'",
                generator.module_name
            ),
        });
    }

    let folder = generator.asset_folder.trim_end_matches('/');
    if folder != "Assets" && !folder.starts_with("Assets/") {
        warnings.push(AdvisoryWarning {
            code: "generator.asset_folder.outside_assets",
            path: "generator.asset_folder",
            message: format!(
                "Generated assets should live under 'Assets/', got: '{}'",
                generator.asset_folder
            ),
        });
    }

    let layout = cfg.framework.layout.trim();
    if !FRAMEWORK_LAYOUTS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(layout))
    {
        warnings.push(AdvisoryWarning {
            code: "framework.layout.unknown",
            path: "framework.layout",
            message: format!(
                "Unknown framework layout '{}'. Expected one of: {}",
                cfg.framework.layout,
                FRAMEWORK_LAYOUTS.join(", ")
            ),
        });
    }

    if !LOG_LEVELS.contains(&cfg.logging.level.to_lowercase().as_str()) {
        warnings.push(AdvisoryWarning {
            code: "logging.level.invalid",
            path: "logging.level",
            message: format!(
                "Unknown log level '{}'. Expected one of: {}",
                cfg.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if cfg
        .journal
        .dir
        .as_deref()
        .is_some_and(|dir| dir.trim().is_empty())
    {
        warnings.push(AdvisoryWarning {
            code: "journal.dir.empty",
            path: "journal.dir",
            message: "Journal dir is set but blank; the default location is used".into(),
        });
    }

    warnings
}
