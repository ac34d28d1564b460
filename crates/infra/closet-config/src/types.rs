//! Configuration types for the closet generator.
//!
//! The root type is [`ClosetConfig`], which contains namespaced sections for
//! generated names, the framework layout, logging and the run journal.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Framework layouts the generator knows how to write.
pub const FRAMEWORK_LAYOUTS: [&str; 2] = ["modular_avatar", "modular_avatar_legacy"];

/// Root configuration loaded from `closet.json` files.
///
/// All fields use `#[serde(default)]` so partial configs work correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClosetConfig {
    /// Optional JSON Schema URL for editor completion.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Names the generator writes into scenes and the asset store.
    pub generator: GeneratorConfig,

    /// Which framework layout to write records for.
    pub framework: FrameworkConfig,

    /// Logging and diagnostics configuration.
    pub logging: LoggingConfig,

    /// Run journal configuration.
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Name of the generated module node under the avatar.
    pub module_name: String,

    /// Name of the node created to hold the registration record.
    pub store_name: String,

    /// Folder for generated state-machine assets.
    pub asset_folder: String,

    /// Label of the top-level submenu in flat mode.
    pub closet_menu_label: String,

    /// Label of the per-set parts submenu.
    pub parts_menu_label: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            module_name: "AvatarClosetModule".into(),
            store_name: "AvatarClosetRegistrationStore".into(),
            asset_folder: "Assets/AvatarClosetGenerated".into(),
            closet_menu_label: "Closet".into(),
            parts_menu_label: "Parts".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FrameworkConfig {
    /// One of `modular_avatar`, `modular_avatar_legacy`.
    pub layout: String,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            layout: FRAMEWORK_LAYOUTS[0].into(),
        }
    }
}

/// Logging and diagnostics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Whether to enable JSON-formatted logs.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct JournalConfig {
    /// Whether pipeline runs are appended to the JSONL journal.
    pub enabled: bool,

    /// Journal directory. Defaults to the platform data dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = ClosetConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"generator\""));
        assert!(json.contains("\"framework\""));
        assert!(json.contains("\"logging\""));
        assert!(json.contains("\"journal\""));
        assert!(!json.contains("\"dir\""));
    }

    #[test]
    fn test_partial_config_deserializes() {
        let json = r#"{"generator": {"module_name": "MyCloset"}}"#;
        let config: ClosetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.generator.module_name, "MyCloset");
        // Other fields get defaults
        assert_eq!(config.generator.store_name, "AvatarClosetRegistrationStore");
        assert_eq!(config.framework.layout, "modular_avatar");
        assert!(config.journal.enabled);
    }

    #[test]
    fn test_schema_field_optional() {
        let json = r#"{"$schema": "file://./closet.schema.json"}"#;
        let config: ClosetConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.schema, Some("file://./closet.schema.json".into()));
    }
}
