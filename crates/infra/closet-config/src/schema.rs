//! JSON Schema for `closet.json`, generated with schemars.

use crate::types::ClosetConfig;
use schemars::{Schema, generate::SchemaSettings};

pub fn schema() -> Schema {
    SchemaSettings::default()
        .into_generator()
        .into_root_schema_for::<ClosetConfig>()
}

pub fn schema_json_pretty() -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&schema())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> jsonschema::Validator {
        jsonschema::validator_for(&serde_json::to_value(schema()).unwrap()).unwrap()
    }

    #[test]
    fn test_schema_names_every_section() {
        let json: serde_json::Value = serde_json::from_str(&schema_json_pretty().unwrap()).unwrap();
        let properties = json.get("properties").unwrap();
        for section in ["generator", "framework", "logging", "journal"] {
            assert!(properties.get(section).is_some(), "missing {section}");
        }
    }

    #[test]
    fn test_default_config_validates_against_schema() {
        let config = serde_json::to_value(ClosetConfig::default()).unwrap();
        let result = validator().validate(&config);
        assert!(result.is_ok(), "{:?}", result.err());
    }

    #[test]
    fn test_partial_config_validates_against_schema() {
        let config = serde_json::json!({
            "framework": { "layout": "modular_avatar_legacy" },
            "journal": { "dir": "/var/log/closet" }
        });
        assert!(validator().validate(&config).is_ok());
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let config = serde_json::json!({ "logging": { "json": "yes" } });
        assert!(validator().validate(&config).is_err());
    }
}
