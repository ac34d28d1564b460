/// Schema version stamped on every rebuilt module.
pub const MODULE_SCHEMA_VERSION: u32 = 1;

pub const MODULE_MARKER: &str = "avatar-closet-module-v1";

pub const GENERATOR_VERSION: &str = concat!(env!("CARGO_PKG_NAME"), "@", env!("CARGO_PKG_VERSION"));

/// Integer parameter selecting the active outfit in flat mode, and the stem
/// of per-root set parameters in tagged-tree mode.
pub const SET_PARAMETER: &str = "ACT_SET";

/// Names the generator writes into the scene and asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub module_name: String,
    pub store_name: String,
    pub asset_folder: String,
    pub closet_menu_label: String,
    pub parts_menu_label: String,
}

impl Default for GeneratorSettings {
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

/// `ACT_SET` for a blank prefix, else `<prefix>_ACT_SET`.
pub fn set_parameter_for(namespace_prefix: &str) -> String {
    let prefix = namespace_prefix.trim();
    if prefix.is_empty() {
        SET_PARAMETER.to_string()
    } else {
        format!("{prefix}_{SET_PARAMETER}")
    }
}
