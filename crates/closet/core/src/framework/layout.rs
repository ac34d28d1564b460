use std::fmt;
use std::str::FromStr;

/// Accepted type-name spellings for one framework capability, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeNames {
    pub qualified: &'static str,
    pub short: &'static str,
}

impl TypeNames {
    pub const fn spellings(&self) -> [&'static str; 2] {
        [self.qualified, self.short]
    }
}

/// Record field names a framework version serializes its capabilities with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldNames {
    pub parameter_list: &'static str,
    pub parameter_name: &'static str,
    pub parameter_key: &'static str,
    pub parameter_saved: &'static str,
    pub parameter_synced: &'static str,
    pub parameter_default: &'static str,
    pub parameter_is_bool: &'static str,

    pub menu_label: &'static str,
    pub menu_parameter: &'static str,
    pub menu_control: &'static str,
    pub menu_value: &'static str,

    pub toggle_objects: &'static str,
    pub toggle_object: &'static str,
    pub toggle_active: &'static str,
    pub toggle_parameter: &'static str,
    pub toggle_saved: &'static str,
    pub toggle_synced: &'static str,

    pub merge_animator: &'static str,
    pub merge_layer: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameworkLayout {
    pub id: LayoutId,
    pub install_hint: &'static str,
    pub parameter_bank: TypeNames,
    pub menu_item: TypeNames,
    pub toggle_action: TypeNames,
    pub animator_merge: TypeNames,
    pub menu_installer: TypeNames,
    pub fields: FieldNames,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutId {
    #[default]
    ModularAvatar,
    ModularAvatarLegacy,
}

impl LayoutId {
    pub const ALL: [Self; 2] = [Self::ModularAvatar, Self::ModularAvatarLegacy];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ModularAvatar => "modular_avatar",
            Self::ModularAvatarLegacy => "modular_avatar_legacy",
        }
    }

    pub const fn layout(self) -> &'static FrameworkLayout {
        match self {
            Self::ModularAvatar => &MODULAR_AVATAR,
            Self::ModularAvatarLegacy => &MODULAR_AVATAR_LEGACY,
        }
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown framework layout '{s}' (expected one of: {})",
                    Self::ALL.map(Self::as_str).join(", ")
                )
            })
    }
}

const INSTALL_HINT: &str =
    "Modular Avatar must be installed. Install it through VCC or from GitHub, then try again.";

pub const MODULAR_AVATAR: FrameworkLayout = FrameworkLayout {
    id: LayoutId::ModularAvatar,
    install_hint: INSTALL_HINT,
    parameter_bank: TypeNames {
        qualified: "nadena.dev.modular_avatar.core.ModularAvatarParameters",
        short: "ModularAvatarParameters",
    },
    menu_item: TypeNames {
        qualified: "nadena.dev.modular_avatar.core.ModularAvatarMenuItem",
        short: "ModularAvatarMenuItem",
    },
    toggle_action: TypeNames {
        qualified: "nadena.dev.modular_avatar.core.ModularAvatarObjectToggle",
        short: "ModularAvatarObjectToggle",
    },
    animator_merge: TypeNames {
        qualified: "nadena.dev.modular_avatar.core.ModularAvatarMergeAnimator",
        short: "ModularAvatarMergeAnimator",
    },
    menu_installer: TypeNames {
        qualified: "nadena.dev.modular_avatar.core.ModularAvatarMenuInstaller",
        short: "ModularAvatarMenuInstaller",
    },
    fields: FieldNames {
        parameter_list: "parameters",
        parameter_name: "nameOrPrefix",
        parameter_key: "internalParameter",
        parameter_saved: "saved",
        parameter_synced: "synced",
        parameter_default: "defaultValue",
        parameter_is_bool: "isBool",
        menu_label: "label",
        menu_parameter: "parameter",
        menu_control: "controlType",
        menu_value: "value",
        toggle_objects: "m_objects",
        toggle_object: "Object",
        toggle_active: "Active",
        toggle_parameter: "parameter",
        toggle_saved: "saved",
        toggle_synced: "synced",
        merge_animator: "animator",
        merge_layer: "layerType",
    },
};

pub const MODULAR_AVATAR_LEGACY: FrameworkLayout = FrameworkLayout {
    id: LayoutId::ModularAvatarLegacy,
    install_hint: INSTALL_HINT,
    parameter_bank: TypeNames {
        qualified: "net.fushizen.modular_avatar.core.ModularAvatarParameters",
        short: "ModularAvatarParameters",
    },
    menu_item: TypeNames {
        qualified: "net.fushizen.modular_avatar.core.ModularAvatarMenuItem",
        short: "ModularAvatarMenuItem",
    },
    toggle_action: TypeNames {
        qualified: "net.fushizen.modular_avatar.core.ModularAvatarObjectToggle",
        short: "ModularAvatarObjectToggle",
    },
    animator_merge: TypeNames {
        qualified: "net.fushizen.modular_avatar.core.ModularAvatarMergeAnimator",
        short: "ModularAvatarMergeAnimator",
    },
    menu_installer: TypeNames {
        qualified: "net.fushizen.modular_avatar.core.ModularAvatarMenuInstaller",
        short: "ModularAvatarMenuInstaller",
    },
    fields: FieldNames {
        parameter_list: "parameterList",
        parameter_name: "name",
        parameter_key: "internalName",
        parameter_saved: "isSaved",
        parameter_synced: "isSynced",
        parameter_default: "value",
        parameter_is_bool: "isBool",
        menu_label: "menuName",
        menu_parameter: "parameterName",
        menu_control: "type",
        menu_value: "value",
        toggle_objects: "targets",
        toggle_object: "target",
        toggle_active: "enabled",
        toggle_parameter: "parameterName",
        toggle_saved: "isSaved",
        toggle_synced: "networkSynced",
        merge_animator: "controller",
        merge_layer: "layer",
    },
};
