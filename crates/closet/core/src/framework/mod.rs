//! Adapter to the downstream integration framework.
//!
//! The framework's capabilities live on scene nodes as foreign [`Record`]s.
//! Each supported framework version is described by a [`FrameworkLayout`]
//! naming its type spellings and record fields; [`LayoutAdapter`] reads and
//! writes records for one layout.

mod layout;

pub use layout::{
    FieldNames, FrameworkLayout, LayoutId, MODULAR_AVATAR, MODULAR_AVATAR_LEGACY, TypeNames,
};

use crate::scene::{CapabilityKind, FieldValue, Fields, NodeId, Record, SceneError, SceneGraph};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameworkCapability {
    ParameterBank,
    MenuItem,
    ToggleAction,
    AnimatorMerge,
    MenuInstaller,
}

impl FrameworkCapability {
    /// Capabilities the generator cannot work without, in check order.
    pub const REQUIRED: [Self; 5] = [
        Self::ParameterBank,
        Self::MenuItem,
        Self::ToggleAction,
        Self::AnimatorMerge,
        Self::MenuInstaller,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::ParameterBank => "parameter bank",
            Self::MenuItem => "menu item",
            Self::ToggleAction => "toggle action",
            Self::AnimatorMerge => "animator merge",
            Self::MenuInstaller => "menu installer",
        }
    }

    pub const fn type_names(self, layout: &FrameworkLayout) -> TypeNames {
        match self {
            Self::ParameterBank => layout.parameter_bank,
            Self::MenuItem => layout.menu_item,
            Self::ToggleAction => layout.toggle_action,
            Self::AnimatorMerge => layout.animator_merge,
            Self::MenuInstaller => layout.menu_installer,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameworkError {
    #[error("{hint} Missing type: {type_name}")]
    MissingType {
        capability: FrameworkCapability,
        type_name: &'static str,
        hint: &'static str,
    },

    #[error("Failed to configure {}: {message}", .capability.label())]
    Configure {
        capability: FrameworkCapability,
        message: String,
    },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub type Result<T> = std::result::Result<T, FrameworkError>;

/// One entry of a parameter bank.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub display_name: String,
    pub key: String,
    pub saved: bool,
    pub synced: bool,
    pub default_value: f32,
    pub is_bool: bool,
}

impl ParameterSpec {
    pub fn int(name: &str, default_value: i32) -> Self {
        Self {
            display_name: name.to_string(),
            key: name.to_string(),
            saved: true,
            synced: true,
            default_value: default_value as f32,
            is_bool: false,
        }
    }

    pub fn bool(name: &str, default_on: bool) -> Self {
        Self {
            display_name: name.to_string(),
            key: name.to_string(),
            saved: true,
            synced: true,
            default_value: if default_on { 1.0 } else { 0.0 },
            is_bool: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MenuControl {
    Submenu,
    Button { value: f32 },
    Toggle,
}

impl MenuControl {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Submenu => "SubMenu",
            Self::Button { .. } => "Button",
            Self::Toggle => "Toggle",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuItemSpec {
    pub display_name: String,
    pub parameter: Option<String>,
    pub control: MenuControl,
}

impl MenuItemSpec {
    pub fn submenu(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            parameter: None,
            control: MenuControl::Submenu,
        }
    }

    pub fn button(display_name: &str, parameter: &str, value: f32) -> Self {
        Self {
            display_name: display_name.to_string(),
            parameter: Some(parameter.to_string()),
            control: MenuControl::Button { value },
        }
    }

    pub fn toggle(display_name: &str, parameter: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            parameter: Some(parameter.to_string()),
            control: MenuControl::Toggle,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleSpec {
    pub target: NodeId,
    pub parameter: String,
    pub saved: bool,
    pub synced: bool,
}

impl ToggleSpec {
    pub fn new(target: NodeId, parameter: &str) -> Self {
        Self {
            target,
            parameter: parameter.to_string(),
            saved: true,
            synced: true,
        }
    }
}

/// Binds a state-machine asset into the avatar's FX layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatorMergeSpec {
    pub state_machine: String,
}

/// Reads and writes framework capability records on scene nodes.
pub trait FrameworkAdapter {
    fn layout(&self) -> &FrameworkLayout;

    /// First registered spelling of `capability`'s type name, if any.
    fn resolve(&self, scene: &dyn SceneGraph, capability: FrameworkCapability)
    -> Option<&'static str>;

    /// Whether `node` carries a record of `capability` under any spelling.
    fn has(
        &self,
        scene: &dyn SceneGraph,
        node: NodeId,
        capability: FrameworkCapability,
    ) -> Result<bool>;

    /// Remove every record of `capability` from `node`.
    fn remove(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        capability: FrameworkCapability,
    ) -> Result<()>;

    fn write_parameter_bank(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        parameters: &[ParameterSpec],
    ) -> Result<()>;

    fn write_menu_item(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        item: &MenuItemSpec,
    ) -> Result<()>;

    fn write_toggle(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        toggle: &ToggleSpec,
    ) -> Result<()>;

    fn write_animator_merge(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        merge: &AnimatorMergeSpec,
    ) -> Result<()>;

    fn write_menu_installer(&self, scene: &mut dyn SceneGraph, node: NodeId) -> Result<()>;

    fn read_parameter_bank(
        &self,
        scene: &dyn SceneGraph,
        node: NodeId,
    ) -> Result<Option<Vec<ParameterSpec>>>;

    fn read_menu_item(&self, scene: &dyn SceneGraph, node: NodeId)
    -> Result<Option<MenuItemSpec>>;

    fn read_toggle(&self, scene: &dyn SceneGraph, node: NodeId) -> Result<Option<ToggleSpec>>;

    /// State-machine asset path referenced by the animator merge on `node`.
    fn read_animator_merge(&self, scene: &dyn SceneGraph, node: NodeId)
    -> Result<Option<String>>;

    /// The first required capability the host cannot resolve.
    fn first_missing(&self, scene: &dyn SceneGraph) -> Option<FrameworkError> {
        FrameworkCapability::REQUIRED
            .into_iter()
            .find(|&capability| self.resolve(scene, capability).is_none())
            .map(|capability| FrameworkError::MissingType {
                capability,
                type_name: capability.type_names(self.layout()).qualified,
                hint: self.layout().install_hint,
            })
    }
}

/// Factory for the adapter of a configured framework layout.
pub fn adapter_for(id: LayoutId) -> Box<dyn FrameworkAdapter> {
    Box::new(LayoutAdapter::new(id))
}

/// [`FrameworkAdapter`] driven entirely by a [`FrameworkLayout`] table.
#[derive(Debug, Clone, Copy)]
pub struct LayoutAdapter {
    layout: &'static FrameworkLayout,
}

impl LayoutAdapter {
    pub const fn new(id: LayoutId) -> Self {
        Self {
            layout: id.layout(),
        }
    }

    fn resolve_or_err(
        &self,
        scene: &dyn SceneGraph,
        capability: FrameworkCapability,
    ) -> Result<&'static str> {
        self.resolve(scene, capability)
            .ok_or_else(|| FrameworkError::MissingType {
                capability,
                type_name: capability.type_names(self.layout).qualified,
                hint: self.layout.install_hint,
            })
    }

    fn find<'s>(
        &self,
        scene: &'s dyn SceneGraph,
        node: NodeId,
        capability: FrameworkCapability,
    ) -> Result<Option<&'s Record>> {
        for spelling in capability.type_names(self.layout).spellings() {
            if let Some(crate::scene::Capability::Foreign(record)) =
                scene.capability(node, CapabilityKind::Foreign(spelling))?
            {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Overwrite the record of `capability` on `node` in its current slot,
    /// or append one. Records under the other spelling are dropped.
    fn replace(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        capability: FrameworkCapability,
        fields: Fields,
    ) -> Result<()> {
        let type_name = self.resolve_or_err(scene, capability)?;
        let mut pending = Some(crate::scene::Capability::Foreign(Record {
            type_name: type_name.to_string(),
            fields,
        }));

        for spelling in capability.type_names(self.layout).spellings() {
            let kind = CapabilityKind::Foreign(spelling);
            if pending.is_none() {
                while scene.detach(node, kind)?.is_some() {}
                continue;
            }
            if let Some(existing) = scene.capability_mut(node, kind)?
                && let Some(record) = pending.take()
            {
                *existing = record;
            }
        }

        if let Some(record) = pending {
            scene.attach(node, record)?;
        }
        Ok(())
    }
}

impl FrameworkAdapter for LayoutAdapter {
    fn layout(&self) -> &FrameworkLayout {
        self.layout
    }

    fn resolve(
        &self,
        scene: &dyn SceneGraph,
        capability: FrameworkCapability,
    ) -> Option<&'static str> {
        capability
            .type_names(self.layout)
            .spellings()
            .into_iter()
            .find(|name| scene.is_type_registered(name))
    }

    fn has(
        &self,
        scene: &dyn SceneGraph,
        node: NodeId,
        capability: FrameworkCapability,
    ) -> Result<bool> {
        Ok(self.find(scene, node, capability)?.is_some())
    }

    fn remove(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        capability: FrameworkCapability,
    ) -> Result<()> {
        for spelling in capability.type_names(self.layout).spellings() {
            while scene
                .detach(node, CapabilityKind::Foreign(spelling))?
                .is_some()
            {}
        }
        Ok(())
    }

    fn write_parameter_bank(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        parameters: &[ParameterSpec],
    ) -> Result<()> {
        let f = &self.layout.fields;
        let entries = parameters
            .iter()
            .map(|p| {
                BTreeMap::from([
                    (f.parameter_name.to_string(), FieldValue::text(&p.display_name)),
                    (f.parameter_key.to_string(), FieldValue::text(&p.key)),
                    (f.parameter_saved.to_string(), FieldValue::Bool(p.saved)),
                    (f.parameter_synced.to_string(), FieldValue::Bool(p.synced)),
                    (
                        f.parameter_default.to_string(),
                        FieldValue::Float(f64::from(p.default_value)),
                    ),
                    (f.parameter_is_bool.to_string(), FieldValue::Bool(p.is_bool)),
                ])
            })
            .collect();
        let fields = BTreeMap::from([(f.parameter_list.to_string(), FieldValue::List(entries))]);
        self.replace(scene, node, FrameworkCapability::ParameterBank, fields)
    }

    fn write_menu_item(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        item: &MenuItemSpec,
    ) -> Result<()> {
        let f = &self.layout.fields;
        if item.display_name.trim().is_empty() {
            return Err(FrameworkError::Configure {
                capability: FrameworkCapability::MenuItem,
                message: "menu display name is empty".into(),
            });
        }
        let mut fields = BTreeMap::from([
            (f.menu_label.to_string(), FieldValue::text(&item.display_name)),
            (f.menu_control.to_string(), FieldValue::text(item.control.as_str())),
        ]);
        if let Some(parameter) = &item.parameter {
            fields.insert(f.menu_parameter.to_string(), FieldValue::text(parameter));
        }
        if let MenuControl::Button { value } = item.control {
            fields.insert(f.menu_value.to_string(), FieldValue::Float(f64::from(value)));
        }
        self.replace(scene, node, FrameworkCapability::MenuItem, fields)
    }

    fn write_toggle(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        toggle: &ToggleSpec,
    ) -> Result<()> {
        let f = &self.layout.fields;
        if !scene.contains(toggle.target) {
            return Err(FrameworkError::Configure {
                capability: FrameworkCapability::ToggleAction,
                message: "target object is missing".into(),
            });
        }
        let object = BTreeMap::from([
            (f.toggle_object.to_string(), FieldValue::Node(Some(toggle.target))),
            (f.toggle_active.to_string(), FieldValue::Bool(true)),
        ]);
        let fields = BTreeMap::from([
            (f.toggle_objects.to_string(), FieldValue::List(vec![object])),
            (f.toggle_parameter.to_string(), FieldValue::text(&toggle.parameter)),
            (f.toggle_saved.to_string(), FieldValue::Bool(toggle.saved)),
            (f.toggle_synced.to_string(), FieldValue::Bool(toggle.synced)),
        ]);
        self.replace(scene, node, FrameworkCapability::ToggleAction, fields)
    }

    fn write_animator_merge(
        &self,
        scene: &mut dyn SceneGraph,
        node: NodeId,
        merge: &AnimatorMergeSpec,
    ) -> Result<()> {
        let f = &self.layout.fields;
        if scene.asset(&merge.state_machine).is_none() {
            return Err(FrameworkError::Configure {
                capability: FrameworkCapability::AnimatorMerge,
                message: format!("state machine '{}' does not exist", merge.state_machine),
            });
        }
        let fields = BTreeMap::from([
            (
                f.merge_animator.to_string(),
                FieldValue::Asset(Some(merge.state_machine.clone())),
            ),
            (f.merge_layer.to_string(), FieldValue::text("FX")),
        ]);
        self.replace(scene, node, FrameworkCapability::AnimatorMerge, fields)
    }

    fn write_menu_installer(&self, scene: &mut dyn SceneGraph, node: NodeId) -> Result<()> {
        self.replace(
            scene,
            node,
            FrameworkCapability::MenuInstaller,
            BTreeMap::new(),
        )
    }

    fn read_parameter_bank(
        &self,
        scene: &dyn SceneGraph,
        node: NodeId,
    ) -> Result<Option<Vec<ParameterSpec>>> {
        let f = &self.layout.fields;
        let Some(record) = self.find(scene, node, FrameworkCapability::ParameterBank)? else {
            return Ok(None);
        };
        let entries = record.list(f.parameter_list).unwrap_or_default();
        let text = |fields: &Fields, name: &str| match fields.get(name) {
            Some(FieldValue::Text(s)) => s.clone(),
            _ => String::new(),
        };
        let flag = |fields: &Fields, name: &str| matches!(fields.get(name), Some(FieldValue::Bool(true)));
        Ok(Some(
            entries
                .iter()
                .map(|entry| ParameterSpec {
                    display_name: text(entry, f.parameter_name),
                    key: text(entry, f.parameter_key),
                    saved: flag(entry, f.parameter_saved),
                    synced: flag(entry, f.parameter_synced),
                    default_value: match entry.get(f.parameter_default) {
                        Some(FieldValue::Float(x)) => *x as f32,
                        Some(FieldValue::Int(i)) => *i as f32,
                        _ => 0.0,
                    },
                    is_bool: flag(entry, f.parameter_is_bool),
                })
                .collect(),
        ))
    }

    fn read_menu_item(
        &self,
        scene: &dyn SceneGraph,
        node: NodeId,
    ) -> Result<Option<MenuItemSpec>> {
        let f = &self.layout.fields;
        let Some(record) = self.find(scene, node, FrameworkCapability::MenuItem)? else {
            return Ok(None);
        };
        let control = match record.text(f.menu_control) {
            Some("Button") => MenuControl::Button {
                value: record.number(f.menu_value).unwrap_or_default() as f32,
            },
            Some("Toggle") => MenuControl::Toggle,
            _ => MenuControl::Submenu,
        };
        Ok(Some(MenuItemSpec {
            display_name: record.text(f.menu_label).unwrap_or_default().to_string(),
            parameter: record.text(f.menu_parameter).map(str::to_string),
            control,
        }))
    }

    fn read_toggle(&self, scene: &dyn SceneGraph, node: NodeId) -> Result<Option<ToggleSpec>> {
        let f = &self.layout.fields;
        let Some(record) = self.find(scene, node, FrameworkCapability::ToggleAction)? else {
            return Ok(None);
        };
        let target = record
            .list(f.toggle_objects)
            .and_then(|objects| objects.first())
            .and_then(|object| match object.get(f.toggle_object) {
                Some(FieldValue::Node(node)) => *node,
                _ => None,
            });
        let Some(target) = target else {
            return Ok(None);
        };
        Ok(Some(ToggleSpec {
            target,
            parameter: record.text(f.toggle_parameter).unwrap_or_default().to_string(),
            saved: record.bool(f.toggle_saved).unwrap_or_default(),
            synced: record.bool(f.toggle_synced).unwrap_or_default(),
        }))
    }

    fn read_animator_merge(
        &self,
        scene: &dyn SceneGraph,
        node: NodeId,
    ) -> Result<Option<String>> {
        let f = &self.layout.fields;
        Ok(self
            .find(scene, node, FrameworkCapability::AnimatorMerge)?
            .and_then(|record| record.asset(f.merge_animator))
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Asset, Scene, StateMachineAsset};

    fn registered_scene(layout: &FrameworkLayout) -> Scene {
        let mut scene = Scene::new();
        for capability in FrameworkCapability::REQUIRED {
            scene.register_type(capability.type_names(layout).short);
        }
        scene
    }

    #[test]
    fn missing_capability_names_the_qualified_type() {
        let mut scene = Scene::new();
        scene.register_type("ModularAvatarParameters");
        let adapter = LayoutAdapter::new(LayoutId::ModularAvatar);

        let Some(FrameworkError::MissingType {
            capability,
            type_name,
            ..
        }) = adapter.first_missing(&scene)
        else {
            panic!("expected a missing type");
        };
        assert_eq!(capability, FrameworkCapability::MenuItem);
        assert_eq!(
            type_name,
            "nadena.dev.modular_avatar.core.ModularAvatarMenuItem"
        );
    }

    #[test]
    fn qualified_spelling_wins_over_short() {
        let mut scene = registered_scene(&MODULAR_AVATAR);
        scene.register_type(MODULAR_AVATAR.menu_item.qualified);
        let adapter = LayoutAdapter::new(LayoutId::ModularAvatar);
        assert_eq!(
            adapter.resolve(&scene, FrameworkCapability::MenuItem),
            Some(MODULAR_AVATAR.menu_item.qualified)
        );
        assert!(adapter.first_missing(&scene).is_none());
    }

    #[test]
    fn parameter_bank_uses_layout_field_names() {
        for id in LayoutId::ALL {
            let adapter = LayoutAdapter::new(id);
            let mut scene = registered_scene(id.layout());
            let avatar = scene.create_root("Avatar").unwrap();
            let params = vec![ParameterSpec::int("ACT_SET", 0), ParameterSpec::bool("HAT", true)];
            adapter.write_parameter_bank(&mut scene, avatar, &params).unwrap();

            let caps = scene.capabilities(avatar).unwrap();
            let crate::scene::Capability::Foreign(record) = &caps[0] else {
                panic!("expected record");
            };
            assert!(record.list(id.layout().fields.parameter_list).is_some());
            assert_eq!(
                adapter.read_parameter_bank(&scene, avatar).unwrap(),
                Some(params)
            );
        }
    }

    #[test]
    fn rewriting_replaces_instead_of_stacking() {
        let adapter = LayoutAdapter::new(LayoutId::ModularAvatar);
        let mut scene = registered_scene(&MODULAR_AVATAR);
        let avatar = scene.create_root("Avatar").unwrap();
        adapter
            .write_menu_item(&mut scene, avatar, &MenuItemSpec::submenu("Closet"))
            .unwrap();
        adapter
            .write_menu_item(&mut scene, avatar, &MenuItemSpec::button("Coat", "ACT_SET", 2.0))
            .unwrap();

        assert_eq!(scene.capabilities(avatar).unwrap().len(), 1);
        assert_eq!(
            adapter.read_menu_item(&scene, avatar).unwrap(),
            Some(MenuItemSpec::button("Coat", "ACT_SET", 2.0))
        );
    }

    #[test]
    fn rewriting_keeps_the_record_in_its_slot() {
        let adapter = LayoutAdapter::new(LayoutId::ModularAvatar);
        let mut scene = registered_scene(&MODULAR_AVATAR);
        let avatar = scene.create_root("Avatar").unwrap();
        adapter
            .write_parameter_bank(&mut scene, avatar, &[ParameterSpec::int("ACT_SET", 0)])
            .unwrap();
        scene
            .attach(
                avatar,
                crate::scene::Capability::ModuleMetadata(crate::scene::ModuleMetadata::default()),
            )
            .unwrap();

        // A newer install registers the qualified spelling; the short record
        // is overwritten where it sits.
        scene.register_type(MODULAR_AVATAR.parameter_bank.qualified);
        adapter
            .write_parameter_bank(&mut scene, avatar, &[ParameterSpec::int("ACT_SET", 1)])
            .unwrap();

        let caps = scene.capabilities(avatar).unwrap();
        assert_eq!(caps.len(), 2);
        let crate::scene::Capability::Foreign(record) = &caps[0] else {
            panic!("expected the bank first");
        };
        assert_eq!(record.type_name, MODULAR_AVATAR.parameter_bank.qualified);
        assert!(caps[1].is(CapabilityKind::ModuleMetadata));
    }

    #[test]
    fn toggle_and_merge_validate_their_references() {
        let adapter = LayoutAdapter::new(LayoutId::ModularAvatar);
        let mut scene = registered_scene(&MODULAR_AVATAR);
        let avatar = scene.create_root("Avatar").unwrap();
        let coat = scene.create_node(avatar, "Coat").unwrap();

        adapter
            .write_toggle(&mut scene, avatar, &ToggleSpec::new(coat, "COAT"))
            .unwrap();
        assert_eq!(
            adapter.read_toggle(&scene, avatar).unwrap(),
            Some(ToggleSpec::new(coat, "COAT"))
        );

        let merge = AnimatorMergeSpec {
            state_machine: "Assets/x.controller".into(),
        };
        assert!(matches!(
            adapter.write_animator_merge(&mut scene, avatar, &merge),
            Err(FrameworkError::Configure { .. })
        ));
        scene.put_asset(
            "Assets/x.controller",
            Asset::StateMachine(StateMachineAsset::default()),
        );
        adapter.write_animator_merge(&mut scene, avatar, &merge).unwrap();
        assert_eq!(
            adapter.read_animator_merge(&scene, avatar).unwrap().as_deref(),
            Some("Assets/x.controller")
        );

        scene.delete_node(coat).unwrap();
        assert!(matches!(
            adapter.write_toggle(&mut scene, avatar, &ToggleSpec::new(coat, "COAT")),
            Err(FrameworkError::Configure { .. })
        ));
    }
}
