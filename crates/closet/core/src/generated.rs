//! Lookups and writes for the generated module and its registration record.

use crate::framework::{self, FrameworkAdapter, FrameworkCapability};
use crate::inventory::OutfitEntry;
use crate::keys;
use crate::scene::{
    Asset, Capability, CapabilityKind, ModuleMetadata, NodeId, RegistrationEntry,
    RegistrationStore, Result, SceneGraph,
};
use crate::settings::{GENERATOR_VERSION, GeneratorSettings, MODULE_MARKER, MODULE_SCHEMA_VERSION};

/// Children of the avatar root carrying the module name, in sibling order.
pub fn module_candidates(
    scene: &dyn SceneGraph,
    avatar: NodeId,
    settings: &GeneratorSettings,
) -> Result<Vec<NodeId>> {
    let mut out = Vec::new();
    for &child in scene.children(avatar)? {
        if scene.name(child)? == settings.module_name {
            out.push(child);
        }
    }
    Ok(out)
}

/// First node under the avatar (itself included) holding a registration record.
pub fn find_store(scene: &dyn SceneGraph, avatar: NodeId) -> Result<Option<NodeId>> {
    Ok(scene
        .descendants_with(avatar, CapabilityKind::RegistrationStore)?
        .into_iter()
        .next())
}

pub fn read_store(scene: &dyn SceneGraph, holder: NodeId) -> Result<Option<&RegistrationStore>> {
    match scene.capability(holder, CapabilityKind::RegistrationStore)? {
        Some(Capability::RegistrationStore(store)) => Ok(Some(store)),
        _ => Ok(None),
    }
}

/// Record entries whose target is still alive, as outfit entries.
pub fn stored_outfits(scene: &dyn SceneGraph, store: &RegistrationStore) -> Vec<OutfitEntry> {
    store
        .entries
        .iter()
        .filter(|e| e.target.is_some_and(|t| scene.contains(t)))
        .map(|e| OutfitEntry {
            display_name: e.display_name.clone(),
            target: e.target,
            group_name: e.group_name.clone(),
        })
        .collect()
}

/// Non-empty, and every entry has a live target and a parameter key.
pub fn store_is_healthy(scene: &dyn SceneGraph, store: &RegistrationStore) -> bool {
    !store.entries.is_empty()
        && store.entries.iter().all(|e| {
            e.target.is_some_and(|t| scene.contains(t)) && !e.parameter_key.trim().is_empty()
        })
}

/// Fresh record entries for `outfits`; entries outside the avatar are skipped.
pub fn build_store(
    scene: &dyn SceneGraph,
    avatar: NodeId,
    outfits: &[OutfitEntry],
) -> RegistrationStore {
    let entries = outfits
        .iter()
        .enumerate()
        .filter(|(_, outfit)| {
            outfit
                .target
                .is_some_and(|t| scene.is_descendant_of(t, avatar).unwrap_or(false))
        })
        .map(|(index, outfit)| RegistrationEntry {
            display_name: outfit.display_name.clone(),
            target: outfit.target,
            group_name: outfit.group_name.clone(),
            parameter_key: keys::parameter_key(scene, avatar, outfit, index),
            binding_fingerprint: keys::binding_fingerprint(scene, outfit.target),
        })
        .collect();
    RegistrationStore { entries }
}

/// Overwrite the registration record, creating its holder when absent.
pub fn write_store(
    scene: &mut dyn SceneGraph,
    avatar: NodeId,
    settings: &GeneratorSettings,
    outfits: &[OutfitEntry],
) -> Result<NodeId> {
    let holder = match find_store(scene, avatar)? {
        Some(holder) => holder,
        None => scene.create_node(avatar, &settings.store_name)?,
    };
    let store = build_store(scene, avatar, outfits);
    scene.attach(holder, Capability::RegistrationStore(store))?;
    scene.mark_dirty(holder)?;
    Ok(holder)
}

pub fn read_metadata(scene: &dyn SceneGraph, module: NodeId) -> Result<Option<&ModuleMetadata>> {
    match scene.capability(module, CapabilityKind::ModuleMetadata)? {
        Some(Capability::ModuleMetadata(meta)) => Ok(Some(meta)),
        _ => Ok(None),
    }
}

pub fn stamp_metadata(scene: &mut dyn SceneGraph, module: NodeId, item_count: usize) -> Result<()> {
    scene.attach(
        module,
        Capability::ModuleMetadata(ModuleMetadata {
            schema_version: MODULE_SCHEMA_VERSION,
            generated_item_count: item_count,
            generator_version: GENERATOR_VERSION.to_string(),
            marker_id: MODULE_MARKER.to_string(),
        }),
    )
}

/// Whether the module still carries everything a rebuild produces.
pub fn has_expected_wiring(
    scene: &dyn SceneGraph,
    adapter: &dyn FrameworkAdapter,
    module: NodeId,
) -> framework::Result<bool> {
    if !adapter.has(scene, module, FrameworkCapability::ParameterBank)? {
        return Ok(false);
    }

    let subtree = scene.descendants(module)?;
    let mut has_menu_item = false;
    let mut has_toggle = false;
    for &node in &subtree {
        has_menu_item |= adapter.has(scene, node, FrameworkCapability::MenuItem)?;
        has_toggle |= adapter.has(scene, node, FrameworkCapability::ToggleAction)?;
    }
    if !has_menu_item {
        return Ok(false);
    }

    let merged_state_machine = adapter
        .read_animator_merge(scene, module)?
        .is_some_and(|path| matches!(scene.asset(&path), Some(Asset::StateMachine(_))));
    if !has_toggle && !merged_state_machine {
        return Ok(false);
    }

    for &child in scene.children(module)? {
        if scene.name(child)?.starts_with("MenuRoot_")
            && !(adapter.has(scene, child, FrameworkCapability::MenuInstaller)?
                && adapter.has(scene, child, FrameworkCapability::MenuItem)?)
        {
            return Ok(false);
        }
    }

    for &node in &subtree {
        if scene.name(node)?.starts_with("Parts_")
            && !adapter.has(scene, node, FrameworkCapability::MenuItem)?
        {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn store_health_requires_live_targets_and_keys() {
        let mut scene = Scene::new();
        let avatar = scene.create_root("Avatar").unwrap();
        let coat = scene.create_node(avatar, "Coat").unwrap();

        let mut store = build_store(&scene, avatar, &[OutfitEntry::new("Coat", coat)]);
        assert!(store_is_healthy(&scene, &store));
        assert!(!store_is_healthy(&scene, &RegistrationStore::default()));

        store.entries[0].parameter_key = " ".into();
        assert!(!store_is_healthy(&scene, &store));

        let store = build_store(&scene, avatar, &[OutfitEntry::new("Coat", coat)]);
        scene.delete_node(coat).unwrap();
        assert!(!store_is_healthy(&scene, &store));
        assert!(stored_outfits(&scene, &store).is_empty());
    }

    #[test]
    fn store_skips_targets_outside_the_avatar() {
        let mut scene = Scene::new();
        let avatar = scene.create_root("Avatar").unwrap();
        let stray = scene.create_root("Stray").unwrap();
        let coat = scene.create_node(avatar, "Coat").unwrap();

        let store = build_store(
            &scene,
            avatar,
            &[OutfitEntry::new("Stray", stray), OutfitEntry::new("Coat", coat)],
        );
        assert_eq!(store.entries.len(), 1);
        assert_eq!(
            store.entries[0].parameter_key,
            keys::parameter_key(&scene, avatar, &OutfitEntry::new("Coat", coat), 1)
        );
    }

    #[test]
    fn write_store_reuses_existing_holder() {
        let mut scene = Scene::new();
        let avatar = scene.create_root("Avatar").unwrap();
        let coat = scene.create_node(avatar, "Coat").unwrap();
        let settings = GeneratorSettings::default();

        let first = write_store(&mut scene, avatar, &settings, &[OutfitEntry::new("Coat", coat)]).unwrap();
        let second = write_store(&mut scene, avatar, &settings, &[]).unwrap();
        assert_eq!(first, second);
        assert_eq!(scene.name(first).unwrap(), "AvatarClosetRegistrationStore");
        assert!(read_store(&scene, first).unwrap().unwrap().entries.is_empty());
        assert!(scene.is_dirty(first));
    }
}
