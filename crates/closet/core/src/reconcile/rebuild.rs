use super::EffectiveOutfits;
use crate::error::Result;
use crate::framework::{
    AnimatorMergeSpec, FrameworkAdapter, FrameworkCapability, MenuItemSpec, ParameterSpec,
    ToggleSpec,
};
use crate::generated;
use crate::inventory::{Inventory, OutfitEntry};
use crate::keys::sanitize_name;
use crate::scene::{NodeId, SceneGraph};
use crate::selection;
use crate::settings::{GeneratorSettings, SET_PARAMETER};
use tracing::debug;

/// Replace the module's contents with a fresh build for `effective`.
///
/// Returns the item count stamped into the metadata.
pub(super) fn rebuild_module(
    scene: &mut dyn SceneGraph,
    adapter: &dyn FrameworkAdapter,
    settings: &GeneratorSettings,
    avatar: NodeId,
    module: NodeId,
    effective: &EffectiveOutfits,
) -> Result<usize> {
    for child in scene.children(module)?.to_vec() {
        scene.delete_node(child)?;
    }

    // Module-level records are rewritten in their existing slots.
    let count = match effective {
        EffectiveOutfits::Hierarchical { inventory, .. } => {
            adapter.remove(scene, module, FrameworkCapability::AnimatorMerge)?;
            rebuild_tree(scene, adapter, settings, module, inventory)?
        }
        EffectiveOutfits::Flat { outfits, .. } => {
            rebuild_flat(scene, adapter, settings, avatar, module, outfits)?
        }
    };

    generated::stamp_metadata(scene, module, count)?;
    scene.mark_dirty(module)?;
    debug!(count, "Rebuilt generated module");
    Ok(count)
}

fn rebuild_flat(
    scene: &mut dyn SceneGraph,
    adapter: &dyn FrameworkAdapter,
    settings: &GeneratorSettings,
    avatar: NodeId,
    module: NodeId,
    outfits: &[OutfitEntry],
) -> Result<usize> {
    adapter.write_parameter_bank(scene, module, &[ParameterSpec::int(SET_PARAMETER, 0)])?;

    let state_machine = selection::synthesize(scene, settings, avatar, outfits, SET_PARAMETER)?;
    adapter.write_animator_merge(scene, module, &AnimatorMergeSpec { state_machine })?;

    let menu_root = scene.create_node(module, "MenuRoot_Closet")?;
    adapter.write_menu_installer(scene, menu_root)?;
    adapter.write_menu_item(
        scene,
        menu_root,
        &MenuItemSpec::submenu(&settings.closet_menu_label),
    )?;

    for (index, outfit) in outfits.iter().enumerate() {
        let name = outfit.effective_name(scene);
        let button = scene.create_node(
            menu_root,
            &format!("SetButton_{index}_{}", sanitize_name(&name)),
        )?;
        adapter.write_menu_item(
            scene,
            button,
            &MenuItemSpec::button(&name, SET_PARAMETER, index as f32),
        )?;
    }
    Ok(outfits.len())
}

fn rebuild_tree(
    scene: &mut dyn SceneGraph,
    adapter: &dyn FrameworkAdapter,
    settings: &GeneratorSettings,
    module: NodeId,
    inventory: &Inventory,
) -> Result<usize> {
    let mut parameters = Vec::new();

    for root in &inventory.roots {
        let root_node = scene.create_node(
            module,
            &format!("MenuRoot_{}", sanitize_name(&root.display_name)),
        )?;
        adapter.write_menu_installer(scene, root_node)?;
        adapter.write_menu_item(scene, root_node, &MenuItemSpec::submenu(&root.display_name))?;

        for set in &root.sets {
            let set_node = scene.create_node(
                root_node,
                &format!("Set_{}_{}", set.set_index, sanitize_name(&set.display_name)),
            )?;
            let set_parameter = set.toggle_parameter(root);
            parameters.push(ParameterSpec::bool(&set_parameter, set.default_on));
            adapter.write_toggle(scene, set_node, &ToggleSpec::new(set.node, &set_parameter))?;
            adapter.write_menu_item(
                scene,
                set_node,
                &MenuItemSpec::toggle(&set.display_name, &set_parameter),
            )?;

            if set.parts.is_empty() {
                continue;
            }

            let parts_node = scene.create_node(
                set_node,
                &format!("Parts_{}", sanitize_name(&set.display_name)),
            )?;
            adapter.write_menu_item(
                scene,
                parts_node,
                &MenuItemSpec::submenu(&settings.parts_menu_label),
            )?;

            for (position, part) in set.parts.iter().enumerate() {
                parameters.push(ParameterSpec::bool(&part.parameter, part.default_on));
                let part_node = scene.create_node(
                    parts_node,
                    &format!("Part_{}_{}", sanitize_name(&part.display_name), position + 1),
                )?;
                adapter.write_toggle(scene, part_node, &ToggleSpec::new(part.node, &part.parameter))?;
                adapter.write_menu_item(
                    scene,
                    part_node,
                    &MenuItemSpec::toggle(&part.display_name, &part.parameter),
                )?;
            }
        }
    }

    adapter.write_parameter_bank(scene, module, &parameters)?;
    Ok(parameters.len())
}
