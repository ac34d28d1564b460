//! Read-only snapshot of the tagged Root → Set → Part tree.

use crate::keys;
use crate::scene::{Capability, CapabilityKind, NodeId, Result, SceneGraph};
use crate::settings::set_parameter_for;

/// One flat outfit: a target node plus labels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OutfitEntry {
    pub display_name: String,
    pub target: Option<NodeId>,
    pub group_name: String,
}

impl OutfitEntry {
    pub fn new(display_name: impl Into<String>, target: NodeId) -> Self {
        Self {
            display_name: display_name.into(),
            target: Some(target),
            group_name: String::new(),
        }
    }

    #[must_use]
    pub fn with_group(mut self, group_name: impl Into<String>) -> Self {
        self.group_name = group_name.into();
        self
    }

    /// Trimmed display name, else the target's node name, else `Outfit`.
    pub fn effective_name(&self, scene: &dyn SceneGraph) -> String {
        let trimmed = self.display_name.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
        self.target
            .and_then(|t| scene.name(t).ok())
            .map_or_else(|| "Outfit".to_string(), str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inventory {
    pub roots: Vec<InventoryRoot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryRoot {
    pub node: NodeId,
    pub display_name: String,
    pub namespace_prefix: String,
    pub set_parameter: String,
    pub sets: Vec<InventorySet>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySet {
    pub node: NodeId,
    pub set_index: i32,
    pub display_name: String,
    pub default_on: bool,
    pub parts: Vec<InventoryPart>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryPart {
    pub node: NodeId,
    pub display_name: String,
    pub default_on: bool,
    pub parameter: String,
}

impl InventorySet {
    /// Bool parameter toggling this set.
    pub fn toggle_parameter(&self, root: &InventoryRoot) -> String {
        format!("{}_IS_{}", root.set_parameter, self.set_index)
    }
}

impl Inventory {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Whether the tagged tree yields anything to build. Roots without sets
    /// only warn and leave generation to the caller list or the record.
    pub fn drives_generation(&self) -> bool {
        self.set_count() > 0
    }

    pub fn set_count(&self) -> usize {
        self.roots.iter().map(|r| r.sets.len()).sum()
    }

    pub fn part_count(&self) -> usize {
        self.roots
            .iter()
            .flat_map(|r| &r.sets)
            .map(|s| s.parts.len())
            .sum()
    }

    /// One flat entry per set: display name, set node, root display name as group.
    pub fn outfit_entries(&self) -> Vec<OutfitEntry> {
        self.roots
            .iter()
            .flat_map(|root| {
                root.sets.iter().map(|set| OutfitEntry {
                    display_name: set.display_name.clone(),
                    target: Some(set.node),
                    group_name: root.display_name.clone(),
                })
            })
            .collect()
    }

    /// Every bool parameter the tagged-tree rebuild generates, in bank order.
    pub fn generated_parameters(&self) -> Vec<String> {
        let mut out = Vec::new();
        for root in &self.roots {
            for set in &root.sets {
                out.push(set.toggle_parameter(root));
                out.extend(set.parts.iter().map(|p| p.parameter.clone()));
            }
        }
        out
    }
}

fn effective_display_name(scene: &dyn SceneGraph, node: NodeId, tagged: &str) -> Result<String> {
    let trimmed = tagged.trim();
    if trimmed.is_empty() {
        Ok(scene.name(node)?.to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

/// Walk every menu root under `avatar` (the avatar itself included, inactive
/// nodes included) in pre-order.
pub fn collect(scene: &dyn SceneGraph, avatar: NodeId) -> Result<Inventory> {
    let mut roots = Vec::new();
    for root_node in scene.descendants_with(avatar, CapabilityKind::MenuRoot)? {
        let Some(Capability::MenuRoot(tag)) = scene.capability(root_node, CapabilityKind::MenuRoot)?
        else {
            continue;
        };
        let display_name = effective_display_name(scene, root_node, &tag.display_name)?;
        let namespace_prefix = tag.namespace_prefix.trim().to_string();
        let set_parameter = set_parameter_for(&namespace_prefix);
        let root_id = scene.relative_path(avatar, root_node)?;

        let mut sets = Vec::new();
        for set_node in scene.descendants_with(root_node, CapabilityKind::OutfitSet)? {
            if set_node == root_node {
                continue;
            }
            let Some(Capability::OutfitSet(set_tag)) =
                scene.capability(set_node, CapabilityKind::OutfitSet)?
            else {
                continue;
            };
            let set_name = effective_display_name(scene, set_node, &set_tag.display_name)?;
            let set_id = scene.relative_path(avatar, set_node)?;

            let mut parts = Vec::new();
            for part_node in scene.descendants_with(set_node, CapabilityKind::OutfitPart)? {
                if part_node == set_node {
                    continue;
                }
                let Some(Capability::OutfitPart(part_tag)) =
                    scene.capability(part_node, CapabilityKind::OutfitPart)?
                else {
                    continue;
                };
                let part_name = effective_display_name(scene, part_node, &part_tag.display_name)?;
                let part_id = scene.relative_path(avatar, part_node)?;
                parts.push(InventoryPart {
                    node: part_node,
                    parameter: keys::part_parameter_name(
                        &namespace_prefix,
                        &set_name,
                        &part_name,
                        [&root_id, &set_id, &part_id],
                    ),
                    display_name: part_name,
                    default_on: part_tag.default_on,
                });
            }

            sets.push(InventorySet {
                node: set_node,
                set_index: set_tag.set_index,
                display_name: set_name,
                default_on: set_tag.default_on,
                parts,
            });
        }

        roots.push(InventoryRoot {
            node: root_node,
            display_name,
            namespace_prefix,
            set_parameter,
            sets,
        });
    }
    Ok(Inventory { roots })
}

/// Direct children of a closet root as flat outfit entries.
pub fn scan_closet(scene: &dyn SceneGraph, closet: NodeId) -> Result<Vec<OutfitEntry>> {
    scene
        .children(closet)?
        .iter()
        .map(|&child| Ok(OutfitEntry::new(scene.name(child)?, child)))
        .collect()
}

/// Drop entries whose target is gone and trim labels.
pub fn normalize(scene: &dyn SceneGraph, entries: &[OutfitEntry]) -> Vec<OutfitEntry> {
    entries
        .iter()
        .filter(|e| e.target.is_some_and(|t| scene.contains(t)))
        .map(|e| OutfitEntry {
            display_name: e.display_name.trim().to_string(),
            target: e.target,
            group_name: e.group_name.trim().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MenuRootTag, OutfitPartTag, OutfitSetTag, Scene};
    use pretty_assertions::assert_eq;

    fn tag_set(scene: &mut Scene, node: NodeId, index: i32, name: &str) {
        scene
            .attach(
                node,
                Capability::OutfitSet(OutfitSetTag {
                    set_index: index,
                    display_name: name.into(),
                    default_on: index == 0,
                }),
            )
            .unwrap();
    }

    #[test]
    fn collects_in_pre_order_with_effective_names() {
        let mut scene = Scene::new();
        let avatar = scene.create_root("Avatar").unwrap();
        let closet = scene.create_node(avatar, "Closet").unwrap();
        scene
            .attach(
                closet,
                Capability::MenuRoot(MenuRootTag {
                    namespace_prefix: " Top ".into(),
                    ..Default::default()
                }),
            )
            .unwrap();
        let b = scene.create_node(closet, "B").unwrap();
        let a = scene.create_node(closet, "A").unwrap();
        tag_set(&mut scene, b, 1, "");
        tag_set(&mut scene, a, 0, "Alpha");
        scene.set_active(a, false).unwrap();
        let sleeve = scene.create_node(a, "Sleeve").unwrap();
        scene
            .attach(sleeve, Capability::OutfitPart(OutfitPartTag::default()))
            .unwrap();

        let inventory = collect(&scene, avatar).unwrap();
        assert_eq!(inventory.roots.len(), 1);
        let root = &inventory.roots[0];
        assert_eq!(root.display_name, "Closet");
        assert_eq!(root.set_parameter, "Top_ACT_SET");
        let names: Vec<_> = root.sets.iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(names, vec!["B", "Alpha"]);
        assert_eq!(root.sets[1].parts.len(), 1);
        assert!(root.sets[1].parts[0].parameter.starts_with("Top_PART_Alpha_Sleeve_"));

        assert_eq!(
            inventory.generated_parameters()[..2],
            ["Top_ACT_SET_IS_1".to_string(), "Top_ACT_SET_IS_0".to_string()]
        );
        let entries = inventory.outfit_entries();
        assert_eq!(entries[1], OutfitEntry::new("Alpha", a).with_group("Closet"));
    }

    #[test]
    fn menu_root_on_avatar_itself_is_collected() {
        let mut scene = Scene::new();
        let avatar = scene.create_root("Avatar").unwrap();
        scene
            .attach(avatar, Capability::MenuRoot(MenuRootTag::default()))
            .unwrap();
        tag_set(&mut scene, avatar, 0, "Self");
        let inventory = collect(&scene, avatar).unwrap();
        assert_eq!(inventory.roots.len(), 1);
        assert!(inventory.roots[0].sets.is_empty());
    }

    #[test]
    fn scan_and_normalize() {
        let mut scene = Scene::new();
        let avatar = scene.create_root("Avatar").unwrap();
        let closet = scene.create_node(avatar, "Closet").unwrap();
        let coat = scene.create_node(closet, "Coat").unwrap();
        let hat = scene.create_node(closet, "Hat").unwrap();

        let mut entries = scan_closet(&scene, closet).unwrap();
        assert_eq!(entries, vec![OutfitEntry::new("Coat", coat), OutfitEntry::new("Hat", hat)]);

        entries[0].display_name = "  Long Coat ".into();
        scene.delete_node(hat).unwrap();
        let normalized = normalize(&scene, &entries);
        assert_eq!(normalized, vec![OutfitEntry::new("Long Coat", coat)]);
        assert_eq!(normalized[0].effective_name(&scene), "Long Coat");
        assert_eq!(OutfitEntry::new("", coat).effective_name(&scene), "Coat");
    }
}
