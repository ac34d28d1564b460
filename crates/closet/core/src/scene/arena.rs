use super::{
    Asset, Capability, CapabilityKind, NodeId, Result, SceneError, SceneGraph, UndoGroupId,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    active: bool,
    capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    node: Option<NodeData>,
}

/// Undoable part of the scene.
#[derive(Debug, Clone, Default)]
struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
    roots: Vec<NodeId>,
    assets: BTreeMap<String, Asset>,
}

#[derive(Debug, Clone)]
struct UndoGroup {
    id: u64,
    label: String,
    before: World,
    dirty_nodes: BTreeSet<NodeId>,
    dirty_assets: BTreeSet<String>,
}

/// In-memory arena scene graph.
///
/// Slots are reused after deletion with a bumped generation, so handles to
/// deleted nodes never resolve again. Undo groups snapshot the world when
/// opened; reverting restores that snapshot wholesale. The last generation
/// issued per slot lives outside the snapshot, so handles minted inside a
/// reverted group stay stale.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    world: World,
    issued: Vec<Option<u32>>,
    registered_types: BTreeSet<String>,
    dirty_nodes: BTreeSet<NodeId>,
    dirty_assets: BTreeSet<String>,
    history: Vec<UndoGroup>,
    next_group: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a capability type name resolvable, the way installing a framework
    /// package would in the host.
    pub fn register_type(&mut self, type_name: impl Into<String>) {
        self.registered_types.insert(type_name.into());
    }

    pub fn unregister_type(&mut self, type_name: &str) -> bool {
        self.registered_types.remove(type_name)
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.registered_types.iter().map(String::as_str)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.world.roots
    }

    pub fn create_root(&mut self, name: &str) -> Result<NodeId> {
        let id = self.allocate(name, None)?;
        self.world.roots.push(id);
        Ok(id)
    }

    pub fn set_active(&mut self, id: NodeId, active: bool) -> Result<()> {
        self.node_mut(id)?.active = active;
        Ok(())
    }

    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(SceneError::EmptyName);
        }
        self.node_mut(id)?.name = name.to_string();
        Ok(())
    }

    /// Resolve a slash-joined name path starting at a root. The first
    /// matching child wins at every step.
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut current = self
            .world
            .roots
            .iter()
            .copied()
            .find(|&id| self.name(id).is_ok_and(|n| n == first))?;
        for segment in segments {
            current = self.child_named(current, segment).ok().flatten()?;
        }
        Some(current)
    }

    pub fn node_count(&self) -> usize {
        self.world.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn assets(&self) -> impl Iterator<Item = (&str, &Asset)> {
        self.world.assets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.dirty_nodes.contains(&id)
    }

    pub fn is_asset_dirty(&self, path: &str) -> bool {
        self.dirty_assets.contains(path)
    }

    /// Drain the dirty sets, returning how many nodes and assets were dirty.
    pub fn clear_dirty(&mut self) -> (usize, usize) {
        let counts = (self.dirty_nodes.len(), self.dirty_assets.len());
        self.dirty_nodes.clear();
        self.dirty_assets.clear();
        counts
    }

    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    pub fn undo_labels(&self) -> impl Iterator<Item = &str> {
        self.history.iter().map(|g| g.label.as_str())
    }

    /// Undo the most recent group, returning its label.
    pub fn undo(&mut self) -> Option<String> {
        let group = self.history.pop()?;
        self.world = group.before;
        let world = &self.world;
        self.dirty_nodes.retain(|&id| {
            world
                .slots
                .get(id.index() as usize)
                .is_some_and(|slot| slot.generation == id.generation() && slot.node.is_some())
        });
        self.dirty_assets.retain(|path| world.assets.contains_key(path));
        Some(group.label)
    }

    fn allocate(&mut self, name: &str, parent: Option<NodeId>) -> Result<NodeId> {
        if name.trim().is_empty() {
            return Err(SceneError::EmptyName);
        }
        let data = NodeData {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            active: true,
            capabilities: Vec::new(),
        };
        if let Some(index) = self.world.free.pop() {
            let floor = self.world.slots[index as usize].generation;
            let generation = self.fresh_generation(index, floor);
            let slot = &mut self.world.slots[index as usize];
            slot.generation = generation;
            slot.node = Some(data);
            return Ok(NodeId::new(index, generation));
        }
        let index = self.world.slots.len() as u32;
        let generation = self.fresh_generation(index, 0);
        self.world.slots.push(Slot {
            generation,
            node: Some(data),
        });
        Ok(NodeId::new(index, generation))
    }

    /// First generation at or above `floor` never handed out for `index`.
    fn fresh_generation(&mut self, index: u32, floor: u32) -> u32 {
        let i = index as usize;
        if self.issued.len() <= i {
            self.issued.resize(i + 1, None);
        }
        let generation = match self.issued[i] {
            Some(last) => floor.max(last.wrapping_add(1)),
            None => floor,
        };
        self.issued[i] = Some(generation);
        generation
    }

    fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.world
            .slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(SceneError::StaleHandle(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.world
            .slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(SceneError::StaleHandle(id))
    }

    fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.world.slots.get_mut(id.index() as usize) {
            slot.node = None;
            slot.generation = slot.generation.wrapping_add(1);
            self.world.free.push(id.index());
        }
        self.dirty_nodes.remove(&id);
    }
}

impl SceneGraph for Scene {
    fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    fn name(&self, id: NodeId) -> Result<&str> {
        Ok(&self.node(id)?.name)
    }

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    fn is_active(&self, id: NodeId) -> Result<bool> {
        Ok(self.node(id)?.active)
    }

    fn capabilities(&self, id: NodeId) -> Result<&[Capability]> {
        Ok(&self.node(id)?.capabilities)
    }

    fn capability_mut(
        &mut self,
        id: NodeId,
        kind: CapabilityKind,
    ) -> Result<Option<&mut Capability>> {
        Ok(self
            .node_mut(id)?
            .capabilities
            .iter_mut()
            .find(|c| c.is(kind)))
    }

    fn create_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId> {
        // Validate the parent before allocating so a stale parent leaks nothing.
        self.node(parent)?;
        let id = self.allocate(name, Some(parent))?;
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    fn delete_node(&mut self, id: NodeId) -> Result<()> {
        let subtree = self.descendants(id)?;
        match self.node(id)?.parent {
            Some(parent) => self.node_mut(parent)?.children.retain(|&c| c != id),
            None => self.world.roots.retain(|&r| r != id),
        }
        for node in subtree {
            self.release(node);
        }
        Ok(())
    }

    fn attach(&mut self, id: NodeId, capability: Capability) -> Result<()> {
        let node = self.node_mut(id)?;
        match node
            .capabilities
            .iter_mut()
            .find(|c| c.same_kind(&capability))
        {
            Some(existing) => *existing = capability,
            None => node.capabilities.push(capability),
        }
        Ok(())
    }

    fn detach(&mut self, id: NodeId, kind: CapabilityKind) -> Result<Option<Capability>> {
        let node = self.node_mut(id)?;
        Ok(node
            .capabilities
            .iter()
            .position(|c| c.is(kind))
            .map(|pos| node.capabilities.remove(pos)))
    }

    fn mark_dirty(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.dirty_nodes.insert(id);
        Ok(())
    }

    fn is_type_registered(&self, type_name: &str) -> bool {
        self.registered_types.contains(type_name)
    }

    fn asset(&self, path: &str) -> Option<&Asset> {
        self.world.assets.get(path)
    }

    fn asset_mut(&mut self, path: &str) -> Option<&mut Asset> {
        self.world.assets.get_mut(path)
    }

    fn put_asset(&mut self, path: &str, asset: Asset) {
        self.world.assets.insert(path.to_string(), asset);
    }

    fn delete_asset(&mut self, path: &str) -> Option<Asset> {
        self.dirty_assets.remove(path);
        self.world.assets.remove(path)
    }

    fn mark_asset_dirty(&mut self, path: &str) {
        self.dirty_assets.insert(path.to_string());
    }

    fn begin_group(&mut self, label: &str) -> UndoGroupId {
        let id = self.next_group;
        self.next_group += 1;
        self.history.push(UndoGroup {
            id,
            label: label.to_string(),
            before: self.world.clone(),
            dirty_nodes: self.dirty_nodes.clone(),
            dirty_assets: self.dirty_assets.clone(),
        });
        UndoGroupId(id)
    }

    fn collapse_group(&mut self, group: UndoGroupId) {
        if let Some(pos) = self.history.iter().position(|g| g.id == group.0) {
            self.history.truncate(pos + 1);
        }
    }

    fn revert_group(&mut self, group: UndoGroupId) {
        if let Some(pos) = self.history.iter().position(|g| g.id == group.0) {
            let group = self.history.split_off(pos).swap_remove(0);
            self.world = group.before;
            self.dirty_nodes = group.dirty_nodes;
            self.dirty_assets = group.dirty_assets;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{OutfitSetTag, Record};

    fn sample() -> (Scene, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new();
        let avatar = scene.create_root("Avatar").unwrap();
        let closet = scene.create_node(avatar, "Closet").unwrap();
        let coat = scene.create_node(closet, "Coat").unwrap();
        (scene, avatar, closet, coat)
    }

    #[test]
    fn deleted_handles_become_stale_and_slots_are_reused() {
        let (mut scene, avatar, closet, coat) = sample();
        scene.delete_node(closet).unwrap();

        assert!(!scene.contains(closet));
        assert!(!scene.contains(coat));
        assert_eq!(scene.name(coat), Err(SceneError::StaleHandle(coat)));
        assert!(scene.children(avatar).unwrap().is_empty());

        let fresh = scene.create_node(avatar, "Fresh").unwrap();
        assert_ne!(fresh, closet);
        assert_ne!(fresh, coat);
        assert!(scene.contains(fresh));
    }

    #[test]
    fn paths_and_descendant_checks() {
        let (scene, avatar, closet, coat) = sample();
        assert_eq!(scene.full_path(coat).unwrap(), "Avatar/Closet/Coat");
        assert_eq!(scene.path_from(closet, coat).unwrap(), "Closet/Coat");
        assert_eq!(scene.relative_path(avatar, coat).unwrap(), "Closet/Coat");
        assert_eq!(scene.relative_path(avatar, avatar).unwrap(), "");
        assert!(scene.is_descendant_of(coat, avatar).unwrap());
        assert!(!scene.is_descendant_of(avatar, avatar).unwrap());
        assert!(scene.relative_path(coat, avatar).is_err());
        assert_eq!(scene.find_path("Avatar/Closet/Coat"), Some(coat));
        assert_eq!(scene.find_path("Avatar/Nope"), None);
    }

    #[test]
    fn descendants_are_pre_order() {
        let (mut scene, avatar, closet, coat) = sample();
        let hat = scene.create_node(avatar, "Hat").unwrap();
        let order = scene.descendants(avatar).unwrap();
        assert_eq!(order, vec![avatar, closet, coat, hat]);
    }

    #[test]
    fn attach_replaces_same_kind() {
        let (mut scene, _, closet, _) = sample();
        scene
            .attach(
                closet,
                Capability::OutfitSet(OutfitSetTag {
                    set_index: 1,
                    ..Default::default()
                }),
            )
            .unwrap();
        scene
            .attach(
                closet,
                Capability::OutfitSet(OutfitSetTag {
                    set_index: 2,
                    ..Default::default()
                }),
            )
            .unwrap();
        scene
            .attach(closet, Capability::Foreign(Record::new("Toggle")))
            .unwrap();

        assert_eq!(scene.capabilities(closet).unwrap().len(), 2);
        let Some(Capability::OutfitSet(tag)) =
            scene.capability(closet, CapabilityKind::OutfitSet).unwrap()
        else {
            panic!("expected set tag");
        };
        assert_eq!(tag.set_index, 2);
    }

    #[test]
    fn revert_group_restores_snapshot() {
        let (mut scene, avatar, closet, _) = sample();
        let group = scene.begin_group("Edit");
        scene.delete_node(closet).unwrap();
        scene.create_node(avatar, "Other").unwrap();
        scene.revert_group(group);

        assert!(scene.contains(closet));
        assert_eq!(scene.children(avatar).unwrap(), &[closet]);
        assert_eq!(scene.undo_depth(), 0);
    }

    #[test]
    fn collapse_folds_nested_groups_into_one_step() {
        let (mut scene, avatar, _, _) = sample();
        let outer = scene.begin_group("Outer");
        scene.create_node(avatar, "A").unwrap();
        let _inner = scene.begin_group("Inner");
        scene.create_node(avatar, "B").unwrap();
        scene.collapse_group(outer);

        assert_eq!(scene.undo_depth(), 1);
        assert_eq!(scene.undo().as_deref(), Some("Outer"));
        assert_eq!(scene.children(avatar).unwrap().len(), 1);
    }

    #[test]
    fn handles_minted_in_a_reverted_group_stay_stale() {
        let (mut scene, avatar, closet, _) = sample();
        let group = scene.begin_group("Edit");
        let temp = scene.create_node(avatar, "Temp").unwrap();
        scene.revert_group(group);

        let other = scene.create_node(avatar, "Other").unwrap();
        assert_eq!(other.index(), temp.index());
        assert_ne!(other, temp);
        assert!(!scene.contains(temp));
        assert_eq!(scene.name(temp), Err(SceneError::StaleHandle(temp)));

        // Same after undoing a collapsed group that deleted and reused a slot.
        let group = scene.begin_group("Swap");
        scene.delete_node(closet).unwrap();
        let reused = scene.create_node(avatar, "Reused").unwrap();
        scene.collapse_group(group);
        assert_eq!(scene.undo().as_deref(), Some("Swap"));
        scene.delete_node(closet).unwrap();
        let again = scene.create_node(avatar, "Again").unwrap();
        assert!(!scene.contains(reused));
        assert_ne!(again, reused);
    }

    #[test]
    fn revert_restores_dirty_marks() {
        let (mut scene, avatar, closet, _) = sample();
        scene.mark_dirty(closet).unwrap();
        scene.mark_asset_dirty("Assets/Before.controller");

        let group = scene.begin_group("Edit");
        let temp = scene.create_node(avatar, "Temp").unwrap();
        scene.mark_dirty(temp).unwrap();
        scene.mark_asset_dirty("Assets/During.controller");
        scene.revert_group(group);

        assert!(scene.is_dirty(closet));
        assert!(!scene.is_dirty(temp));
        assert!(scene.is_asset_dirty("Assets/Before.controller"));
        assert!(!scene.is_asset_dirty("Assets/During.controller"));
    }
}
