//! Host scene-graph contract and the in-memory arena that implements it.
//!
//! The pipeline never holds raw node references. Every node is addressed by a
//! [`NodeId`] handle carrying a generation counter, so a handle to a node the
//! host deleted is reported as [`SceneError::StaleHandle`] instead of silently
//! aliasing a newer node.

mod arena;
mod asset;
mod capability;
mod document;

pub use arena::Scene;
pub use asset::{
    AnimatorLayer, AnimatorParameter, AnimatorParameterKind, AnimatorState, Asset, ConditionMode,
    ConstantCurve, Motion, StateMachineAsset, Transition, TransitionCondition,
};
pub use capability::{
    Capability, CapabilityKind, FieldValue, Fields, MaterialSlot, MenuRootTag, ModuleMetadata,
    OutfitPartTag, OutfitSetTag, Record, RegistrationEntry, RegistrationStore, RendererBinding,
};
pub use document::{DocumentError, NodeDocument, SceneDocument, load_document, save_document};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Generation-checked handle to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Identifies one open undo group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoGroupId(pub(crate) u64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("Node handle {0} is stale (the node was deleted)")]
    StaleHandle(NodeId),

    #[error("Node {node} is not a descendant of {ancestor}")]
    NotADescendant { node: NodeId, ancestor: NodeId },

    #[error("Node name cannot be empty")]
    EmptyName,
}

pub type Result<T> = std::result::Result<T, SceneError>;

/// Everything the pipeline needs from the host scene graph.
///
/// Enumeration order is always pre-order (parent before children, children in
/// sibling order) and includes inactive nodes.
pub trait SceneGraph {
    fn contains(&self, id: NodeId) -> bool;

    fn name(&self, id: NodeId) -> Result<&str>;

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>>;

    fn children(&self, id: NodeId) -> Result<&[NodeId]>;

    fn is_active(&self, id: NodeId) -> Result<bool>;

    fn capabilities(&self, id: NodeId) -> Result<&[Capability]>;

    fn capability_mut(&mut self, id: NodeId, kind: CapabilityKind)
    -> Result<Option<&mut Capability>>;

    /// Create a node as the last child of `parent`.
    fn create_node(&mut self, parent: NodeId, name: &str) -> Result<NodeId>;

    /// Delete a node and its whole subtree immediately.
    fn delete_node(&mut self, id: NodeId) -> Result<()>;

    /// Attach a capability, replacing any existing capability of the same kind.
    fn attach(&mut self, id: NodeId, capability: Capability) -> Result<()>;

    fn detach(&mut self, id: NodeId, kind: CapabilityKind) -> Result<Option<Capability>>;

    fn mark_dirty(&mut self, id: NodeId) -> Result<()>;

    /// Whether the host knows a capability type by this name.
    fn is_type_registered(&self, type_name: &str) -> bool;

    fn asset(&self, path: &str) -> Option<&Asset>;

    fn asset_mut(&mut self, path: &str) -> Option<&mut Asset>;

    fn put_asset(&mut self, path: &str, asset: Asset);

    fn delete_asset(&mut self, path: &str) -> Option<Asset>;

    fn mark_asset_dirty(&mut self, path: &str);

    /// Open an undo group. Every mutation until the matching collapse or
    /// revert belongs to it.
    fn begin_group(&mut self, label: &str) -> UndoGroupId;

    /// Fold the group and everything recorded after it into one undo step.
    fn collapse_group(&mut self, group: UndoGroupId);

    /// Restore the state captured when the group was opened.
    fn revert_group(&mut self, group: UndoGroupId);

    fn capability(&self, id: NodeId, kind: CapabilityKind) -> Result<Option<&Capability>> {
        Ok(self.capabilities(id)?.iter().find(|c| c.is(kind)))
    }

    fn has_capability(&self, id: NodeId, kind: CapabilityKind) -> Result<bool> {
        Ok(self.capability(id, kind)?.is_some())
    }

    /// Strict descendant test: a node is never its own descendant.
    fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> Result<bool> {
        if !self.contains(ancestor) {
            return Err(SceneError::StaleHandle(ancestor));
        }
        let mut current = self.parent(node)?;
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.parent(id)?;
        }
        Ok(false)
    }

    /// Pre-order walk of `root`'s subtree, `root` included.
    fn descendants(&self, root: NodeId) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id)?.iter().rev().copied());
        }
        Ok(out)
    }

    /// Pre-order list of nodes in `root`'s subtree carrying `kind`.
    fn descendants_with(&self, root: NodeId, kind: CapabilityKind) -> Result<Vec<NodeId>> {
        let mut out = Vec::new();
        for id in self.descendants(root)? {
            if self.has_capability(id, kind)? {
                out.push(id);
            }
        }
        Ok(out)
    }

    /// Nearest strict ancestor carrying `kind`.
    fn ancestor_with(&self, node: NodeId, kind: CapabilityKind) -> Result<Option<NodeId>> {
        let mut current = self.parent(node)?;
        while let Some(id) = current {
            if self.has_capability(id, kind)? {
                return Ok(Some(id));
            }
            current = self.parent(id)?;
        }
        Ok(None)
    }

    /// Slash-joined names from the topmost root down to `node`.
    fn full_path(&self, node: NodeId) -> Result<String> {
        let mut names = vec![self.name(node)?];
        let mut current = self.parent(node)?;
        while let Some(id) = current {
            names.push(self.name(id)?);
            current = self.parent(id)?;
        }
        names.reverse();
        Ok(names.join("/"))
    }

    /// Slash-joined names from `ancestor` (inclusive) down to `node`.
    ///
    /// Falls back to [`SceneGraph::full_path`] when `node` does not live under
    /// `ancestor`.
    fn path_from(&self, ancestor: NodeId, node: NodeId) -> Result<String> {
        let mut names = vec![self.name(node)?];
        if node == ancestor {
            return Ok(names.join("/"));
        }
        let mut current = self.parent(node)?;
        while let Some(id) = current {
            names.push(self.name(id)?);
            if id == ancestor {
                names.reverse();
                return Ok(names.join("/"));
            }
            current = self.parent(id)?;
        }
        self.full_path(node)
    }

    /// Slash-joined names strictly below `root` down to `node` (empty for
    /// `root` itself).
    fn relative_path(&self, root: NodeId, node: NodeId) -> Result<String> {
        if node == root {
            return Ok(String::new());
        }
        let mut names = vec![self.name(node)?];
        let mut current = self.parent(node)?;
        while let Some(id) = current {
            if id == root {
                names.reverse();
                return Ok(names.join("/"));
            }
            names.push(self.name(id)?);
            current = self.parent(id)?;
        }
        Err(SceneError::NotADescendant {
            node,
            ancestor: root,
        })
    }

    fn child_named(&self, parent: NodeId, name: &str) -> Result<Option<NodeId>> {
        for &child in self.children(parent)? {
            if self.name(child)? == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }
}
