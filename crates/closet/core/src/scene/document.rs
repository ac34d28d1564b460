//! JSON document form of an arena [`Scene`].
//!
//! Node references inside capabilities are written as slash-joined name
//! paths from a top-level root. On load a path resolves to the first
//! matching child at every step; unresolvable paths load as empty references.

use super::{Asset, Capability, NodeId, Scene, SceneError, SceneGraph};
use atomicwrites::{AllowOverwrite, AtomicFile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scene document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Atomic write failed: {0}")]
    AtomicWrite(String),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDocument {
    pub registered_types: Vec<String>,
    pub roots: Vec<NodeDocument>,
    pub assets: BTreeMap<String, Asset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<Capability<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDocument>,
}

fn default_active() -> bool {
    true
}

impl NodeDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            capabilities: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl Scene {
    /// Build a scene from a document. References are resolved after every
    /// node exists, so forward references work.
    pub fn from_document(document: SceneDocument) -> Result<Self, DocumentError> {
        let mut scene = Self::new();
        for type_name in document.registered_types {
            scene.register_type(type_name);
        }

        let mut pending = Vec::new();
        for root in document.roots {
            let id = scene.create_root(&root.name)?;
            scene.load_node(id, root, &mut pending)?;
        }

        for (id, capabilities) in pending {
            for capability in capabilities {
                let resolved = capability.map_refs(&mut |path: String| scene.find_path(&path));
                scene.attach(id, resolved)?;
            }
        }

        for (path, asset) in document.assets {
            scene.put_asset(&path, asset);
        }
        Ok(scene)
    }

    pub fn to_document(&self) -> Result<SceneDocument, DocumentError> {
        let roots = self
            .roots()
            .iter()
            .map(|&root| self.save_node(root))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SceneDocument {
            registered_types: self.registered_types().map(str::to_string).collect(),
            roots,
            assets: self
                .assets()
                .map(|(path, asset)| (path.to_string(), asset.clone()))
                .collect(),
        })
    }

    fn load_node(
        &mut self,
        id: NodeId,
        node: NodeDocument,
        pending: &mut Vec<(NodeId, Vec<Capability<String>>)>,
    ) -> Result<(), SceneError> {
        self.set_active(id, node.active)?;
        if !node.capabilities.is_empty() {
            pending.push((id, node.capabilities));
        }
        for child in node.children {
            let child_id = self.create_node(id, &child.name)?;
            self.load_node(child_id, child, pending)?;
        }
        Ok(())
    }

    fn save_node(&self, id: NodeId) -> Result<NodeDocument, SceneError> {
        let capabilities = self
            .capabilities(id)?
            .iter()
            .cloned()
            .map(|capability| capability.map_refs(&mut |node| self.full_path(node).ok()))
            .collect();
        let children = self
            .children(id)?
            .iter()
            .map(|&child| self.save_node(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NodeDocument {
            name: self.name(id)?.to_string(),
            active: self.is_active(id)?,
            capabilities,
            children,
        })
    }
}

pub fn load_document(path: &Path) -> Result<Scene, DocumentError> {
    let content = std::fs::read_to_string(path)?;
    let document: SceneDocument = serde_json::from_str(&content)?;
    Scene::from_document(document)
}

pub fn save_document(scene: &Scene, path: &Path) -> Result<(), DocumentError> {
    let document = scene.to_document()?;
    let json = serde_json::to_string_pretty(&document)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let af = AtomicFile::new(path, AllowOverwrite);
    af.write(|f| f.write_all(json.as_bytes()))
        .map_err(|e| DocumentError::AtomicWrite(e.to_string()))?;
    Ok(())
}
