//! Capability records attached to scene nodes.
//!
//! The closet's own tags and bookkeeping records are strongly typed. Records
//! owned by the integration framework are kept as [`Record`]s: a type name
//! plus a field map, written and read only through a framework adapter.
//!
//! Node references are generic over `R` so the same types serve the live
//! arena (`R = NodeId`) and the on-disk document (`R = String` paths).

use super::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Capability discriminant used for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    MenuRoot,
    OutfitSet,
    OutfitPart,
    ModuleMetadata,
    RegistrationStore,
    Renderer,
    Foreign(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capability<R = NodeId> {
    MenuRoot(MenuRootTag),
    OutfitSet(OutfitSetTag),
    OutfitPart(OutfitPartTag),
    ModuleMetadata(ModuleMetadata),
    RegistrationStore(RegistrationStore<R>),
    Renderer(RendererBinding),
    Foreign(Record<R>),
}

impl<R> Capability<R> {
    pub fn is(&self, kind: CapabilityKind) -> bool {
        match (self, kind) {
            (Self::MenuRoot(_), CapabilityKind::MenuRoot)
            | (Self::OutfitSet(_), CapabilityKind::OutfitSet)
            | (Self::OutfitPart(_), CapabilityKind::OutfitPart)
            | (Self::ModuleMetadata(_), CapabilityKind::ModuleMetadata)
            | (Self::RegistrationStore(_), CapabilityKind::RegistrationStore)
            | (Self::Renderer(_), CapabilityKind::Renderer) => true,
            (Self::Foreign(record), CapabilityKind::Foreign(type_name)) => {
                record.type_name == type_name
            }
            _ => false,
        }
    }

    /// Two capabilities occupy the same slot on a node.
    pub fn same_kind<S>(&self, other: &Capability<S>) -> bool {
        match (self, other) {
            (Self::Foreign(a), Capability::Foreign(b)) => a.type_name == b.type_name,
            _ => variant_index(self) == variant_index(other),
        }
    }

    /// Rewrite every node reference. References `f` cannot map become `None`.
    pub fn map_refs<S>(self, f: &mut impl FnMut(R) -> Option<S>) -> Capability<S> {
        match self {
            Self::MenuRoot(tag) => Capability::MenuRoot(tag),
            Self::OutfitSet(tag) => Capability::OutfitSet(tag),
            Self::OutfitPart(tag) => Capability::OutfitPart(tag),
            Self::ModuleMetadata(meta) => Capability::ModuleMetadata(meta),
            Self::Renderer(binding) => Capability::Renderer(binding),
            Self::RegistrationStore(store) => Capability::RegistrationStore(RegistrationStore {
                entries: store
                    .entries
                    .into_iter()
                    .map(|entry| RegistrationEntry {
                        display_name: entry.display_name,
                        target: entry.target.and_then(&mut *f),
                        group_name: entry.group_name,
                        parameter_key: entry.parameter_key,
                        binding_fingerprint: entry.binding_fingerprint,
                    })
                    .collect(),
            }),
            Self::Foreign(record) => Capability::Foreign(Record {
                type_name: record.type_name,
                fields: map_fields(record.fields, f),
            }),
        }
    }
}

fn variant_index<R>(cap: &Capability<R>) -> u8 {
    match cap {
        Capability::MenuRoot(_) => 0,
        Capability::OutfitSet(_) => 1,
        Capability::OutfitPart(_) => 2,
        Capability::ModuleMetadata(_) => 3,
        Capability::RegistrationStore(_) => 4,
        Capability::Renderer(_) => 5,
        Capability::Foreign(_) => 6,
    }
}

fn map_fields<R, S>(fields: Fields<R>, f: &mut impl FnMut(R) -> Option<S>) -> Fields<S> {
    fields
        .into_iter()
        .map(|(name, value)| (name, value.map_refs(f)))
        .collect()
}

/// Anchor of one independent inventory namespace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuRootTag {
    pub display_name: String,
    pub namespace_prefix: String,
    pub version: u32,
}

/// A group of alternatives under a menu root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutfitSetTag {
    pub set_index: i32,
    pub display_name: String,
    pub default_on: bool,
}

/// An independently toggleable sub-element of a set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutfitPartTag {
    pub display_name: String,
    pub default_on: bool,
}

/// Stamp written on every rebuilt module; drift detection compares it with
/// the running generator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleMetadata {
    pub schema_version: u32,
    pub generated_item_count: usize,
    pub generator_version: String,
    pub marker_id: String,
}

/// Persisted mirror of the last applied outfit mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
pub struct RegistrationStore<R = NodeId> {
    #[serde(default)]
    pub entries: Vec<RegistrationEntry<R>>,
}

impl<R> Default for RegistrationStore<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "R: Deserialize<'de>"))]
pub struct RegistrationEntry<R = NodeId> {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub target: Option<R>,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub parameter_key: String,
    #[serde(default)]
    pub binding_fingerprint: String,
}

/// Visual bindings of a renderer-bearing node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererBinding {
    pub materials: Vec<MaterialSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSlot {
    pub material: Option<String>,
    pub texture: Option<String>,
}

pub type Fields<R = NodeId> = BTreeMap<String, FieldValue<R>>;

/// A framework-owned capability record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<R = NodeId> {
    pub type_name: String,
    #[serde(default = "BTreeMap::new")]
    pub fields: Fields<R>,
}

impl<R> Record<R> {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, field: &str, value: FieldValue<R>) -> Self {
        self.fields.insert(field.to_string(), value);
        self
    }

    pub fn set(&mut self, field: &str, value: FieldValue<R>) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue<R>> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field)? {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn bool(&self, field: &str) -> Option<bool> {
        match self.fields.get(field)? {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        match self.fields.get(field)? {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn asset(&self, field: &str) -> Option<&str> {
        match self.fields.get(field)? {
            FieldValue::Asset(path) => path.as_deref(),
            _ => None,
        }
    }

    pub fn list(&self, field: &str) -> Option<&[Fields<R>]> {
        match self.fields.get(field)? {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }
}

impl<R: Copy> Record<R> {
    pub fn node(&self, field: &str) -> Option<R> {
        match self.fields.get(field)? {
            FieldValue::Node(node) => *node,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue<R = NodeId> {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Node(Option<R>),
    Asset(Option<String>),
    List(Vec<Fields<R>>),
}

impl<R> FieldValue<R> {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn map_refs<S>(self, f: &mut impl FnMut(R) -> Option<S>) -> FieldValue<S> {
        match self {
            Self::Text(s) => FieldValue::Text(s),
            Self::Bool(b) => FieldValue::Bool(b),
            Self::Int(i) => FieldValue::Int(i),
            Self::Float(x) => FieldValue::Float(x),
            Self::Node(node) => FieldValue::Node(node.and_then(&mut *f)),
            Self::Asset(path) => FieldValue::Asset(path),
            Self::List(items) => {
                FieldValue::List(items.into_iter().map(|item| map_fields(item, f)).collect())
            }
        }
    }
}
