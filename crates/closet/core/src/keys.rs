//! Deterministic parameter keys, binding fingerprints and collision checks.

use crate::inventory::OutfitEntry;
use crate::scene::{Capability, CapabilityKind, NodeId, SceneGraph};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

const EMPTY: &str = "<empty>";
const NULL: &str = "<null>";

/// SHA-256 of `seed` as lowercase hex.
pub fn sha256_hex(seed: &str) -> String {
    hex::encode(Sha256::digest(seed.as_bytes()))
}

/// First `len` hex characters of the seed hash, uppercased.
pub fn short_hash(seed: &str, len: usize) -> String {
    let mut digest = sha256_hex(seed);
    digest.truncate(len);
    digest.to_ascii_uppercase()
}

fn normalized(text: &str) -> &str {
    let trimmed = text.trim();
    if trimmed.is_empty() { EMPTY } else { trimmed }
}

fn live(scene: &dyn SceneGraph, target: Option<NodeId>) -> Option<NodeId> {
    target.filter(|&t| scene.contains(t))
}

/// Every non-alphanumeric character becomes `_`; blank input becomes `Outfit`.
pub fn sanitize_name(value: &str) -> String {
    if value.trim().is_empty() {
        return "Outfit".to_string();
    }
    value
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// `ACT_` plus eight uppercase hex digits derived from the avatar name, the
/// target path, both labels and the entry's position.
pub fn parameter_key(
    scene: &dyn SceneGraph,
    avatar: NodeId,
    entry: &OutfitEntry,
    index: usize,
) -> String {
    let root_name = scene.name(avatar).unwrap_or("Avatar");
    let target_path = live(scene, entry.target)
        .and_then(|t| scene.path_from(avatar, t).ok())
        .unwrap_or_else(|| NULL.to_string());
    let seed = format!(
        "{root_name}|{target_path}|{}|{}|{index}",
        normalized(&entry.display_name),
        normalized(&entry.group_name)
    );
    format!("ACT_{}", short_hash(&seed, 8))
}

/// Hash of the material bindings of every renderer in the target's subtree.
pub fn binding_fingerprint(scene: &dyn SceneGraph, target: Option<NodeId>) -> String {
    let Some(target) = live(scene, target) else {
        return NULL.to_string();
    };
    let Ok(nodes) = scene.descendants(target) else {
        return NULL.to_string();
    };

    let mut material_text = String::new();
    for node in nodes {
        let Ok(Some(Capability::Renderer(binding))) =
            scene.capability(node, CapabilityKind::Renderer)
        else {
            continue;
        };
        material_text.push_str(&scene.full_path(node).unwrap_or_else(|_| NULL.to_string()));
        material_text.push('|');
        for slot in &binding.materials {
            let (material, texture) = match &slot.material {
                Some(material) => (
                    material.as_str(),
                    slot.texture.as_deref().unwrap_or("<null-tex>"),
                ),
                None => ("<null-mat>", "<null-tex>"),
            };
            material_text.push_str(material);
            material_text.push(':');
            material_text.push_str(texture);
            material_text.push(';');
        }
        material_text.push_str("||");
    }
    sha256_hex(&material_text)
}

/// `<prefix or ACT>_PART_<set>_<part>_<6 hex>`, hashed over the
/// avatar-relative paths of the root, set and part nodes.
pub fn part_parameter_name(
    namespace_prefix: &str,
    set_name: &str,
    part_name: &str,
    ids: [&str; 3],
) -> String {
    let prefix = if namespace_prefix.trim().is_empty() {
        "ACT"
    } else {
        namespace_prefix.trim()
    };
    let hash = short_hash(&ids.join("|"), 6);
    format!(
        "{prefix}_PART_{}_{}_{hash}",
        sanitize_name(set_name),
        sanitize_name(part_name)
    )
}

/// Identity of an entry for comparing two outfit lists as multisets.
pub fn outfit_signature(entry: &OutfitEntry) -> String {
    let target = entry
        .target
        .map_or_else(|| NULL.to_string(), |t| t.to_string());
    format!(
        "{target}|{}|{}",
        normalized(&entry.display_name),
        normalized(&entry.group_name)
    )
}

pub fn equivalent_outfits(a: &[OutfitEntry], b: &[OutfitEntry]) -> bool {
    let mut left: Vec<_> = a.iter().map(outfit_signature).collect();
    let mut right: Vec<_> = b.iter().map(outfit_signature).collect();
    left.sort();
    right.sort();
    left == right
}

/// Values occurring more than once, in first-seen order.
pub fn find_duplicates<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut order = Vec::new();
    for value in values {
        let value = value.into();
        let count = counts.entry(value.clone()).or_default();
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }
    order
        .into_iter()
        .filter(|v| counts.get(v).is_some_and(|&c| c > 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MaterialSlot, RendererBinding, Scene};
    use proptest::prelude::*;

    fn avatar_with_coat() -> (Scene, NodeId, NodeId) {
        let mut scene = Scene::new();
        let avatar = scene.create_root("Avatar").unwrap();
        let closet = scene.create_node(avatar, "Closet").unwrap();
        let coat = scene.create_node(closet, "Coat").unwrap();
        (scene, avatar, coat)
    }

    #[test]
    fn hashes_are_lowercase_hex_digests() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(short_hash("abc", 8), "BA7816BF");
    }

    #[test]
    fn key_is_stable_and_shaped() {
        let (scene, avatar, coat) = avatar_with_coat();
        let entry = OutfitEntry::new("Coat", coat);
        let key = parameter_key(&scene, avatar, &entry, 0);
        assert_eq!(key, parameter_key(&scene, avatar, &entry, 0));
        assert_eq!(key.len(), 12);
        assert!(key.starts_with("ACT_"));
        assert!(key[4..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

        let expected = format!(
            "ACT_{}",
            short_hash("Avatar|Avatar/Closet/Coat|Coat|<empty>|0", 8)
        );
        assert_eq!(key, expected);
    }

    #[test]
    fn every_input_changes_the_key() {
        let (mut scene, avatar, coat) = avatar_with_coat();
        let base = OutfitEntry::new("Coat", coat);
        let key = parameter_key(&scene, avatar, &base, 0);

        assert_ne!(key, parameter_key(&scene, avatar, &base, 1));
        assert_ne!(
            key,
            parameter_key(&scene, avatar, &OutfitEntry::new("Jacket", coat), 0)
        );
        assert_ne!(
            key,
            parameter_key(&scene, avatar, &base.clone().with_group("Winter"), 0)
        );
        scene.rename(coat, "Parka").unwrap();
        assert_ne!(key, parameter_key(&scene, avatar, &base, 0));
        scene.rename(coat, "Coat").unwrap();
        scene.rename(avatar, "Other").unwrap();
        assert_ne!(key, parameter_key(&scene, avatar, &base, 0));
    }

    #[test]
    fn blank_labels_normalize_to_the_same_key() {
        let (scene, avatar, coat) = avatar_with_coat();
        let a = OutfitEntry::new("  ", coat).with_group("");
        let b = OutfitEntry::new("", coat).with_group("\t");
        assert_eq!(
            parameter_key(&scene, avatar, &a, 3),
            parameter_key(&scene, avatar, &b, 3)
        );
    }

    #[test]
    fn fingerprint_tracks_materials() {
        let (mut scene, _, coat) = avatar_with_coat();
        let empty = binding_fingerprint(&scene, Some(coat));
        assert_eq!(empty, sha256_hex(""));

        scene
            .attach(
                coat,
                Capability::Renderer(RendererBinding {
                    materials: vec![
                        MaterialSlot {
                            material: Some("Wool".into()),
                            texture: Some("WoolTex".into()),
                        },
                        MaterialSlot::default(),
                    ],
                }),
            )
            .unwrap();
        assert_eq!(
            binding_fingerprint(&scene, Some(coat)),
            sha256_hex("Avatar/Closet/Coat|Wool:WoolTex;<null-mat>:<null-tex>;||")
        );

        scene.delete_node(coat).unwrap();
        assert_eq!(binding_fingerprint(&scene, Some(coat)), "<null>");
        assert_eq!(binding_fingerprint(&scene, None), "<null>");
    }

    #[test]
    fn part_names_are_sanitized() {
        let name = part_parameter_name("", "Set A", "Left-Sleeve", ["Closet", "Closet/A", "Closet/A/L"]);
        assert!(name.starts_with("ACT_PART_Set_A_Left_Sleeve_"));
        assert_eq!(name.len(), "ACT_PART_Set_A_Left_Sleeve_".len() + 6);
        assert_eq!(sanitize_name("   "), "Outfit");
    }

    #[test]
    fn signatures_compare_as_multisets() {
        let (_scene, _, coat) = avatar_with_coat();
        let a = OutfitEntry::new("Coat", coat);
        let b = OutfitEntry::new("Coat ", coat).with_group(" ");
        assert!(equivalent_outfits(&[a.clone(), b.clone()], &[b.clone(), a.clone()]));
        assert!(!equivalent_outfits(&[a.clone()], &[a.clone(), b]));
    }

    #[test]
    fn duplicates_keep_first_seen_order() {
        assert_eq!(
            find_duplicates(["b", "a", "b", "c", "a", "b"]),
            vec!["b".to_string(), "a".to_string()]
        );
        assert!(find_duplicates(Vec::<String>::new()).is_empty());
    }

    proptest! {
        #[test]
        fn sanitized_names_are_alphanumeric_or_underscore(input in ".{0,24}") {
            let out = sanitize_name(&input);
            prop_assert!(out.chars().all(|c| c.is_alphanumeric() || c == '_'));
            prop_assert!(!out.is_empty());
        }
    }
}
