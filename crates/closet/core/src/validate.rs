//! Structural and drift diagnosis. Reports through messages only.

use crate::generated;
use crate::inventory::{self, Inventory, OutfitEntry};
use crate::keys;
use crate::message::{MessageLog, codes};
use crate::pipeline::{ClosetPipeline, PipelineRequest};
use crate::scene::{CapabilityKind, NodeId, SceneGraph};
use crate::settings::{MODULE_MARKER, MODULE_SCHEMA_VERSION};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub has_error: bool,
    pub has_warning: bool,
    pub needs_repair: bool,
    pub messages: MessageLog,
}

impl ValidationResult {
    fn fatal(mut self, code: &'static str, text: impl Into<String>) -> Self {
        self.messages.error(code, text);
        self.has_error = true;
        self
    }
}

impl ClosetPipeline {
    pub fn validate(&self, scene: &dyn SceneGraph, request: &PipelineRequest) -> ValidationResult {
        let result = ValidationResult::default();

        if let Some(missing) = self.adapter.first_missing(scene) {
            return result.fatal(codes::FRAMEWORK_MISSING, missing.to_string());
        }

        let Some(avatar) = request.avatar.filter(|&a| scene.contains(a)) else {
            return result.fatal(codes::AVATAR_MISSING, "Avatar root is missing.");
        };

        match self.validate_tree(scene, avatar, request, result) {
            Ok(mut result) => {
                result.has_error = result.messages.has_error();
                result.has_warning = result.messages.has_warning();
                if !result.has_error && !result.has_warning {
                    result
                        .messages
                        .info(codes::VALIDATION_PASSED, "OK - validation passed.");
                }
                result
            }
            // Stale handle found mid-walk.
            Err(e) => ValidationResult::default().fatal(codes::AVATAR_MISSING, e.to_string()),
        }
    }

    fn validate_tree(
        &self,
        scene: &dyn SceneGraph,
        avatar: NodeId,
        request: &PipelineRequest,
        mut result: ValidationResult,
    ) -> crate::scene::Result<ValidationResult> {
        let messages = &mut result.messages;

        let closet = match request.closet {
            Some(closet) if !scene.contains(closet) => {
                messages.error(codes::CLOSET_INVALID, "Closet root is missing.");
                None
            }
            Some(closet) => {
                if closet == avatar || scene.is_descendant_of(closet, avatar)? {
                    Some(closet)
                } else {
                    messages.error(
                        codes::CLOSET_INVALID,
                        "Closet root must be under the avatar root hierarchy.",
                    );
                    None
                }
            }
            None => None,
        };

        let inventory = inventory::collect(scene, avatar)?;
        check_hierarchy(scene, avatar, &inventory, messages)?;

        let caller = inventory::normalize(scene, &request.outfits);
        let stored = match generated::find_store(scene, avatar)? {
            Some(holder) => generated::read_store(scene, holder)?
                .map(|store| generated::stored_outfits(scene, store))
                .unwrap_or_default(),
            None => Vec::new(),
        };
        if !inventory.drives_generation() && request.outfits.is_empty() && stored.is_empty() {
            messages.error(
                codes::NOTHING_TO_GENERATE,
                "Nothing to generate: no ClosetOutfitSet under a ClosetMenuRoot, no outfit list and no usable registration entries.",
            );
            return Ok(result);
        }

        for (index, outfit) in request.outfits.iter().enumerate() {
            let Some(target) = outfit.target.filter(|&t| scene.contains(t)) else {
                messages.error(
                    codes::TARGET_MISSING,
                    format!("Outfit #{} target is missing.", index + 1),
                );
                continue;
            };
            let name = outfit.effective_name(scene);
            if !scene.is_descendant_of(target, avatar)? {
                messages.error(
                    codes::TARGET_OUTSIDE_AVATAR,
                    format!("Outfit '{name}' target is outside the avatar root hierarchy."),
                );
            }
            if let Some(closet) = closet
                && scene.parent(target)? != Some(closet)
            {
                messages.error(
                    codes::TARGET_NOT_IN_CLOSET,
                    format!("Outfit '{name}' target must be a direct child of the closet root."),
                );
            }
        }

        let candidates = if inventory.drives_generation() {
            inventory.outfit_entries()
        } else if !caller.is_empty() {
            caller
        } else {
            stored
        };
        check_collisions(scene, avatar, &inventory, &candidates, messages);

        let needs_repair = self.diagnose_drift(scene, avatar, messages)?;
        result.needs_repair = needs_repair;
        Ok(result)
    }

    /// Compare the existing module and record with what a rebuild would
    /// produce. Returns whether a repair is needed.
    fn diagnose_drift(
        &self,
        scene: &dyn SceneGraph,
        avatar: NodeId,
        messages: &mut MessageLog,
    ) -> crate::scene::Result<bool> {
        let module_name = &self.settings.module_name;
        let modules = generated::module_candidates(scene, avatar, &self.settings)?;
        let mut needs_repair = false;

        if modules.len() > 1 {
            debug!(count = modules.len(), "Duplicate generated modules");
            needs_repair = true;
            messages.warning(
                codes::DUPLICATE_MODULE,
                format!("Duplicate {module_name} objects detected. Repair is required."),
            );
        }

        let Some(&module) = modules.first() else {
            return Ok(needs_repair);
        };

        match generated::read_metadata(scene, module)? {
            None => {
                needs_repair = true;
                messages.warning(
                    codes::METADATA_MISSING,
                    "Module metadata is missing. Repair is required.",
                );
            }
            Some(meta) => {
                if meta.schema_version != MODULE_SCHEMA_VERSION {
                    debug!(found = meta.schema_version, "Outdated module schema");
                    needs_repair = true;
                    messages.warning(
                        codes::SCHEMA_OUTDATED,
                        "Module schema version is outdated. Repair is required.",
                    );
                }
                if meta.marker_id != MODULE_MARKER {
                    debug!(found = %meta.marker_id, "Module marker mismatch");
                    needs_repair = true;
                    messages.warning(
                        codes::MARKER_MISMATCH,
                        "Module marker mismatch detected. Repair is required.",
                    );
                }
            }
        }

        let wired = generated::has_expected_wiring(scene, self.adapter.as_ref(), module)
            .unwrap_or_else(|e| {
                warn!(error = %e, "Could not inspect module wiring");
                false
            });
        if !wired {
            needs_repair = true;
            messages.warning(
                codes::STRUCTURE_DRIFT,
                "Module structure is not as expected. Repair is required.",
            );
        }

        let healthy_store = match generated::find_store(scene, avatar)? {
            Some(holder) => generated::read_store(scene, holder)?
                .is_some_and(|store| generated::store_is_healthy(scene, store)),
            None => false,
        };
        if !healthy_store {
            needs_repair = true;
            messages.warning(
                codes::STORE_UNHEALTHY,
                "Registration store is missing or corrupted while the module exists. Repair is required.",
            );
        }

        debug!(needs_repair, "Drift diagnosis complete");
        Ok(needs_repair)
    }
}

fn check_hierarchy(
    scene: &dyn SceneGraph,
    avatar: NodeId,
    inventory: &Inventory,
    messages: &mut MessageLog,
) -> crate::scene::Result<()> {
    for set in scene.descendants_with(avatar, CapabilityKind::OutfitSet)? {
        if scene.ancestor_with(set, CapabilityKind::MenuRoot)?.is_none() {
            messages.error(
                codes::SET_ORPHAN,
                format!("OutfitSet '{}' is not under ClosetMenuRoot.", scene.name(set)?),
            );
        }
    }

    for part in scene.descendants_with(avatar, CapabilityKind::OutfitPart)? {
        if scene.ancestor_with(part, CapabilityKind::OutfitSet)?.is_none() {
            messages.error(
                codes::PART_ORPHAN,
                format!("OutfitPart '{}' is not under ClosetOutfitSet.", scene.name(part)?),
            );
        }
    }

    for root in &inventory.roots {
        if root.sets.is_empty() {
            messages.warning(
                codes::ROOT_EMPTY,
                format!("ClosetMenuRoot '{}' has no OutfitSet.", root.display_name),
            );
            continue;
        }
        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        for set in &root.sets {
            *counts.entry(set.set_index).or_default() += 1;
        }
        for (index, count) in counts {
            if count > 1 {
                messages.error(
                    codes::DUPLICATE_SET_INDEX,
                    format!(
                        "ClosetMenuRoot '{}' has duplicate setIndex '{index}'.",
                        root.display_name
                    ),
                );
            }
        }
    }
    Ok(())
}

fn check_collisions(
    scene: &dyn SceneGraph,
    avatar: NodeId,
    inventory: &Inventory,
    candidates: &[OutfitEntry],
    messages: &mut MessageLog,
) {
    let keys = candidates
        .iter()
        .enumerate()
        .map(|(index, outfit)| keys::parameter_key(scene, avatar, outfit, index));
    for key in keys::find_duplicates(keys) {
        messages.error(
            codes::KEY_COLLISION,
            format!("Parameter key collision detected: {key}"),
        );
    }

    for name in keys::find_duplicates(inventory.generated_parameters()) {
        messages.error(
            codes::KEY_COLLISION,
            format!("Generated parameter name collision detected: {name}"),
        );
    }
}
