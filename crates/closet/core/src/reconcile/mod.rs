//! Repair and Apply stages.
//!
//! Both stages mutate the scene only inside one undo group. A stage that
//! fails reverts its group and reports an Error message instead of
//! returning `Err`.

mod rebuild;

use crate::error::{ReconcileError, Result};
use crate::generated;
use crate::inventory::{self, Inventory, OutfitEntry};
use crate::keys;
use crate::message::{MessageLog, codes};
use crate::pipeline::{ClosetPipeline, PipelineRequest};
use crate::scene::{CapabilityKind, NodeId, SceneGraph};
use crate::selection;
use crate::validate::ValidationResult;
use tracing::{debug, info, warn};

/// Where flat-mode outfits came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutfitSource {
    Caller,
    Store,
}

/// The outfit set the Repair stage settled on. Only a Repair stage that
/// did not fail produces one, and Apply requires one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectiveOutfits {
    /// Tagged-tree mode; `outfits` holds one entry per set.
    Hierarchical {
        inventory: Inventory,
        outfits: Vec<OutfitEntry>,
    },
    Flat {
        source: OutfitSource,
        outfits: Vec<OutfitEntry>,
    },
}

impl EffectiveOutfits {
    pub fn outfits(&self) -> &[OutfitEntry] {
        match self {
            Self::Hierarchical { outfits, .. } | Self::Flat { outfits, .. } => outfits,
        }
    }

    pub const fn is_hierarchical(&self) -> bool {
        matches!(self, Self::Hierarchical { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairResult {
    pub has_error: bool,
    pub did_repair: bool,
    pub effective: Option<EffectiveOutfits>,
    pub messages: MessageLog,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub applied: bool,
    pub module: Option<NodeId>,
    pub messages: MessageLog,
}

impl ClosetPipeline {
    /// Pick the effective outfits: tagged tree, else caller list, else the
    /// registration record. Caller and record must agree when both exist.
    pub fn resolve_outfits(
        &self,
        scene: &dyn SceneGraph,
        request: &PipelineRequest,
    ) -> Result<EffectiveOutfits> {
        let avatar = request
            .avatar
            .filter(|&a| scene.contains(a))
            .ok_or(ReconcileError::AvatarMissing)?;

        let inventory = inventory::collect(scene, avatar)?;
        if inventory.drives_generation() {
            let outfits = inventory.outfit_entries();
            return Ok(EffectiveOutfits::Hierarchical { inventory, outfits });
        }

        let caller = inventory::normalize(scene, &request.outfits);
        let stored = match generated::find_store(scene, avatar)? {
            Some(holder) => generated::read_store(scene, holder)?
                .map(|store| generated::stored_outfits(scene, store))
                .unwrap_or_default(),
            None => Vec::new(),
        };

        if !caller.is_empty() && !stored.is_empty() && !keys::equivalent_outfits(&caller, &stored) {
            return Err(ReconcileError::SourceConflict {
                caller: caller.len(),
                stored: stored.len(),
            });
        }

        if !caller.is_empty() {
            Ok(EffectiveOutfits::Flat {
                source: OutfitSource::Caller,
                outfits: caller,
            })
        } else if !stored.is_empty() {
            Ok(EffectiveOutfits::Flat {
                source: OutfitSource::Store,
                outfits: stored,
            })
        } else {
            Err(ReconcileError::NoOutfitSource)
        }
    }

    pub fn repair_if_needed(
        &self,
        scene: &mut dyn SceneGraph,
        request: &PipelineRequest,
        validation: &ValidationResult,
    ) -> RepairResult {
        let mut result = RepairResult::default();

        let effective = match self.resolve_outfits(scene, request) {
            Ok(effective) => effective,
            Err(e) => {
                warn!(error = %e, "Could not determine effective outfits");
                result.has_error = true;
                result
                    .messages
                    .error(codes::REPAIR_FAILED, format!("Repair failed: {e}"));
                return result;
            }
        };

        if !validation.needs_repair {
            result.messages.info(codes::REPAIR_SKIPPED, "No repair needed.");
            result.effective = Some(effective);
            return result;
        }

        // resolve_outfits already proved the avatar is live.
        let Some(avatar) = request.avatar else {
            return result;
        };

        let group = scene.begin_group("Repair Avatar Closet Module");
        match self.recreate_module(scene, avatar, &effective) {
            Ok(module) => {
                scene.collapse_group(group);
                info!(%module, "Recreated generated module");
                result.did_repair = true;
                result.messages.info(
                    codes::REPAIR_DONE,
                    format!(
                        "Repair completed by recreating {}.",
                        self.settings.module_name
                    ),
                );
                result.effective = Some(effective);
            }
            Err(e) => {
                scene.revert_group(group);
                warn!(error = %e, "Repair failed; scene restored");
                result.has_error = true;
                result
                    .messages
                    .error(codes::REPAIR_FAILED, format!("Repair failed: {e}"));
            }
        }
        result
    }

    fn recreate_module(
        &self,
        scene: &mut dyn SceneGraph,
        avatar: NodeId,
        effective: &EffectiveOutfits,
    ) -> Result<NodeId> {
        let candidates = generated::module_candidates(scene, avatar, &self.settings)?;
        let previous = self.referenced_controllers(scene, &candidates)?;
        for candidate in candidates {
            scene.delete_node(candidate)?;
        }
        let module = scene.create_node(avatar, &self.settings.module_name)?;
        rebuild::rebuild_module(
            scene,
            self.adapter.as_ref(),
            &self.settings,
            avatar,
            module,
            effective,
        )?;
        self.drop_stale_controllers(scene, module, previous)?;
        generated::write_store(scene, avatar, &self.settings, effective.outfits())?;
        scene.mark_dirty(avatar)?;
        Ok(module)
    }

    pub fn apply(
        &self,
        scene: &mut dyn SceneGraph,
        avatar: NodeId,
        effective: &EffectiveOutfits,
    ) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        if let Err(e) = check_applicable(scene, avatar, effective) {
            outcome
                .messages
                .error(codes::APPLY_FAILED, format!("Apply failed: {e}"));
            return outcome;
        }

        let group = scene.begin_group("Apply Avatar Closet Module");
        match self.update_module(scene, avatar, effective) {
            Ok(module) => {
                scene.collapse_group(group);
                debug!(%module, "Applied generated module");
                outcome.applied = true;
                outcome.module = Some(module);
                outcome.messages.info(
                    codes::APPLY_DONE,
                    "Apply completed. Module updated idempotently.",
                );
            }
            Err(e) => {
                scene.revert_group(group);
                warn!(error = %e, "Apply failed; scene restored");
                outcome
                    .messages
                    .error(codes::APPLY_FAILED, format!("Apply failed: {e}"));
            }
        }
        outcome
    }

    fn update_module(
        &self,
        scene: &mut dyn SceneGraph,
        avatar: NodeId,
        effective: &EffectiveOutfits,
    ) -> Result<NodeId> {
        let candidates = generated::module_candidates(scene, avatar, &self.settings)?;
        let previous = self.referenced_controllers(scene, &candidates)?;
        let module = match candidates.split_first() {
            Some((&first, extras)) => {
                for &extra in extras {
                    scene.delete_node(extra)?;
                }
                first
            }
            None => scene.create_node(avatar, &self.settings.module_name)?,
        };

        let outfits = inventory::normalize(scene, effective.outfits());
        let effective = match effective {
            EffectiveOutfits::Hierarchical { inventory, .. } => EffectiveOutfits::Hierarchical {
                inventory: inventory.clone(),
                outfits,
            },
            EffectiveOutfits::Flat { source, .. } => EffectiveOutfits::Flat {
                source: *source,
                outfits,
            },
        };

        rebuild::rebuild_module(
            scene,
            self.adapter.as_ref(),
            &self.settings,
            avatar,
            module,
            &effective,
        )?;
        self.drop_stale_controllers(scene, module, previous)?;
        generated::write_store(scene, avatar, &self.settings, effective.outfits())?;
        scene.mark_dirty(avatar)?;
        Ok(module)
    }

    /// Controller assets referenced by the animator merges on `modules`.
    fn referenced_controllers(
        &self,
        scene: &dyn SceneGraph,
        modules: &[NodeId],
    ) -> Result<Vec<String>> {
        let mut paths = Vec::new();
        for &module in modules {
            if let Some(path) = self.adapter.read_animator_merge(scene, module)?
                && !paths.contains(&path)
            {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    /// Delete generated controllers the rebuilt `module` no longer references.
    fn drop_stale_controllers(
        &self,
        scene: &mut dyn SceneGraph,
        module: NodeId,
        previous: Vec<String>,
    ) -> Result<()> {
        let current = self.adapter.read_animator_merge(scene, module)?;
        for path in previous {
            if current.as_deref() == Some(path.as_str())
                || !path.ends_with(selection::CONTROLLER_SUFFIX)
            {
                continue;
            }
            if scene.delete_asset(&path).is_some() {
                debug!(%path, "Deleted stale controller asset");
            }
        }
        Ok(())
    }

    /// Delete the registration record so the next run takes the caller's
    /// list. Returns whether a record existed.
    pub fn forget_registration(&self, scene: &mut dyn SceneGraph, avatar: NodeId) -> Result<bool> {
        if !scene.contains(avatar) {
            return Err(ReconcileError::AvatarMissing);
        }
        let Some(holder) = generated::find_store(scene, avatar)? else {
            return Ok(false);
        };

        let group = scene.begin_group("Forget Avatar Closet Registration");
        let removed = if holder == avatar {
            scene
                .detach(holder, CapabilityKind::RegistrationStore)
                .map(|_| ())
        } else {
            scene.delete_node(holder)
        };
        match removed {
            Ok(()) => {
                scene.mark_dirty(avatar)?;
                scene.collapse_group(group);
                info!("Forgot closet registration record");
                Ok(true)
            }
            Err(e) => {
                scene.revert_group(group);
                Err(e.into())
            }
        }
    }
}

fn check_applicable(
    scene: &dyn SceneGraph,
    avatar: NodeId,
    effective: &EffectiveOutfits,
) -> Result<()> {
    if !scene.contains(avatar) {
        return Err(ReconcileError::AvatarMissing);
    }
    let outfits = inventory::normalize(scene, effective.outfits());
    if outfits.is_empty() {
        return Err(ReconcileError::NothingToApply);
    }
    for outfit in &outfits {
        let inside = match outfit.target {
            Some(target) => scene.is_descendant_of(target, avatar)?,
            None => false,
        };
        if !inside {
            return Err(ReconcileError::TargetOutsideAvatar {
                outfit: outfit.effective_name(scene),
            });
        }
    }
    Ok(())
}
