//! Exclusive-selection state machine for flat mode.
//!
//! One integer parameter picks exactly one outfit: each outfit gets a motion
//! enabling its own target and disabling every other target, entered through
//! an any-state transition on `parameter == index`.

use crate::inventory::OutfitEntry;
use crate::keys::{sanitize_name, short_hash};
use crate::scene::{
    AnimatorLayer, AnimatorParameter, AnimatorParameterKind, AnimatorState, Asset, ConditionMode,
    ConstantCurve, Motion, NodeId, Result, SceneGraph, StateMachineAsset, Transition,
    TransitionCondition,
};
use crate::settings::GeneratorSettings;

pub const LAYER_NAME: &str = "ClosetSetLayer";
pub const STATE_MACHINE_NAME: &str = "ClosetStateMachine";
pub const MOTION_PREFIX: &str = "ACT_SET_";
pub const ACTIVE_PROPERTY: &str = "m_IsActive";
pub const CONTROLLER_SUFFIX: &str = "_ClosetFX.controller";

/// `<folder>/<avatar>_<hash8>_ClosetFX.controller`, hashed over the avatar's
/// full path and the outfit count.
pub fn controller_path(
    scene: &dyn SceneGraph,
    settings: &GeneratorSettings,
    avatar: NodeId,
    outfit_count: usize,
) -> Result<String> {
    let avatar_path = scene.full_path(avatar)?;
    let hash = short_hash(&format!("{avatar_path}|{outfit_count}"), 8);
    Ok(format!(
        "{}/{}_{hash}{CONTROLLER_SUFFIX}",
        settings.asset_folder.trim_end_matches('/'),
        sanitize_name(scene.name(avatar)?)
    ))
}

/// One outfit as the state machine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTarget {
    pub name: String,
    /// Path below the avatar root.
    pub path: String,
}

/// Create or rebuild the selection state machine for `outfits` and return
/// its asset path.
pub fn synthesize(
    scene: &mut dyn SceneGraph,
    settings: &GeneratorSettings,
    avatar: NodeId,
    outfits: &[OutfitEntry],
    parameter: &str,
) -> Result<String> {
    let view: &dyn SceneGraph = &*scene;
    let targets = outfits
        .iter()
        .filter_map(|outfit| outfit.target.map(|t| (outfit, t)))
        .map(|(outfit, target)| {
            Ok(SelectionTarget {
                name: outfit.effective_name(view),
                path: view.relative_path(avatar, target)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let path = controller_path(scene, settings, avatar, outfits.len())?;
    let fresh = || StateMachineAsset {
        name: path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .trim_end_matches(".controller")
            .to_string(),
        ..StateMachineAsset::default()
    };
    match scene.asset_mut(&path) {
        Some(Asset::StateMachine(existing)) => rebuild_state_machine(existing, parameter, &targets),
        _ => {
            let mut machine = fresh();
            rebuild_state_machine(&mut machine, parameter, &targets);
            scene.put_asset(&path, Asset::StateMachine(machine));
        }
    }
    scene.mark_asset_dirty(&path);
    Ok(path)
}

/// Destructive rebuild: parameters, states, transitions and generated
/// motions are replaced; the first layer and foreign motions survive.
pub fn rebuild_state_machine(
    machine: &mut StateMachineAsset,
    parameter: &str,
    targets: &[SelectionTarget],
) {
    machine.parameters = vec![AnimatorParameter {
        name: parameter.to_string(),
        kind: AnimatorParameterKind::Int,
    }];

    if machine.layers.is_empty() {
        machine.layers.push(AnimatorLayer {
            state_machine: STATE_MACHINE_NAME.to_string(),
            ..AnimatorLayer::default()
        });
    }
    machine.layers.truncate(1);
    let layer = &mut machine.layers[0];
    layer.name = LAYER_NAME.to_string();
    layer.default_weight = 1.0;
    layer.states.clear();
    layer.any_state_transitions.clear();
    layer.default_state = None;

    machine
        .motions
        .retain(|motion| !motion.name.starts_with(MOTION_PREFIX));

    for (index, target) in targets.iter().enumerate() {
        let motion_name = format!("{MOTION_PREFIX}{index}");
        machine.motions.push(Motion {
            name: motion_name.clone(),
            curves: targets
                .iter()
                .enumerate()
                .map(|(other, t)| ConstantCurve {
                    path: t.path.clone(),
                    property: ACTIVE_PROPERTY.to_string(),
                    start: 0.0,
                    end: 0.01,
                    value: if other == index { 1.0 } else { 0.0 },
                })
                .collect(),
        });

        let state_name = format!("Set_{index}_{}", sanitize_name(&target.name));
        layer.states.push(AnimatorState {
            name: state_name.clone(),
            motion: Some(motion_name),
        });
        if index == 0 {
            layer.default_state = Some(state_name.clone());
        }
        layer.any_state_transitions.push(Transition {
            destination: state_name,
            has_exit_time: false,
            has_fixed_duration: true,
            duration: 0.0,
            can_transition_to_self: false,
            conditions: vec![TransitionCondition {
                mode: ConditionMode::Equals,
                threshold: index as f32,
                parameter: parameter.to_string(),
            }],
        });
    }
}
