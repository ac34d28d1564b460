//! Host assets written by the generator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Asset {
    StateMachine(StateMachineAsset),
    /// Any asset type the closet does not interpret.
    Opaque { type_name: String },
}

impl Asset {
    pub fn as_state_machine(&self) -> Option<&StateMachineAsset> {
        match self {
            Self::StateMachine(sm) => Some(sm),
            Self::Opaque { .. } => None,
        }
    }

    pub fn as_state_machine_mut(&mut self) -> Option<&mut StateMachineAsset> {
        match self {
            Self::StateMachine(sm) => Some(sm),
            Self::Opaque { .. } => None,
        }
    }
}

/// An animator-style state machine with its embedded motion sub-assets.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateMachineAsset {
    pub name: String,
    pub parameters: Vec<AnimatorParameter>,
    pub layers: Vec<AnimatorLayer>,
    pub motions: Vec<Motion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatorParameter {
    pub name: String,
    pub kind: AnimatorParameterKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimatorParameterKind {
    Int,
    Bool,
    Float,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorLayer {
    pub name: String,
    pub state_machine: String,
    pub default_weight: f32,
    pub states: Vec<AnimatorState>,
    pub any_state_transitions: Vec<Transition>,
    pub default_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimatorState {
    pub name: String,
    pub motion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub destination: String,
    pub has_exit_time: bool,
    pub has_fixed_duration: bool,
    pub duration: f32,
    pub can_transition_to_self: bool,
    pub conditions: Vec<TransitionCondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionCondition {
    pub mode: ConditionMode,
    pub threshold: f32,
    pub parameter: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionMode {
    Equals,
    NotEqual,
    Greater,
    Less,
}

/// A motion made of constant curves.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Motion {
    pub name: String,
    pub curves: Vec<ConstantCurve>,
}

/// A curve holding `value` from `start` to `end` on `property` of the node at
/// `path` (relative to the animated root).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantCurve {
    pub path: String,
    pub property: String,
    pub start: f32,
    pub end: f32,
    pub value: f32,
}
