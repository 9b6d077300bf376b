//! Animation controller data model
//!
//! A controller is an ordered list of layers sharing one parameter table.
//! Each layer owns a state machine, an optional mask, and, before
//! normalization, may point at another layer it is synced with.
//!
//! Hosts hand controllers over possibly wrapped in override controllers,
//! which swap animation clips without changing structure. See
//! [`RuntimeController`].
//!
//! ## Submodules
//!
//! - `state_machine` - states, motions, transitions and deep copies
//! - `mask` - body-part/transform masks and their intersection
//! - `params` - parameter values, typed handles, built-in checks
//! - `layer` - [`VfLayer`], an addressable view of one layer
//! - `vf` - [`VfController`], loading/normalization and parameter creation

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub mod layer;
pub mod mask;
pub mod params;
pub mod state_machine;
pub mod vf;

pub use layer::VfLayer;
pub use mask::{AvatarMask, BodyPart};
pub use params::{
    AnimParam, BoolParam, BuiltinParamTypes, FloatParam, IntParam, NumberParam, ParamFilter,
    Parameter, ParameterKind, ParameterValue,
};
pub use state_machine::{Behaviour, Motion, State, StateId, StateMachine};
pub use vf::VfController;

/// Which playable layer of the avatar a controller drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    Base,
    Additive,
    Gesture,
    Action,
    Fx,
    Sitting,
    TPose,
    IkPose,
}

impl std::str::FromStr for LayerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" => Ok(LayerType::Base),
            "additive" => Ok(LayerType::Additive),
            "gesture" => Ok(LayerType::Gesture),
            "action" => Ok(LayerType::Action),
            "fx" => Ok(LayerType::Fx),
            "sitting" => Ok(LayerType::Sitting),
            "tpose" | "t_pose" => Ok(LayerType::TPose),
            "ikpose" | "ik_pose" => Ok(LayerType::IkPose),
            other => Err(format!("unknown layer type '{}'", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendingMode {
    #[default]
    Override,
    Additive,
}

fn default_weight() -> f32 {
    1.0
}

/// One layer of a controller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControllerLayer {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub blending: BlendingMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<AvatarMask>,
    /// `None` only in malformed host data; repaired during load
    #[serde(default)]
    pub state_machine: Option<StateMachine>,
    /// Layer whose state machine this layer reuses. Always `None` after load.
    #[serde(
        default,
        deserialize_with = "deserialize_synced_index",
        skip_serializing_if = "Option::is_none"
    )]
    pub synced_layer_index: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub synced_motion_overrides: BTreeMap<StateId, Motion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub synced_behaviour_overrides: BTreeMap<StateId, Vec<Behaviour>>,
}

/// Hosts write `-1` for "not synced"; every negative index means none.
fn deserialize_synced_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let index: Option<i64> = Option::deserialize(deserializer)?;
    Ok(index.and_then(|i| usize::try_from(i).ok()))
}

impl ControllerLayer {
    /// A fully weighted layer with an empty state machine.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            state_machine: Some(StateMachine::new(name.clone())),
            name,
            weight: 1.0,
            blending: BlendingMode::Override,
            mask: None,
            synced_layer_index: None,
            synced_motion_overrides: BTreeMap::new(),
            synced_behaviour_overrides: BTreeMap::new(),
        }
    }
}

/// The structural animation graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorController {
    pub name: String,
    pub layers: Vec<ControllerLayer>,
    pub parameters: Vec<Parameter>,
}

/// A clip-swapping wrapper around another runtime controller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideController {
    pub name: String,
    /// Original clip name to replacement clip name
    pub overrides: BTreeMap<String, String>,
    pub controller: Option<Box<RuntimeController>>,
}

/// Whatever a host assigns to an avatar's playable layer slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeController {
    Controller(AnimatorController),
    Override(OverrideController),
    /// Some other runtime controller type the engine cannot work with
    Unsupported(String),
}

impl RuntimeController {
    /// Peel one override layer off.
    ///
    /// Returns the override's clip map and whatever it wraps, or gives `self`
    /// back unchanged if it is not an override.
    #[allow(clippy::type_complexity)]
    pub fn split_override(
        self,
    ) -> Result<(BTreeMap<String, String>, Option<RuntimeController>), RuntimeController> {
        match self {
            RuntimeController::Override(ov) => Ok((ov.overrides, ov.controller.map(|c| *c))),
            other => Err(other),
        }
    }
}
