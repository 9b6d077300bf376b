//! Controller parameters
//!
//! Parameters are identified by name. The typed handles returned by
//! `VfController::new_bool` and friends only carry that name, but they let
//! callers say what kind of parameter a menu control expects: a slider cannot
//! be bound to a bool.

use log::warn;
use serde::{Deserialize, Serialize};

use super::VfController;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    Trigger,
    Bool,
    Float,
    Int,
}

/// A parameter's kind together with its default value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    Trigger,
    Bool(bool),
    Float(f32),
    Int(i32),
}

impl ParameterValue {
    pub fn kind(&self) -> ParameterKind {
        match self {
            ParameterValue::Trigger => ParameterKind::Trigger,
            ParameterValue::Bool(_) => ParameterKind::Bool,
            ParameterValue::Float(_) => ParameterKind::Float,
            ParameterValue::Int(_) => ParameterKind::Int,
        }
    }

    /// The zero value of a kind.
    pub fn zero(kind: ParameterKind) -> Self {
        match kind {
            ParameterKind::Trigger => ParameterValue::Trigger,
            ParameterKind::Bool => ParameterValue::Bool(false),
            ParameterKind::Float => ParameterValue::Float(0.0),
            ParameterKind::Int => ParameterValue::Int(0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "default")]
    pub value: ParameterValue,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: ParameterValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn kind(&self) -> ParameterKind {
        self.value.kind()
    }
}

/// Anything that names a controller parameter.
pub trait AnimParam {
    fn name(&self) -> &str;
}

/// A parameter that holds a number (float or int).
pub trait NumberParam: AnimParam {}

macro_rules! param_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }
        }

        impl AnimParam for $name {
            fn name(&self) -> &str {
                &self.0
            }
        }
    };
}

param_handle!(
    /// Handle to a bool (or trigger) parameter.
    BoolParam
);
param_handle!(
    /// Handle to a float parameter.
    FloatParam
);
param_handle!(
    /// Handle to an int parameter.
    IntParam
);

impl NumberParam for FloatParam {}
impl NumberParam for IntParam {}

/// Removes parameters a controller must not contain. Runs at the end of load.
pub trait ParamFilter {
    fn strip_invalid(&self, controller: &mut VfController);
}

/// Built-in parameters the runtime fills in itself, with their required kind.
pub const BUILTIN_PARAMS: &[(&str, ParameterKind)] = &[
    ("IsLocal", ParameterKind::Bool),
    ("Viseme", ParameterKind::Int),
    ("Voice", ParameterKind::Float),
    ("GestureLeft", ParameterKind::Int),
    ("GestureRight", ParameterKind::Int),
    ("GestureLeftWeight", ParameterKind::Float),
    ("GestureRightWeight", ParameterKind::Float),
    ("AngularY", ParameterKind::Float),
    ("VelocityX", ParameterKind::Float),
    ("VelocityY", ParameterKind::Float),
    ("VelocityZ", ParameterKind::Float),
    ("VelocityMagnitude", ParameterKind::Float),
    ("Upright", ParameterKind::Float),
    ("Grounded", ParameterKind::Bool),
    ("Seated", ParameterKind::Bool),
    ("AFK", ParameterKind::Bool),
    ("TrackingType", ParameterKind::Int),
    ("VRMode", ParameterKind::Int),
    ("MuteSelf", ParameterKind::Bool),
    ("InStation", ParameterKind::Bool),
    ("Earmuffs", ParameterKind::Bool),
    ("IsOnFriendsList", ParameterKind::Bool),
    ("AvatarVersion", ParameterKind::Int),
    ("ScaleModified", ParameterKind::Bool),
    ("ScaleFactor", ParameterKind::Float),
    ("ScaleFactorInverse", ParameterKind::Float),
    ("EyeHeightAsMeters", ParameterKind::Float),
    ("EyeHeightAsPercent", ParameterKind::Float),
];

/// Strips parameters that reuse a built-in name with the wrong kind.
///
/// The runtime refuses to drive a built-in whose declared kind differs from
/// its own, and the whole controller misbehaves when it does.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinParamTypes;

impl BuiltinParamTypes {
    pub fn expected_kind(name: &str) -> Option<ParameterKind> {
        BUILTIN_PARAMS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, kind)| *kind)
    }
}

impl ParamFilter for BuiltinParamTypes {
    fn strip_invalid(&self, controller: &mut VfController) {
        let mut params = controller.parameters().to_vec();
        params.retain(|param| match Self::expected_kind(&param.name) {
            Some(expected) if expected != param.kind() => {
                warn!(
                    "Removing parameter '{}' from {}: declared {:?} but the built-in is {:?}",
                    param.name,
                    controller.name(),
                    param.kind(),
                    expected
                );
                false
            }
            _ => true,
        });
        controller.set_parameters(params);
    }
}

/// A filter that keeps every parameter.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepAllParams;

impl ParamFilter for KeepAllParams {
    fn strip_invalid(&self, _controller: &mut VfController) {}
}
