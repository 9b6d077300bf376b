//! Controller loading and normalization
//!
//! [`VfController::copy_and_load`] turns whatever a host assigned to a
//! playable layer into a controller that features can safely edit:
//!
//! 1. Override controllers are peeled off and remembered.
//! 2. Layers with no state machine get an empty one, so layer indexes stay
//!    put.
//! 3. Synced layers are replaced by real copies of the layer they mirror,
//!    with their per-state overrides baked in.
//! 4. The remembered clip overrides are applied to every motion.
//! 5. Layer 0's weight is set to 1, which is how the runtime treats it anyway.
//! 6. Layer 0's mask is applied to every other layer.
//! 7. Parameters the runtime would reject are stripped.
//!
//! None of the repairs are errors. A host slot that does not lead to a
//! controller at all loads as `None`.

use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::layer::VfLayer;
use super::mask::AvatarMask;
use super::params::{
    BoolParam, BuiltinParamTypes, FloatParam, IntParam, ParamFilter, Parameter, ParameterValue,
};
use super::state_machine::{MachineCopy, StateId, StateIdAllocator, StateMachine};
use super::{AnimatorController, ControllerLayer, LayerType, RuntimeController};
use crate::error::{Error, Result};

/// A normalized, editable controller.
///
/// Equality is structural.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VfController {
    ctrl: AnimatorController,
}

impl From<AnimatorController> for VfController {
    fn from(ctrl: AnimatorController) -> Self {
        Self { ctrl }
    }
}

impl VfController {
    /// An empty controller with no layers or parameters.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            ctrl: AnimatorController {
                name: name.into(),
                ..AnimatorController::default()
            },
        }
    }

    pub fn raw(&self) -> &AnimatorController {
        &self.ctrl
    }

    pub fn into_raw(self) -> AnimatorController {
        self.ctrl
    }

    pub fn name(&self) -> &str {
        &self.ctrl.name
    }

    /// Load a copy of `source`, normalized, with built-in parameter checks.
    pub fn copy_and_load(source: Option<&RuntimeController>, layer_type: LayerType) -> Option<Self> {
        Self::copy_and_load_with(source, layer_type, &BuiltinParamTypes)
    }

    /// Load a copy of `source`, normalized, stripping parameters with `filter`.
    ///
    /// The host's data is never modified.
    pub fn copy_and_load_with(
        source: Option<&RuntimeController>,
        layer_type: LayerType,
        filter: &dyn ParamFilter,
    ) -> Option<Self> {
        let mut current = source?.clone();

        let mut overrides = Vec::new();
        let ctrl = loop {
            current = match current.split_override() {
                Ok((clips, Some(inner))) => {
                    overrides.push(clips);
                    inner
                }
                Ok((_, None)) => {
                    debug!("Override controller wraps nothing; skipping {:?} layer", layer_type);
                    return None;
                }
                Err(RuntimeController::Controller(ctrl)) => break ctrl,
                Err(other) => {
                    debug!("Cannot load {:?} layer from {:?}", layer_type, other);
                    return None;
                }
            };
        };

        let mut output = VfController::from(ctrl);
        output.fix_null_state_machines();
        output.replace_synced_layers();
        if !overrides.is_empty() {
            output.apply_clip_overrides(&overrides);
        }
        output.fix_layer0_weight();
        output.apply_base_mask(layer_type);
        filter.strip_invalid(&mut output);
        Some(output)
    }

    /// Give every layer without a state machine an empty one.
    ///
    /// Removing such a layer would shift the index of every layer after it.
    fn fix_null_state_machines(&mut self) {
        for layer in &mut self.ctrl.layers {
            if layer.state_machine.is_none() {
                warn!(
                    "Layer '{}' in {} has no state machine; replacing it with an empty one",
                    layer.name, self.ctrl.name
                );
                layer.state_machine = Some(StateMachine::new(layer.name.clone()));
            }
        }
    }

    /// Replace every synced layer with a standalone copy of its source layer.
    ///
    /// Timing sync between the two layers is lost. In exchange every state of
    /// the copy can be edited on its own.
    fn replace_synced_layers(&mut self) {
        let count = self.ctrl.layers.len();
        let sources: BTreeSet<usize> = self
            .ctrl
            .layers
            .iter()
            .enumerate()
            .filter_map(|(id, layer)| layer.synced_layer_index.filter(|k| *k != id && *k < count))
            .collect();
        if self.ctrl.layers.iter().all(|l| l.synced_layer_index.is_none()) {
            return;
        }
        let originals: HashMap<usize, StateMachine> = sources
            .into_iter()
            .filter_map(|k| {
                self.ctrl.layers[k]
                    .state_machine
                    .clone()
                    .map(|machine| (k, machine))
            })
            .collect();
        let mut ids = StateIdAllocator::excluding(self.state_ids());

        for (id, layer) in self.ctrl.layers.iter_mut().enumerate() {
            let Some(synced) = layer.synced_layer_index.take() else {
                continue;
            };
            let motion_overrides = std::mem::take(&mut layer.synced_motion_overrides);
            let behaviour_overrides = std::mem::take(&mut layer.synced_behaviour_overrides);

            if synced == id {
                debug!("Layer '{}' is synced to itself; treating it as unsynced", layer.name);
                continue;
            }
            let Some(original) = originals.get(&synced) else {
                warn!(
                    "Layer '{}' is synced to missing layer {}; replacing it with an empty state machine",
                    layer.name, synced
                );
                layer.state_machine = Some(StateMachine::new(layer.name.clone()));
                continue;
            };

            debug!("Flattening synced layer '{}' (copy of layer {})", layer.name, synced);
            let MachineCopy {
                mut output,
                copy_to_original,
            } = original.deep_copy(&mut ids);
            output.for_each_state_mut(&mut |state| {
                let Some(original_state) = copy_to_original.get(&state.id) else {
                    return;
                };
                if let Some(motion) = motion_overrides.get(original_state) {
                    state.motion = Some(motion.clone());
                }
                if let Some(behaviours) = behaviour_overrides.get(original_state) {
                    state.behaviours = behaviours.clone();
                }
            });
            layer.state_machine = Some(output);
        }
    }

    /// Swap clips through the override maps, outermost override first.
    fn apply_clip_overrides(&mut self, overrides: &[BTreeMap<String, String>]) {
        let mut replace = |clip: &str| overrides.iter().find_map(|ov| ov.get(clip).cloned());
        for layer in &mut self.ctrl.layers {
            if let Some(machine) = &mut layer.state_machine {
                machine.for_each_state_mut(&mut |state| {
                    if let Some(motion) = &mut state.motion {
                        motion.replace_clips(&mut replace);
                    }
                });
            }
        }
    }

    /// The runtime always treats layer 0 as fully weighted.
    fn fix_layer0_weight(&mut self) {
        if let Some(layer0) = self.ctrl.layers.first_mut() {
            layer0.weight = 1.0;
        }
    }

    /// Make every layer's mask consistent with layer 0's.
    ///
    /// Layers without a mask get a copy of the base mask; layers with one are
    /// intersected with it. FX controllers whose base layer has no mask get
    /// an all-enabled one. Applying this twice changes nothing.
    pub fn apply_base_mask(&mut self, layer_type: LayerType) {
        let Some(layer0) = self.ctrl.layers.first() else {
            return;
        };
        let base = match (&layer0.mask, layer_type) {
            (Some(mask), _) => mask.clone(),
            (None, LayerType::Fx) => AvatarMask::default_fx(),
            (None, _) => return,
        };
        for layer in &mut self.ctrl.layers {
            match &mut layer.mask {
                Some(mask) => mask.intersect_with(&base),
                None => layer.mask = Some(base.clone()),
            }
        }
    }

    fn state_ids(&self) -> Vec<StateId> {
        self.ctrl
            .layers
            .iter()
            .filter_map(|l| l.state_machine.as_ref())
            .flat_map(StateMachine::state_ids)
            .collect()
    }

    /// Add a layer with an empty state machine and weight 1.
    ///
    /// Dots are removed from the name. With `insert_at`, the layer is moved
    /// there; otherwise it is appended.
    pub fn new_layer(&mut self, name: &str, insert_at: Option<usize>) -> VfLayer<'_> {
        let name = name.replace('.', "");
        self.ctrl.layers.push(ControllerLayer::new(name));
        let index = self.ctrl.layers.len() - 1;
        let mut layer = VfLayer::new(&mut self.ctrl, index);
        if let Some(index) = insert_at {
            layer.move_to(index);
        }
        layer
    }

    pub fn layers(&self) -> &[ControllerLayer] {
        &self.ctrl.layers
    }

    pub fn set_layers(&mut self, layers: Vec<ControllerLayer>) {
        self.ctrl.layers = layers;
    }

    /// The layer at `index`, or `None` if there is no such layer.
    pub fn layer(&self, index: usize) -> Option<&ControllerLayer> {
        self.ctrl.layers.get(index)
    }

    /// A mutable view of the layer at `index`, or `None` if there is none.
    pub fn layer_mut(&mut self, index: usize) -> Option<VfLayer<'_>> {
        if index < self.ctrl.layers.len() {
            Some(VfLayer::new(&mut self.ctrl, index))
        } else {
            None
        }
    }

    /// A mutable view of a layer that must exist.
    pub fn require_layer(&mut self, index: usize) -> Result<VfLayer<'_>> {
        self.layer_mut(index).ok_or(Error::LayerNotFound { index })
    }

    /// Index of the first layer called `name`.
    pub fn layer_index(&self, name: &str) -> Result<usize> {
        self.ctrl
            .layers
            .iter()
            .position(|l| l.name == name)
            .ok_or_else(|| Error::LayerMissing {
                name: name.to_string(),
            })
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.ctrl.parameters
    }

    pub fn set_parameters(&mut self, parameters: Vec<Parameter>) {
        self.ctrl.parameters = parameters;
    }

    pub fn remove_parameter(&mut self, index: usize) -> Option<Parameter> {
        (index < self.ctrl.parameters.len()).then(|| self.ctrl.parameters.remove(index))
    }

    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        self.ctrl.parameters.iter().find(|p| p.name == name)
    }

    /// Get the parameter called `name`, creating it with `value` if needed.
    ///
    /// The first request for a name decides its kind. Later requests with a
    /// different kind get the existing parameter back and a warning.
    pub fn new_param(&mut self, name: &str, value: ParameterValue) -> &Parameter {
        match self.ctrl.parameters.iter().position(|p| p.name == name) {
            Some(index) => {
                let existing = &self.ctrl.parameters[index];
                if existing.kind() != value.kind() {
                    warn!(
                        "Parameter '{}' requested as {:?} but already exists as {:?}; keeping {:?}",
                        name,
                        value.kind(),
                        existing.kind(),
                        existing.kind()
                    );
                }
                existing
            }
            None => {
                self.ctrl.parameters.push(Parameter::new(name, value));
                &self.ctrl.parameters[self.ctrl.parameters.len() - 1]
            }
        }
    }

    pub fn new_trigger(&mut self, name: &str) -> BoolParam {
        BoolParam::new(self.new_param(name, ParameterValue::Trigger).name.clone())
    }

    pub fn new_bool(&mut self, name: &str, default: bool) -> BoolParam {
        BoolParam::new(self.new_param(name, ParameterValue::Bool(default)).name.clone())
    }

    pub fn new_float(&mut self, name: &str, default: f32) -> FloatParam {
        FloatParam::new(self.new_param(name, ParameterValue::Float(default)).name.clone())
    }

    pub fn new_int(&mut self, name: &str, default: i32) -> IntParam {
        IntParam::new(self.new_param(name, ParameterValue::Int(default)).name.clone())
    }
}
