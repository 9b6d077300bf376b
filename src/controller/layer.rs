//! Addressable view of one controller layer

use super::mask::AvatarMask;
use super::state_machine::{Behaviour, Motion, StateId, StateMachine};
use super::{AnimatorController, ControllerLayer};

/// A mutable handle to the layer at `index` of a controller.
#[derive(Debug)]
pub struct VfLayer<'a> {
    ctrl: &'a mut AnimatorController,
    index: usize,
}

impl<'a> VfLayer<'a> {
    /// `index` must be in range; [`VfController`](super::VfController) checks it.
    pub(crate) fn new(ctrl: &'a mut AnimatorController, index: usize) -> Self {
        debug_assert!(index < ctrl.layers.len(), "layer index out of range");
        Self { ctrl, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn raw(&self) -> &ControllerLayer {
        &self.ctrl.layers[self.index]
    }

    pub fn raw_mut(&mut self) -> &mut ControllerLayer {
        &mut self.ctrl.layers[self.index]
    }

    pub fn name(&self) -> &str {
        &self.raw().name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.raw_mut().name = name.into();
    }

    pub fn weight(&self) -> f32 {
        self.raw().weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.raw_mut().weight = weight;
    }

    pub fn mask(&self) -> Option<&AvatarMask> {
        self.raw().mask.as_ref()
    }

    pub fn set_mask(&mut self, mask: Option<AvatarMask>) {
        self.raw_mut().mask = mask;
    }

    pub fn state_machine(&self) -> Option<&StateMachine> {
        self.raw().state_machine.as_ref()
    }

    /// The layer's state machine, creating an empty one if it has none.
    pub fn state_machine_mut(&mut self) -> &mut StateMachine {
        let layer = self.raw_mut();
        let name = layer.name.clone();
        layer
            .state_machine
            .get_or_insert_with(|| StateMachine::new(name))
    }

    pub fn override_motion(&self, state: StateId) -> Option<&Motion> {
        self.raw().synced_motion_overrides.get(&state)
    }

    pub fn set_override_motion(&mut self, state: StateId, motion: Option<Motion>) {
        let overrides = &mut self.raw_mut().synced_motion_overrides;
        match motion {
            Some(motion) => {
                overrides.insert(state, motion);
            }
            None => {
                overrides.remove(&state);
            }
        }
    }

    pub fn override_behaviours(&self, state: StateId) -> Option<&[Behaviour]> {
        self.raw()
            .synced_behaviour_overrides
            .get(&state)
            .map(Vec::as_slice)
    }

    pub fn set_override_behaviours(&mut self, state: StateId, behaviours: Vec<Behaviour>) {
        self.raw_mut()
            .synced_behaviour_overrides
            .insert(state, behaviours);
    }

    /// Move this layer to `new_index`, shifting the layers in between.
    ///
    /// Indexes past the end move the layer to the end.
    pub fn move_to(&mut self, new_index: usize) {
        let layers = &mut self.ctrl.layers;
        let new_index = new_index.min(layers.len() - 1);
        let layer = layers.remove(self.index);
        layers.insert(new_index, layer);
        self.index = new_index;
    }
}
