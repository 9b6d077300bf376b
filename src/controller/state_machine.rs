//! State machines
//!
//! The composition engine treats state machines as mostly opaque. It only
//! needs to walk every state, swap motions, and make a deep copy that can be
//! mapped back to the original state by state.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Identity of a state within one controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub u32);

/// Hands out state ids that are not yet used in a controller.
///
/// Ids continue after the highest one in use and wrap around to fill gaps
/// once `u32::MAX` is taken.
#[derive(Debug, Clone)]
pub struct StateIdAllocator {
    used: BTreeSet<StateId>,
    next: u32,
}

impl StateIdAllocator {
    /// Allocate around the ids in `used`.
    pub fn excluding(used: impl IntoIterator<Item = StateId>) -> Self {
        let used: BTreeSet<StateId> = used.into_iter().collect();
        let next = used
            .last()
            .map_or(0, |max| max.0.wrapping_add(1));
        Self { used, next }
    }

    pub fn allocate(&mut self) -> StateId {
        while self.used.contains(&StateId(self.next)) {
            self.next = self.next.wrapping_add(1);
        }
        let id = StateId(self.next);
        self.used.insert(id);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// What a state plays.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    /// A reference to an animation clip
    Clip(String),
    BlendTree(BlendTree),
}

impl Motion {
    pub fn clip(name: impl Into<String>) -> Self {
        Motion::Clip(name.into())
    }

    /// Replace every clip reachable from this motion.
    ///
    /// `replace` returns the new clip name, or `None` to keep the clip.
    pub fn replace_clips(&mut self, replace: &mut dyn FnMut(&str) -> Option<String>) {
        match self {
            Motion::Clip(clip) => {
                if let Some(new_clip) = replace(clip) {
                    *clip = new_clip;
                }
            }
            Motion::BlendTree(tree) => {
                for child in &mut tree.children {
                    if let Some(motion) = &mut child.motion {
                        motion.replace_clips(replace);
                    }
                }
            }
        }
    }

    /// All clip names reachable from this motion, depth first.
    pub fn clips(&self) -> Vec<&str> {
        match self {
            Motion::Clip(clip) => vec![clip.as_str()],
            Motion::BlendTree(tree) => tree
                .children
                .iter()
                .filter_map(|c| c.motion.as_ref())
                .flat_map(Motion::clips)
                .collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendTree {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    pub children: Vec<ChildMotion>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildMotion {
    pub motion: Option<Motion>,
    pub threshold: f32,
}

/// A script attached to a state or state machine. Carried through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Behaviour {
    pub kind: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionMode {
    If,
    IfNot,
    Greater,
    Less,
    Equals,
    NotEqual,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub parameter: String,
    pub mode: ConditionMode,
    #[serde(default)]
    pub threshold: f32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transition {
    /// Target state. `None` with `is_exit` unset means the transition is dangling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<StateId>,
    pub is_exit: bool,
    pub conditions: Vec<Condition>,
    pub has_exit_time: bool,
    pub exit_time: f32,
    pub duration: f32,
}

fn default_true() -> bool {
    true
}

fn default_speed() -> f32 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motion: Option<Motion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviours: Vec<Behaviour>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    #[serde(default = "default_true")]
    pub write_defaults: bool,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl State {
    pub fn new(id: StateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            motion: None,
            behaviours: Vec::new(),
            transitions: Vec::new(),
            write_defaults: true,
            speed: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateMachine {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub states: Vec<State>,
    /// Nested state machines
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub state_machines: Vec<StateMachine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_state: Option<StateId>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_state_transitions: Vec<Transition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry_transitions: Vec<Transition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub behaviours: Vec<Behaviour>,
}

/// Result of [`StateMachine::deep_copy`].
#[derive(Debug, Clone)]
pub struct MachineCopy {
    pub output: StateMachine,
    /// Maps every state of `output` to the state it was copied from.
    pub copy_to_original: HashMap<StateId, StateId>,
}

impl StateMachine {
    /// An empty state machine.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Visit every state, including those in nested machines.
    pub fn for_each_state(&self, f: &mut dyn FnMut(&State)) {
        for state in &self.states {
            f(state);
        }
        for machine in &self.state_machines {
            machine.for_each_state(f);
        }
    }

    /// Visit every state mutably, including those in nested machines.
    pub fn for_each_state_mut(&mut self, f: &mut dyn FnMut(&mut State)) {
        for state in &mut self.states {
            f(state);
        }
        for machine in &mut self.state_machines {
            machine.for_each_state_mut(f);
        }
    }

    fn for_each_transition_mut(&mut self, f: &mut dyn FnMut(&mut Transition)) {
        self.any_state_transitions.iter_mut().for_each(&mut *f);
        self.entry_transitions.iter_mut().for_each(&mut *f);
        for state in &mut self.states {
            state.transitions.iter_mut().for_each(&mut *f);
        }
        for machine in &mut self.state_machines {
            machine.for_each_transition_mut(f);
        }
    }

    pub fn state_ids(&self) -> Vec<StateId> {
        let mut ids = Vec::new();
        self.for_each_state(&mut |s| ids.push(s.id));
        ids
    }

    pub fn max_state_id(&self) -> Option<StateId> {
        self.state_ids().into_iter().max()
    }

    pub fn find_state(&self, id: StateId) -> Option<&State> {
        self.states
            .iter()
            .find(|s| s.id == id)
            .or_else(|| self.state_machines.iter().find_map(|m| m.find_state(id)))
    }

    /// Copy the whole machine, giving every copied state a fresh id.
    ///
    /// Transitions and default states inside the machine are rewired to the
    /// copies. References to states outside the machine are left as they are.
    pub fn deep_copy(&self, ids: &mut StateIdAllocator) -> MachineCopy {
        let original_to_copy: HashMap<StateId, StateId> = self
            .state_ids()
            .into_iter()
            .map(|original| (original, ids.allocate()))
            .collect();

        let mut output = self.clone();
        output.remap_states(&original_to_copy);

        let copy_to_original = original_to_copy
            .into_iter()
            .map(|(original, copy)| (copy, original))
            .collect();
        MachineCopy {
            output,
            copy_to_original,
        }
    }

    fn remap_states(&mut self, map: &HashMap<StateId, StateId>) {
        let remap = |id: &mut StateId| {
            if let Some(new_id) = map.get(id) {
                *id = *new_id;
            }
        };
        self.for_each_state_mut(&mut |s| remap(&mut s.id));
        self.for_each_transition_mut(&mut |t| {
            if let Some(destination) = &mut t.destination {
                remap(destination);
            }
        });
        self.remap_default_states(&remap);
    }

    fn remap_default_states(&mut self, remap: &dyn Fn(&mut StateId)) {
        if let Some(default_state) = &mut self.default_state {
            remap(default_state);
        }
        for machine in &mut self.state_machines {
            machine.remap_default_states(remap);
        }
    }
}
