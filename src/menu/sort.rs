//! Sort positions for menu controls
//!
//! Every control the [`MenuManager`](super::MenuManager) creates is stamped
//! with a position taken from a [`SortSource`]. Positions are kept in a side
//! table, never on the control, and are only read by the final sort.

use std::cell::Cell;
use std::rc::Rc;

/// Supplies the sort position for the next created control.
///
/// Any `FnMut() -> i32` closure is a source, so a build session can hand the
/// manager a closure that reads whichever feature is currently running.
pub trait SortSource {
    fn next_position(&mut self) -> i32;
}

impl<F> SortSource for F
where
    F: FnMut() -> i32,
{
    fn next_position(&mut self) -> i32 {
        self()
    }
}

/// A monotonic counter: every call returns one more than the last.
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    next: i32,
}

impl SequenceCounter {
    /// Start counting at `start`.
    pub fn starting_at(start: i32) -> Self {
        Self { next: start }
    }
}

impl SortSource for SequenceCounter {
    fn next_position(&mut self) -> i32 {
        let position = self.next;
        self.next += 1;
        position
    }
}

/// A shared, externally updated position.
///
/// The holder of one clone sets the value; the manager holding another clone
/// reads it for every control it creates. Controls created while the value is
/// unchanged share a position and keep their insertion order.
#[derive(Debug, Default, Clone)]
pub struct SharedPosition(Rc<Cell<i32>>);

impl SharedPosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, position: i32) {
        self.0.set(position);
    }

    pub fn get(&self) -> i32 {
        self.0.get()
    }
}

impl SortSource for SharedPosition {
    fn next_position(&mut self) -> i32 {
        self.get()
    }
}
