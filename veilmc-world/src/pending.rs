//! Debounce for two-phase click gestures.
//!
//! A single click on the host can arrive as two interaction events. The first
//! one arms the location and does the work; the second one finds it armed,
//! disarms it and does nothing else.

use std::collections::HashSet;

use crate::coords::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// Location was idle and is now armed. Perform the effect.
    First,
    /// Location was armed and is now idle again. Do not repeat the effect.
    Second,
}

#[derive(Debug, Default)]
pub struct PendingToggles {
    armed: HashSet<Location>,
}

impl PendingToggles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self, location: &Location) -> bool {
        self.armed.contains(location)
    }

    /// Flip the state of `location` and report which phase this event was.
    pub fn advance(&mut self, location: Location) -> GesturePhase {
        if self.armed.remove(&location) {
            GesturePhase::Second
        } else {
            self.armed.insert(location);
            GesturePhase::First
        }
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    pub fn clear(&mut self) {
        self.armed.clear();
    }
}
