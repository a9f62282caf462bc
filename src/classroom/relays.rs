//! Relay channel state, mutated only from the main loop.
//!
//! The bank never touches GPIO: it reports each transition as a
//! [`RelayChange`] and the binary mirrors that change to the relay pin, so
//! relay state and pin level always agree.

use serde::Serialize;

use crate::protocol::{SwitchId, SWITCH_COUNT};

/// What caused a relay transition. Reported in activity logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Remote,
    Manual,
    Motion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayChange {
    pub id: SwitchId,
    pub state: bool,
    pub trigger: Trigger,
}

#[derive(Debug, Default)]
pub struct RelayBank {
    states: [bool; SWITCH_COUNT],
    manual_pressed: [bool; SWITCH_COUNT],
}

impl RelayBank {
    /// All relays off, matching the power-up pin initialization.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, id: SwitchId) -> bool {
        self.states[id.index()]
    }

    pub fn snapshot(&self) -> [bool; SWITCH_COUNT] {
        self.states
    }

    /// Applies a server-commanded state. Always emits a change so the pin is
    /// re-driven even when the state is already current.
    pub fn apply_remote(&mut self, id: SwitchId, state: bool) -> RelayChange {
        self.apply(id, state, Trigger::Remote)
    }

    /// Switches on a relay for a motion event.
    pub fn apply_motion(&mut self, id: SwitchId) -> RelayChange {
        self.apply(id, true, Trigger::Motion)
    }

    fn apply(&mut self, id: SwitchId, state: bool, trigger: Trigger) -> RelayChange {
        self.states[id.index()] = state;
        RelayChange { id, state, trigger }
    }

    /// Feeds one debounced sample of a manual switch (already inverted for
    /// the pull-up wiring: `true` = pressed). Toggles the relay on the press
    /// edge only; releases are tracked but do not toggle.
    pub fn manual_scan(&mut self, id: SwitchId, pressed: bool) -> Option<RelayChange> {
        let idx = id.index();
        if pressed == self.manual_pressed[idx] {
            return None;
        }
        self.manual_pressed[idx] = pressed;
        if !pressed {
            return None;
        }

        let state = !self.states[idx];
        Some(self.apply(id, state, Trigger::Manual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sw(i: usize) -> SwitchId {
        SwitchId::from_index(i).unwrap()
    }

    #[test]
    fn starts_with_all_relays_off() {
        let bank = RelayBank::new();
        assert_eq!(bank.snapshot(), [false; SWITCH_COUNT]);
    }

    #[test]
    fn remote_toggle_updates_state_and_reports_change() {
        let mut bank = RelayBank::new();
        let change = bank.apply_remote(sw(2), true);
        assert_eq!(change.id, sw(2));
        assert!(change.state);
        assert_eq!(change.trigger, Trigger::Remote);
        assert!(bank.state(sw(2)));

        let change = bank.apply_remote(sw(2), false);
        assert!(!change.state);
        assert!(!bank.state(sw(2)));
    }

    #[test]
    fn manual_press_toggles_on_edge_only() {
        let mut bank = RelayBank::new();

        let change = bank.manual_scan(sw(0), true).expect("press edge toggles");
        assert!(change.state);
        assert_eq!(change.trigger, Trigger::Manual);

        // Held down: no further toggles.
        assert!(bank.manual_scan(sw(0), true).is_none());
        // Release: tracked, no toggle.
        assert!(bank.manual_scan(sw(0), false).is_none());
        assert!(bank.state(sw(0)));

        // Second press toggles back off.
        let change = bank.manual_scan(sw(0), true).unwrap();
        assert!(!change.state);
        assert!(!bank.state(sw(0)));
    }

    #[test]
    fn manual_switches_are_independent() {
        let mut bank = RelayBank::new();
        bank.manual_scan(sw(1), true);
        assert!(bank.state(sw(1)));
        assert!(!bank.state(sw(0)));
        assert!(!bank.state(sw(2)));
    }
}
