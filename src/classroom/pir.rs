//! Motion sensor edge detection.

use crate::protocol::{SwitchId, SWITCH_COUNT};

use super::RelayBank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PirEvent {
    MotionStarted,
    MotionStopped,
}

/// Level-change detector for the PIR input. The caller samples at its own
/// cadence (one read per second in the main loop); only transitions produce
/// events.
#[derive(Debug, Default)]
pub struct PirDetector {
    motion: bool,
}

impl PirDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn motion_active(&self) -> bool {
        self.motion
    }

    pub fn update(&mut self, level_high: bool) -> Option<PirEvent> {
        if level_high == self.motion {
            return None;
        }
        self.motion = level_high;
        Some(if level_high {
            PirEvent::MotionStarted
        } else {
            PirEvent::MotionStopped
        })
    }
}

/// Relays a motion event should switch on: linked in the config and
/// currently off.
pub fn switches_to_activate(
    linked: &[bool; SWITCH_COUNT],
    bank: &RelayBank,
) -> Vec<SwitchId> {
    SwitchId::all()
        .filter(|id| linked[id.index()] && !bank.state(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_edges_not_levels() {
        let mut pir = PirDetector::new();
        assert_eq!(pir.update(false), None);
        assert_eq!(pir.update(true), Some(PirEvent::MotionStarted));
        assert_eq!(pir.update(true), None);
        assert_eq!(pir.update(false), Some(PirEvent::MotionStopped));
        assert_eq!(pir.update(false), None);
    }

    #[test]
    fn activates_only_linked_switches_that_are_off() {
        let mut bank = RelayBank::new();
        let linked = [true, false, true, false];

        let targets = switches_to_activate(&linked, &bank);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].index(), 0);
        assert_eq!(targets[1].index(), 2);

        // Already-on linked relays are skipped.
        bank.apply_motion(targets[0]);
        let targets = switches_to_activate(&linked, &bank);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].index(), 2);
    }
}
