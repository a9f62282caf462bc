use serde::{Deserialize, Serialize};

use crate::protocol::SWITCH_COUNT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomConfig {
    pub device_name: heapless::String<64>,
    pub location: heapless::String<64>,
    pub classroom: heapless::String<64>,

    pub switch_names: [heapless::String<32>; SWITCH_COUNT],
    pub switch_types: [heapless::String<16>; SWITCH_COUNT],

    pub has_pir: bool,
    /// PIR sensitivity reported at registration (0-100).
    pub pir_sensitivity: u8,
    /// PIR timeout reported at registration (seconds).
    pub pir_timeout_secs: u32,
    /// Which relays a motion event switches on.
    pub pir_linked: [bool; SWITCH_COUNT],

    /// Heartbeat period (ms).
    pub heartbeat_interval_ms: u64,
    /// Minimum interval between PIR samples (ms).
    pub pir_read_interval_ms: u64,
    /// Main polling loop delay (ms).
    pub loop_delay_ms: u64,
}

fn fixed<const N: usize>(value: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let _ = out.push_str(value);
    out
}

impl Default for ClassroomConfig {
    fn default() -> Self {
        Self {
            device_name: fixed("Classroom ESP32 Controller"),
            location: fixed("Room 101"),
            classroom: fixed("Computer Science Lab 1"),
            switch_names: [
                fixed("Main Lights"),
                fixed("Ceiling Fan"),
                fixed("Projector"),
                fixed("Smart Board"),
            ],
            switch_types: [
                fixed("light"),
                fixed("fan"),
                fixed("projector"),
                fixed("smartboard"),
            ],
            has_pir: true,
            pir_sensitivity: 80,
            pir_timeout_secs: 300,
            // Only the main lights follow the motion sensor.
            pir_linked: [true, false, false, false],
            heartbeat_interval_ms: 30_000,
            pir_read_interval_ms: 1_000,
            loop_delay_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = ClassroomConfig::default();
        assert!(!c.device_name.is_empty());
        assert!(c.switch_names.iter().all(|n| !n.is_empty()));
        assert!(c.switch_types.iter().all(|t| !t.is_empty()));
        assert!(c.pir_sensitivity <= 100);
        assert!(c.pir_timeout_secs > 0);
        assert!(c.loop_delay_ms > 0);
        assert!(c.pir_read_interval_ms >= c.loop_delay_ms);
        assert!(c.heartbeat_interval_ms > c.pir_read_interval_ms);
    }

    #[test]
    fn only_lights_follow_motion_by_default() {
        let c = ClassroomConfig::default();
        assert_eq!(c.pir_linked, [true, false, false, false]);
    }
}
