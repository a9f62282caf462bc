use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TankConfig {
    pub device_id: heapless::String<32>,
    pub device_name: heapless::String<64>,

    // --- Geometry (cm) ---
    pub tank_height_cm: f32,
    pub tank_length_cm: f32,
    pub tank_breadth_cm: f32,
    /// Dead gap between the ultrasonic sensor face and the 100% water line.
    pub sensor_offset_cm: f32,

    // --- Motor limits ---
    /// Continuous runtime ceiling (ms).
    pub motor_max_runtime_ms: u64,
    /// Mandatory rest after a stop before the next start (ms).
    pub motor_min_rest_ms: u64,

    // --- Level thresholds (percent of tank height) ---
    /// Below this the pump must not run (dry-run guard).
    pub min_level_percent: f32,
    /// At or above this the tank is considered overfull.
    pub max_level_percent: f32,
    /// At or below this a critical alert is raised.
    pub critical_level_percent: f32,
    /// Auto mode starts the pump at or above this level.
    pub auto_start_percent: f32,
    /// Auto mode stops the pump at or below this level.
    pub auto_stop_percent: f32,

    // --- Timing ---
    pub sensor_read_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
}

fn fixed<const N: usize>(value: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    let _ = out.push_str(value);
    out
}

impl Default for TankConfig {
    fn default() -> Self {
        Self {
            device_id: fixed("ESP32_SUMP_001"),
            device_name: fixed("Sump Tank Controller"),

            tank_height_cm: 250.0,
            tank_length_cm: 230.0,
            tank_breadth_cm: 230.0,
            sensor_offset_cm: 0.0,

            motor_max_runtime_ms: 30 * 60 * 1000,
            motor_min_rest_ms: 5 * 60 * 1000,

            min_level_percent: 15.0,
            max_level_percent: 90.0,
            critical_level_percent: 5.0,
            auto_start_percent: 75.0,
            auto_stop_percent: 25.0,

            sensor_read_interval_ms: 2_000,
            heartbeat_interval_ms: 30_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = TankConfig::default();
        assert!(c.tank_height_cm > 0.0);
        assert!(c.tank_length_cm > 0.0 && c.tank_breadth_cm > 0.0);
        assert!(c.sensor_offset_cm >= 0.0);
        assert!(c.motor_max_runtime_ms > 0);
        assert!(c.motor_min_rest_ms > 0);
        assert!(c.sensor_read_interval_ms > 0);
        assert!(c.heartbeat_interval_ms >= c.sensor_read_interval_ms);
    }

    #[test]
    fn start_above_stop_prevents_oscillation() {
        let c = TankConfig::default();
        assert!(
            c.auto_start_percent > c.auto_stop_percent,
            "auto start must sit above auto stop"
        );
    }

    #[test]
    fn threshold_ordering_holds() {
        let c = TankConfig::default();
        assert!(c.critical_level_percent < c.min_level_percent);
        assert!(c.min_level_percent < c.auto_stop_percent);
        assert!(c.auto_start_percent < c.max_level_percent);
        assert!(c.max_level_percent <= 100.0);
    }
}
