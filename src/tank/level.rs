//! Distance-to-level conversion for the downward-facing ultrasonic sensor.

use super::TankConfig;

/// Converts a measured air gap (sensor face to water surface) into a fill
/// percentage, clamped to 0..=100.
pub fn level_percent(distance_cm: f32, cfg: &TankConfig) -> f32 {
    let water_height_cm = cfg.tank_height_cm - cfg.sensor_offset_cm - distance_cm;
    (water_height_cm / cfg.tank_height_cm * 100.0).clamp(0.0, 100.0)
}

/// Water volume for a rectangular tank at the given fill percentage.
pub fn volume_liters(level_percent: f32, cfg: &TankConfig) -> f32 {
    let water_height_cm = cfg.tank_height_cm * level_percent / 100.0;
    cfg.tank_length_cm * cfg.tank_breadth_cm * water_height_cm / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TankConfig {
        TankConfig::default()
    }

    #[test]
    fn full_tank_reads_one_hundred_percent() {
        // Water at the sensor offset: no air gap beyond the offset.
        assert_eq!(level_percent(0.0, &cfg()), 100.0);
    }

    #[test]
    fn empty_tank_reads_zero() {
        let c = cfg();
        assert_eq!(level_percent(c.tank_height_cm, &c), 0.0);
    }

    #[test]
    fn mid_level_scales_linearly() {
        let c = cfg();
        let level = level_percent(c.tank_height_cm / 2.0, &c);
        assert!((level - 50.0).abs() < 0.01);
    }

    #[test]
    fn out_of_range_readings_are_clamped() {
        let c = cfg();
        // Spurious long echo: further than the tank is deep.
        assert_eq!(level_percent(c.tank_height_cm + 50.0, &c), 0.0);
        // Spurious short echo: closer than the sensor offset.
        assert_eq!(level_percent(-10.0, &c), 100.0);
    }

    #[test]
    fn sensor_offset_is_subtracted_from_the_gap() {
        let mut c = cfg();
        c.sensor_offset_cm = 10.0;
        // height 250, offset 10, gap 10 -> 230cm of water -> 92%.
        let level = level_percent(10.0, &c);
        assert!((level - 92.0).abs() < 0.01);
    }

    #[test]
    fn volume_tracks_fill_percentage() {
        let c = cfg();
        let full = volume_liters(100.0, &c);
        let half = volume_liters(50.0, &c);
        let expected_full = c.tank_length_cm * c.tank_breadth_cm * c.tank_height_cm / 1000.0;
        assert!((full - expected_full).abs() < 0.5);
        assert!((half * 2.0 - full).abs() < 0.5);
        assert_eq!(volume_liters(0.0, &c), 0.0);
    }
}
