//! Tank monitor backend payloads (snake_case JSON over HTTP).
//!
//! Every payload carries `protocol_version` so the backend can branch or
//! reject unsupported firmware.

use serde::Serialize;

use super::PROTOCOL_VERSION;
use crate::tank::{MotorTrigger, TankMode};

#[derive(Debug, Clone, Serialize)]
pub struct SensorDataReport {
    pub device_id: String,
    pub level_percent: f32,
    pub volume_liters: f32,
    pub distance_cm: f32,
    pub float_switch: bool,
    pub protocol_version: u32,
    pub timestamp: u64,
}

impl SensorDataReport {
    pub fn new(
        device_id: &str,
        level_percent: f32,
        volume_liters: f32,
        distance_cm: f32,
        float_switch: bool,
        timestamp: u64,
    ) -> Self {
        Self {
            device_id: device_id.to_string(),
            level_percent,
            volume_liters,
            distance_cm,
            float_switch,
            protocol_version: PROTOCOL_VERSION,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MotorStatusReport {
    pub device_id: String,
    pub running: bool,
    pub mode: TankMode,
    pub trigger: MotorTrigger,
    pub runtime_seconds: u64,
    pub protocol_version: u32,
    pub timestamp: u64,
}

impl MotorStatusReport {
    pub fn new(
        device_id: &str,
        running: bool,
        mode: TankMode,
        trigger: MotorTrigger,
        runtime_ms: u64,
        timestamp: u64,
    ) -> Self {
        Self {
            device_id: device_id.to_string(),
            running,
            mode,
            trigger,
            runtime_seconds: runtime_ms / 1000,
            protocol_version: PROTOCOL_VERSION,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TankHeartbeat {
    pub device_id: String,
    pub uptime_ms: u64,
    pub free_heap: u32,
    pub wifi_signal: i32,
    pub protocol_version: u32,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemAlert {
    pub device_id: String,
    pub severity: AlertSeverity,
    pub code: String,
    pub message: String,
    pub protocol_version: u32,
    pub timestamp: u64,
}

impl SystemAlert {
    pub fn new(
        device_id: &str,
        severity: AlertSeverity,
        code: &str,
        message: &str,
        timestamp: u64,
    ) -> Self {
        Self {
            device_id: device_id.to_string(),
            severity,
            code: code.to_string(),
            message: message.to_string(),
            protocol_version: PROTOCOL_VERSION,
            timestamp,
        }
    }
}
