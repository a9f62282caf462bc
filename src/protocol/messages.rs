//! Classroom controller wire format (camelCase JSON over HTTP + WebSocket).
//!
//! Inbound WebSocket traffic is dispatched on the `"type"` field; unknown
//! types are accepted and ignored so backend additions never fault a device.

use serde::{Deserialize, Serialize};

use super::SwitchId;
use crate::classroom::Trigger;

/// Server -> device WebSocket messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
    #[serde(rename = "switch_toggle")]
    SwitchToggle {
        #[serde(rename = "switchId")]
        switch_id: SwitchId,
        state: bool,
    },
    #[serde(rename = "get_status")]
    GetStatus,
    #[serde(rename = "ota_update")]
    OtaUpdate { url: String },
    #[serde(other)]
    Unknown,
}

/// Device -> server WebSocket messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Outbound {
    #[serde(rename = "auth")]
    Auth {
        #[serde(rename = "deviceId")]
        device_id: String,
        token: String,
    },
    #[serde(rename = "switch_update")]
    SwitchUpdate {
        #[serde(rename = "deviceId")]
        device_id: String,
        #[serde(rename = "switchId")]
        switch_id: SwitchId,
        state: bool,
        timestamp: u64,
    },
    #[serde(rename = "pir_event")]
    PirEvent {
        #[serde(rename = "deviceId")]
        device_id: String,
        motion: bool,
        timestamp: u64,
    },
    #[serde(rename = "heartbeat")]
    Heartbeat {
        #[serde(rename = "deviceId")]
        device_id: String,
        uptime: u64,
        #[serde(rename = "freeHeap")]
        free_heap: u32,
        #[serde(rename = "wifiSignal")]
        wifi_signal: i32,
        ip: String,
        switches: Vec<SwitchState>,
        #[serde(rename = "pirActive", skip_serializing_if = "Option::is_none")]
        pir_active: Option<bool>,
    },
    #[serde(rename = "device_status")]
    DeviceStatus {
        #[serde(rename = "deviceId")]
        device_id: String,
        status: String,
        uptime: String,
        #[serde(rename = "signalStrength")]
        signal_strength: u8,
        firmware: String,
        #[serde(rename = "freeHeap")]
        free_heap: u32,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchState {
    pub id: SwitchId,
    pub state: bool,
}

/// POST /devices/register request body. Sent on every boot; a previously
/// assigned id makes this an update (fresh IP, rotated token) rather than a
/// new device row.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    #[serde(rename = "deviceId", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    pub name: String,
    pub ip: String,
    pub mac: String,
    pub location: String,
    pub classroom: String,
    pub firmware: String,
    pub switches: Vec<SwitchInfo>,
    #[serde(rename = "pirSensor", skip_serializing_if = "Option::is_none")]
    pub pir_sensor: Option<PirInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchInfo {
    pub id: SwitchId,
    pub name: String,
    pub gpio: i32,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "hasManualSwitch")]
    pub has_manual_switch: bool,
    #[serde(rename = "manualSwitchGpio")]
    pub manual_switch_gpio: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PirInfo {
    pub id: String,
    pub name: String,
    pub gpio: i32,
    pub sensitivity: u8,
    pub timeout: u32,
    #[serde(rename = "linkedSwitches")]
    pub linked_switches: Vec<SwitchId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub data: RegisteredDevice,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisteredDevice {
    pub id: String,
}

/// POST /activities request body, one row per relay transition.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityLog {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "switchId")]
    pub switch_id: SwitchId,
    pub action: String,
    #[serde(rename = "triggeredBy")]
    pub triggered_by: Trigger,
    pub timestamp: u64,
}

impl ActivityLog {
    pub fn new(device_id: &str, switch_id: SwitchId, state: bool, trigger: Trigger, timestamp: u64) -> Self {
        Self {
            device_id: device_id.to_string(),
            switch_id,
            action: if state { "on" } else { "off" }.to_string(),
            triggered_by: trigger,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inbound_dispatches_on_type_field() {
        let msg: Inbound =
            serde_json::from_str(r#"{"type":"switch_toggle","switchId":"sw2","state":true}"#)
                .unwrap();
        match msg {
            Inbound::SwitchToggle { switch_id, state } => {
                assert_eq!(switch_id.index(), 1);
                assert!(state);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let msg: Inbound = serde_json::from_str(r#"{"type":"get_status"}"#).unwrap();
        assert!(matches!(msg, Inbound::GetStatus));

        let msg: Inbound =
            serde_json::from_str(r#"{"type":"ota_update","url":"http://host/fw.bin"}"#).unwrap();
        assert!(matches!(msg, Inbound::OtaUpdate { .. }));
    }

    #[test]
    fn unknown_inbound_type_is_tolerated() {
        let msg: Inbound =
            serde_json::from_str(r#"{"type":"schedule_update","cron":"* * * * *"}"#).unwrap();
        assert!(matches!(msg, Inbound::Unknown));
    }

    #[test]
    fn out_of_range_switch_id_is_rejected() {
        let result: Result<Inbound, _> =
            serde_json::from_str(r#"{"type":"switch_toggle","switchId":"sw9","state":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn heartbeat_uses_camel_case_wire_names() {
        let msg = Outbound::Heartbeat {
            device_id: "A4CF1200FF3B".to_string(),
            uptime: 123_456,
            free_heap: 180_000,
            wifi_signal: -61,
            ip: "192.168.1.50".to_string(),
            switches: vec![SwitchState {
                id: SwitchId::from_index(0).unwrap(),
                state: true,
            }],
            pir_active: Some(false),
        };

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "heartbeat");
        assert_eq!(value["deviceId"], "A4CF1200FF3B");
        assert_eq!(value["freeHeap"], 180_000);
        assert_eq!(value["wifiSignal"], -61);
        assert_eq!(value["switches"][0]["id"], "sw1");
        assert_eq!(value["pirActive"], false);
    }

    #[test]
    fn heartbeat_omits_pir_field_without_sensor() {
        let msg = Outbound::Heartbeat {
            device_id: "dev".to_string(),
            uptime: 0,
            free_heap: 0,
            wifi_signal: -70,
            ip: "10.0.0.2".to_string(),
            switches: Vec::new(),
            pir_active: None,
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("pirActive").is_none());
    }

    #[test]
    fn register_request_matches_backend_schema() {
        let req = RegisterRequest {
            device_id: None,
            name: "Classroom ESP32 Controller".to_string(),
            ip: "192.168.1.50".to_string(),
            mac: "A4:CF:12:00:FF:3B".to_string(),
            location: "Room 101".to_string(),
            classroom: "Computer Science Lab 1".to_string(),
            firmware: "v1.0.0".to_string(),
            switches: vec![SwitchInfo {
                id: SwitchId::from_index(0).unwrap(),
                name: "Main Lights".to_string(),
                gpio: 2,
                kind: "light".to_string(),
                has_manual_switch: true,
                manual_switch_gpio: 14,
            }],
            pir_sensor: Some(PirInfo {
                id: "pir1".to_string(),
                name: "Motion Sensor".to_string(),
                gpio: 16,
                sensitivity: 80,
                timeout: 300,
                linked_switches: vec![SwitchId::from_index(0).unwrap()],
            }),
        };

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["switches"][0]["type"], "light");
        assert_eq!(value["switches"][0]["hasManualSwitch"], true);
        assert_eq!(value["switches"][0]["manualSwitchGpio"], 14);
        assert_eq!(value["pirSensor"]["linkedSwitches"][0], "sw1");
        // First boot: no assigned id yet.
        assert!(value.get("deviceId").is_none());
    }

    #[test]
    fn re_registration_carries_the_assigned_id() {
        let req = RegisterRequest {
            device_id: Some("dev-42".to_string()),
            name: "Classroom ESP32 Controller".to_string(),
            ip: "192.168.1.51".to_string(),
            mac: "A4:CF:12:00:FF:3B".to_string(),
            location: "Room 101".to_string(),
            classroom: "Computer Science Lab 1".to_string(),
            firmware: "v1.0.0".to_string(),
            switches: Vec::new(),
            pir_sensor: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["deviceId"], "dev-42");
        assert_eq!(value["ip"], "192.168.1.51");
    }

    #[test]
    fn register_response_extracts_id_and_token() {
        let resp: RegisterResponse = serde_json::from_value(json!({
            "data": { "id": "dev-42", "name": "ignored" },
            "token": "secret-token"
        }))
        .unwrap();
        assert_eq!(resp.data.id, "dev-42");
        assert_eq!(resp.token, "secret-token");
    }

    #[test]
    fn activity_log_action_reflects_state() {
        let on = ActivityLog::new("dev", SwitchId::from_index(2).unwrap(), true, Trigger::Manual, 10);
        let value = serde_json::to_value(&on).unwrap();
        assert_eq!(value["action"], "on");
        assert_eq!(value["switchId"], "sw3");
        assert_eq!(value["triggeredBy"], "manual");
    }
}
