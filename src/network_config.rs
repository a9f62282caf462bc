use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL for REST endpoints, no trailing slash.
    pub base_url: heapless::String<128>,
    /// WebSocket URL for the realtime channel (classroom devices).
    pub ws_url: heapless::String<128>,
    /// Bearer token sent with REST requests once the device is registered.
    pub auth_token: Option<heapless::String<128>>,
}

impl Default for WifiConfig {
    fn default() -> Self {
        let mut ssid = heapless::String::new();
        let mut password = heapless::String::new();
        let _ = ssid.push_str(option_env!("WIFI_SSID").unwrap_or("YOUR_SSID"));
        let _ = password.push_str(option_env!("WIFI_PASSWORD").unwrap_or("YOUR_PASSWORD"));

        Self { ssid, password }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        let mut base_url = heapless::String::new();
        let mut ws_url = heapless::String::new();
        let _ = base_url.push_str(
            option_env!("BACKEND_BASE_URL").unwrap_or("http://192.168.1.100:3000/api"),
        );
        let _ = ws_url.push_str(option_env!("BACKEND_WS_URL").unwrap_or("ws://192.168.1.100:3000"));

        Self {
            base_url,
            ws_url,
            auth_token: None,
        }
    }
}

/// REST paths, appended to [`BackendConfig::base_url`].
pub mod paths {
    // Classroom controller endpoints.
    pub const REGISTER: &str = "/devices/register";
    pub const ACTIVITIES: &str = "/activities";

    // Tank monitor endpoints.
    pub const SENSOR_DATA: &str = "/functions/v1/api/sensor-data";
    pub const MOTOR_STATUS: &str = "/functions/v1/api/motor-status";
    pub const HEARTBEAT: &str = "/functions/v1/api/heartbeat";
    pub const SYSTEM_ALERT: &str = "/functions/v1/api/system-alert";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_populated() {
        let wifi = WifiConfig::default();
        assert!(!wifi.ssid.is_empty());

        let backend = BackendConfig::default();
        assert!(backend.base_url.starts_with("http"));
        assert!(backend.ws_url.starts_with("ws"));
        assert!(backend.auth_token.is_none());
    }

    #[test]
    fn base_url_has_no_trailing_slash() {
        let backend = BackendConfig::default();
        assert!(!backend.base_url.ends_with('/'));
        assert!(paths::REGISTER.starts_with('/'));
    }
}
