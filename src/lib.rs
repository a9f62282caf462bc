//! ESP32 Automation Node Library
//!
//! Shared modules for the classroom relay controller (`classroom_app`) and the
//! sump tank monitor (`tank_app`). Device logic is hardware-independent; the
//! WiFi/HTTP/WebSocket/NVS glue is only compiled for device builds
//! (`--features espidf`).

pub mod classroom;
pub mod network_config;
pub mod protocol;
pub mod storage;
pub mod tank;

#[cfg(feature = "espidf")]
pub mod http;
#[cfg(feature = "espidf")]
pub mod wifi;
#[cfg(feature = "espidf")]
pub mod ws;

pub const FIRMWARE_VERSION: &str = "v1.0.0";

pub use classroom::{ClassroomConfig, PirDetector, PirEvent, RelayBank, RelayChange, Trigger};
pub use network_config::{BackendConfig, WifiConfig};
pub use protocol::{Inbound, Outbound, ProtocolError, ProtocolResult, SwitchId, PROTOCOL_VERSION};
pub use storage::DeviceIdentity;
pub use tank::{MotorController, MotorEvent, MotorTrigger, TankAlert, TankConfig, TankMode};

#[cfg(feature = "espidf")]
pub use http::BackendClient;
#[cfg(feature = "espidf")]
pub use storage::DeviceStore;
#[cfg(feature = "espidf")]
pub use wifi::WifiManager;
#[cfg(feature = "espidf")]
pub use ws::{MessageCallback, WsClient, WsStatus};
