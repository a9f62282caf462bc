pub mod error;
pub mod messages;
pub mod telemetry;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    ActivityLog, Inbound, Outbound, PirInfo, RegisterRequest, RegisterResponse, SwitchInfo,
    SwitchState,
};
pub use telemetry::{AlertSeverity, MotorStatusReport, SensorDataReport, SystemAlert, TankHeartbeat};

use core::fmt;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire protocol version embedded in every tank backend payload. Bump on any
/// backward-incompatible change to payload structure or field naming.
pub const PROTOCOL_VERSION: u32 = 1;

/// Number of relay channels on the classroom controller board.
pub const SWITCH_COUNT: usize = 4;

/// Identifier of one relay channel, rendered as `"sw1"`..`"sw4"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwitchId(u8);

impl SwitchId {
    pub fn from_index(index: usize) -> ProtocolResult<Self> {
        if index < SWITCH_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(ProtocolError::InvalidSwitchId)
        }
    }

    /// Zero-based channel index.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Parses the wire form (`"sw1"`..`"sw4"`).
    pub fn parse(raw: &str) -> ProtocolResult<Self> {
        let number = raw
            .strip_prefix("sw")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or(ProtocolError::InvalidSwitchId)?;
        if (1..=SWITCH_COUNT).contains(&number) {
            Ok(Self((number - 1) as u8))
        } else {
            Err(ProtocolError::InvalidSwitchId)
        }
    }

    pub fn all() -> impl Iterator<Item = SwitchId> {
        (0..SWITCH_COUNT).map(|i| SwitchId(i as u8))
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sw{}", self.0 + 1)
    }
}

impl Serialize for SwitchId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SwitchId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SwitchId::parse(&raw).map_err(|_| D::Error::custom("invalid switch id"))
    }
}

/// Formats milliseconds of uptime as `"3d 4h 12m"`.
pub fn format_uptime(uptime_ms: u64) -> String {
    let seconds = uptime_ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    format!("{}d {}h {}m", days, hours % 24, minutes % 60)
}

/// Maps a WiFi RSSI reading (dBm) onto a 0-100 signal strength scale.
/// -100 dBm and below reads as 0, -50 dBm and above as 100.
pub fn signal_strength_percent(rssi_dbm: i32) -> u8 {
    ((rssi_dbm + 100) * 2).clamp(0, 100) as u8
}

/// Builds the fallback device identifier from the station MAC address,
/// colon-free uppercase hex. Used until the backend assigns a real id.
pub fn device_id_from_mac(mac: &[u8; 6]) -> String {
    let mut id = String::with_capacity(12);
    for byte in mac {
        use core::fmt::Write as _;
        let _ = write!(&mut id, "{byte:02X}");
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_id_parses_wire_form() {
        assert_eq!(SwitchId::parse("sw1").unwrap().index(), 0);
        assert_eq!(SwitchId::parse("sw4").unwrap().index(), 3);
        assert_eq!(SwitchId::parse("sw1").unwrap().to_string(), "sw1");
    }

    #[test]
    fn switch_id_rejects_out_of_range() {
        assert!(SwitchId::parse("sw0").is_err());
        assert!(SwitchId::parse("sw5").is_err());
        assert!(SwitchId::parse("relay1").is_err());
        assert!(SwitchId::parse("sw").is_err());
        assert!(SwitchId::from_index(4).is_err());
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(0), "0d 0h 0m");
        assert_eq!(format_uptime(61_000), "0d 0h 1m");
        // 2 days, 3 hours, 4 minutes
        let ms = ((2 * 24 + 3) * 3600 + 4 * 60) * 1000;
        assert_eq!(format_uptime(ms), "2d 3h 4m");
    }

    #[test]
    fn signal_strength_clamps() {
        assert_eq!(signal_strength_percent(-110), 0);
        assert_eq!(signal_strength_percent(-100), 0);
        assert_eq!(signal_strength_percent(-75), 50);
        assert_eq!(signal_strength_percent(-50), 100);
        assert_eq!(signal_strength_percent(-30), 100);
    }

    #[test]
    fn device_id_strips_mac_separators() {
        let mac = [0xA4, 0xCF, 0x12, 0x00, 0xFF, 0x3B];
        assert_eq!(device_id_from_mac(&mac), "A4CF1200FF3B");
    }
}
