//! Persistent device identity in NVS.
//!
//! Stores the backend-assigned device id and auth token so a registered
//! device keeps its identity across power cycles. Loading never fails the
//! boot: missing or unreadable values degrade to a MAC-derived id.

use crate::protocol::device_id_from_mac;

#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub device_id: String,
    /// None until the backend has accepted a registration.
    pub auth_token: Option<String>,
}

impl DeviceIdentity {
    /// Builds the identity from whatever survived persistence. Empty strings
    /// count as absent; a device with no usable record gets a MAC-derived id
    /// and no token.
    pub fn from_stored(
        stored_id: Option<String>,
        stored_token: Option<String>,
        mac: &[u8; 6],
    ) -> Self {
        let device_id = match stored_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => device_id_from_mac(mac),
        };
        Self {
            device_id,
            auth_token: stored_token.filter(|token| !token.is_empty()),
        }
    }
}

#[cfg(feature = "espidf")]
pub use nvs::DeviceStore;

#[cfg(feature = "espidf")]
mod nvs {
    use anyhow::Result;
    use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
    use log::{info, warn};

    use super::DeviceIdentity;

    const NVS_NAMESPACE: &str = "autonode";
    const KEY_DEVICE_ID: &str = "device_id";
    const KEY_AUTH_TOKEN: &str = "auth_token";

    /// Sized for backend-issued JWTs.
    const MAX_VALUE_LEN: usize = 512;

    pub struct DeviceStore {
        nvs: EspNvs<NvsDefault>,
    }

    impl DeviceStore {
        pub fn new(partition: EspDefaultNvsPartition) -> Result<Self> {
            let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)?;
            Ok(Self { nvs })
        }

        /// A value that cannot be read (missing, corrupt, or larger than the
        /// buffer) reads as absent; identity loading must never stop the boot.
        fn get(&mut self, key: &str) -> Option<String> {
            let mut buffer = [0_u8; MAX_VALUE_LEN];
            match self.nvs.get_str(key, &mut buffer) {
                Ok(value) => value.map(str::to_string),
                Err(e) => {
                    warn!("Storage: Failed to read '{}': {}", key, e);
                    None
                }
            }
        }

        pub fn load_identity(&mut self, mac: &[u8; 6]) -> DeviceIdentity {
            let identity = DeviceIdentity::from_stored(
                self.get(KEY_DEVICE_ID),
                self.get(KEY_AUTH_TOKEN),
                mac,
            );
            info!("Storage: Loaded identity '{}'", identity.device_id);
            identity
        }

        /// Persists the backend-assigned identity after a successful
        /// registration.
        pub fn save_identity(&mut self, device_id: &str, auth_token: &str) -> Result<()> {
            self.nvs.set_str(KEY_DEVICE_ID, device_id)?;
            self.nvs.set_str(KEY_AUTH_TOKEN, auth_token)?;
            info!("Storage: Saved identity for '{}'", device_id);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: [u8; 6] = [0xA4, 0xCF, 0x12, 0x00, 0xFF, 0x3B];

    #[test]
    fn stored_identity_is_kept() {
        let identity =
            DeviceIdentity::from_stored(Some("dev-42".to_string()), Some("tok".to_string()), &MAC);
        assert_eq!(identity.device_id, "dev-42");
        assert_eq!(identity.auth_token.as_deref(), Some("tok"));
    }

    #[test]
    fn missing_record_degrades_to_mac_identity() {
        let identity = DeviceIdentity::from_stored(None, None, &MAC);
        assert_eq!(identity.device_id, "A4CF1200FF3B");
        assert!(identity.auth_token.is_none());
    }

    #[test]
    fn unreadable_values_do_not_poison_the_identity() {
        // A token that failed to read back must not keep a stored id from
        // loading, and vice versa.
        let identity = DeviceIdentity::from_stored(Some("dev-42".to_string()), None, &MAC);
        assert_eq!(identity.device_id, "dev-42");
        assert!(identity.auth_token.is_none());

        let identity = DeviceIdentity::from_stored(None, Some("tok".to_string()), &MAC);
        assert_eq!(identity.device_id, "A4CF1200FF3B");
        assert_eq!(identity.auth_token.as_deref(), Some("tok"));
    }

    #[test]
    fn empty_strings_count_as_absent() {
        let identity =
            DeviceIdentity::from_stored(Some(String::new()), Some(String::new()), &MAC);
        assert_eq!(identity.device_id, "A4CF1200FF3B");
        assert!(identity.auth_token.is_none());
    }
}
