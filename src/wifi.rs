use anyhow::Result;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};
use log::{info, warn};
use std::net::Ipv4Addr;

/// Attempts before giving up; the binaries restart the chip on failure.
const CONNECT_ATTEMPTS: u32 = 5;

// SAFETY: WifiManager wraps ESP-IDF WiFi which is thread-safe
unsafe impl Send for WifiManager {}
unsafe impl Sync for WifiManager {}

pub struct WifiManager {
    wifi: Box<BlockingWifi<EspWifi<'static>>>,
    default_ssid: heapless::String<32>,
    default_password: heapless::String<64>,
}

impl WifiManager {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        ssid: &str,
        password: &str,
    ) -> Result<Self> {
        info!("WiFi: Creating EspWifi instance...");
        let mut esp_wifi = EspWifi::new(modem, sysloop.clone(), Some(nvs))?;

        let mut ssid_str = heapless::String::<32>::new();
        ssid_str
            .push_str(ssid)
            .map_err(|_| anyhow::anyhow!("SSID too long (max 32 chars)"))?;

        let mut password_str = heapless::String::<64>::new();
        password_str
            .push_str(password)
            .map_err(|_| anyhow::anyhow!("Password too long (max 64 chars)"))?;

        info!("WiFi: Configuring for SSID '{}'...", ssid);
        let wifi_configuration = Configuration::Client(ClientConfiguration {
            ssid: ssid_str.clone(),
            auth_method: AuthMethod::WPA2Personal,
            password: password_str.clone(),
            ..Default::default()
        });

        esp_wifi.set_configuration(&wifi_configuration)?;

        let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;

        info!("WiFi: Starting...");
        wifi.start()?;

        let mut attempt = 1;
        loop {
            info!(
                "WiFi: Connecting to '{}' (attempt {}/{})...",
                ssid, attempt, CONNECT_ATTEMPTS
            );
            match wifi.connect() {
                Ok(()) => break,
                Err(e) if attempt < CONNECT_ATTEMPTS => {
                    warn!("WiFi: Connect failed: {}", e);
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!("WiFi: Waiting for network interface...");
        wifi.wait_netif_up()?;

        let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
        info!("WiFi: IP address: {}", ip_info.ip);

        Ok(Self {
            wifi: Box::new(wifi),
            default_ssid: ssid_str,
            default_password: password_str,
        })
    }

    pub fn reconnect(&mut self) -> Result<()> {
        info!("WiFi reconnect requested");

        let wifi_configuration = Configuration::Client(ClientConfiguration {
            ssid: self.default_ssid.clone(),
            auth_method: AuthMethod::WPA2Personal,
            password: self.default_password.clone(),
            ..Default::default()
        });

        if self.wifi.is_connected().unwrap_or(false) {
            info!("Disconnecting from current network...");
            let _ = self.wifi.disconnect();
        }

        self.wifi.set_configuration(&wifi_configuration)?;

        info!("Connecting to WiFi: {}", self.default_ssid);
        self.wifi.connect()?;
        self.wifi.wait_netif_up()?;

        let ip_info = self.wifi.wifi().sta_netif().get_ip_info()?;
        info!("WiFi IP: {}", ip_info.ip);

        Ok(())
    }

    pub fn is_connected(&self) -> Result<bool> {
        Ok(self.wifi.is_connected()?)
    }

    pub fn get_ip(&self) -> Result<Ipv4Addr> {
        let ip_info = self.wifi.wifi().sta_netif().get_ip_info()?;
        Ok(ip_info.ip)
    }

    pub fn get_ssid(&self) -> Result<heapless::String<32>> {
        if let Configuration::Client(config) = self.wifi.get_configuration()? {
            Ok(config.ssid)
        } else {
            Ok(heapless::String::new())
        }
    }

    /// Station MAC, used to derive the device id when NVS has none stored.
    pub fn get_mac(&self) -> Result<[u8; 6]> {
        Ok(self.wifi.wifi().sta_netif().get_mac()?)
    }

    /// RSSI of the current AP in dBm, or None when not associated.
    pub fn get_rssi(&self) -> Option<i32> {
        let mut ap_info = esp_idf_sys::wifi_ap_record_t::default();
        // SAFETY: ap_info is a valid out-pointer for the duration of the call
        let err = unsafe { esp_idf_sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        if err == esp_idf_sys::ESP_OK {
            Some(ap_info.rssi as i32)
        } else {
            None
        }
    }
}
