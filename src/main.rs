//! Classroom relay controller.
//!
//! Four relay channels with manual wall switches and an optional PIR motion
//! sensor. Commands arrive over WebSocket; every relay transition is pushed
//! back over WebSocket and logged to the REST API.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use esp32_automation_node::classroom::{switches_to_activate, ClassroomConfig, PirDetector, PirEvent, RelayBank, RelayChange};
use esp32_automation_node::network_config::{BackendConfig, WifiConfig};
use esp32_automation_node::protocol::messages::{
    ActivityLog, PirInfo, RegisterRequest, SwitchInfo, SwitchState,
};
use esp32_automation_node::protocol::{format_uptime, signal_strength_percent, Inbound, Outbound};
use esp32_automation_node::{BackendClient, WifiManager, WsClient, FIRMWARE_VERSION};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, IOPin, Input, Level, Output, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys;
use log::{info, warn};

// Board wiring. Relays are active-high; wall switches close to ground.
const RELAY_GPIOS: [i32; 4] = [2, 4, 5, 18];
const SWITCH_GPIOS: [i32; 4] = [14, 12, 13, 15];
const PIR_GPIO: i32 = 16;

fn main() -> anyhow::Result<()> {
    sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Classroom controller starting (firmware {})", FIRMWARE_VERSION);

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let config = ClassroomConfig::default();
    let wifi_config = WifiConfig::default();
    let backend_config = BackendConfig::default();

    // Relays first, driven LOW, so nothing switches on while the network
    // comes up.
    let mut relay_pins: [PinDriver<AnyOutputPin, Output>; 4] = [
        PinDriver::output(peripherals.pins.gpio2.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio4.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio5.downgrade_output())?,
        PinDriver::output(peripherals.pins.gpio18.downgrade_output())?,
    ];
    for pin in relay_pins.iter_mut() {
        pin.set_low()?;
    }

    let mut switch_pins: [PinDriver<AnyIOPin, Input>; 4] = [
        PinDriver::input(peripherals.pins.gpio14.downgrade())?,
        PinDriver::input(peripherals.pins.gpio12.downgrade())?,
        PinDriver::input(peripherals.pins.gpio13.downgrade())?,
        PinDriver::input(peripherals.pins.gpio15.downgrade())?,
    ];
    for pin in switch_pins.iter_mut() {
        pin.set_pull(Pull::Up)?;
    }

    let pir_pin = PinDriver::input(peripherals.pins.gpio16.downgrade())?;

    let wifi = match WifiManager::new(
        peripherals.modem,
        sysloop,
        nvs_partition.clone(),
        wifi_config.ssid.as_str(),
        wifi_config.password.as_str(),
    ) {
        Ok(wifi) => wifi,
        Err(e) => restart_device(&format!("WiFi setup failed: {}", e)),
    };

    let mac = wifi.get_mac()?;
    let ip = wifi.get_ip()?;

    let mut store = esp32_automation_node::storage::DeviceStore::new(nvs_partition)?;
    let mut identity = store.load_identity(&mac);

    let mut http = BackendClient::new(&backend_config);
    if let Some(token) = identity.auth_token.as_deref() {
        http.set_auth_token(token);
    }

    // Register on every boot: the backend refreshes the device's IP and name
    // and may rotate the token. A previously assigned id rides along so this
    // updates the existing row.
    let assigned_id = identity
        .auth_token
        .is_some()
        .then(|| identity.device_id.clone());
    let request = register_request(&config, assigned_id, &mac, &ip.to_string());
    match http.register_device(&request) {
        Ok(response) => {
            store.save_identity(&response.data.id, &response.token)?;
            http.set_auth_token(&response.token);
            identity.device_id = response.data.id;
            identity.auth_token = Some(response.token);
            info!("Registered as '{}'", identity.device_id);
        }
        Err(e) => {
            // Keep running on the stored (or MAC-derived) identity;
            // registration is retried on the next boot.
            warn!("Registration failed: {}", e);
        }
    }
    let device_id = identity.device_id.clone();
    let auth_token = identity.auth_token.clone().unwrap_or_default();

    // Inbound WebSocket messages are parsed on the client thread and drained
    // by the main loop, which is the only writer of relay state.
    let (tx, rx) = mpsc::channel::<Inbound>();
    let tx = Mutex::new(tx);
    let ws = WsClient::new(
        backend_config.ws_url.as_str(),
        Arc::new(move |text: &str| match serde_json::from_str::<Inbound>(text) {
            Ok(msg) => {
                let _ = tx.lock().unwrap().send(msg);
            }
            Err(e) => warn!("Dropping malformed message: {}", e),
        }),
    )?;

    let mut bank = RelayBank::new();
    let mut pir = PirDetector::new();
    let boot = Instant::now();
    let mut last_pir_read_ms: u64 = 0;
    let mut last_heartbeat_ms: u64 = 0;

    info!("Entering control loop");
    loop {
        let now_ms = boot.elapsed().as_millis() as u64;
        let wifi_up = wifi.is_connected().unwrap_or(false);

        if ws.take_auth_pending() {
            send_ws(
                &ws,
                &Outbound::Auth {
                    device_id: device_id.clone(),
                    token: auth_token.clone(),
                },
            );
        }

        // Server commands.
        while let Ok(msg) = rx.try_recv() {
            match msg {
                Inbound::SwitchToggle { switch_id, state } => {
                    let change = bank.apply_remote(switch_id, state);
                    drive_relay(&mut relay_pins, &change)?;
                    report_change(&ws, &mut http, &device_id, &change, wifi_up, now_ms);
                }
                Inbound::GetStatus => {
                    send_ws(
                        &ws,
                        &Outbound::DeviceStatus {
                            device_id: device_id.clone(),
                            status: "online".to_string(),
                            uptime: format_uptime(now_ms),
                            signal_strength: signal_strength_percent(
                                wifi.get_rssi().unwrap_or(-100),
                            ),
                            firmware: FIRMWARE_VERSION.to_string(),
                            free_heap: free_heap(),
                        },
                    );
                }
                Inbound::OtaUpdate { url } => {
                    // TODO: wire up EspOta once the backend serves signed images.
                    warn!("OTA requested ({}) but not supported yet", url);
                }
                Inbound::Unknown => {}
            }
        }

        // Wall switches, press-edge toggles.
        for (idx, pin) in switch_pins.iter().enumerate() {
            let pressed = pin.is_low(); // pull-up wiring
            if let Ok(id) = esp32_automation_node::SwitchId::from_index(idx) {
                if let Some(change) = bank.manual_scan(id, pressed) {
                    drive_relay(&mut relay_pins, &change)?;
                    report_change(&ws, &mut http, &device_id, &change, wifi_up, now_ms);
                }
            }
        }

        // Motion sensor, sampled once per second.
        if config.has_pir && now_ms.saturating_sub(last_pir_read_ms) >= config.pir_read_interval_ms
        {
            last_pir_read_ms = now_ms;
            match pir.update(pir_pin.is_high()) {
                Some(PirEvent::MotionStarted) => {
                    info!("Motion detected");
                    for id in switches_to_activate(&config.pir_linked, &bank) {
                        let change = bank.apply_motion(id);
                        drive_relay(&mut relay_pins, &change)?;
                        report_change(&ws, &mut http, &device_id, &change, wifi_up, now_ms);
                    }
                    send_ws(
                        &ws,
                        &Outbound::PirEvent {
                            device_id: device_id.clone(),
                            motion: true,
                            timestamp: now_ms,
                        },
                    );
                }
                Some(PirEvent::MotionStopped) => {
                    info!("Motion cleared");
                    send_ws(
                        &ws,
                        &Outbound::PirEvent {
                            device_id: device_id.clone(),
                            motion: false,
                            timestamp: now_ms,
                        },
                    );
                }
                None => {}
            }
        }

        if now_ms.saturating_sub(last_heartbeat_ms) >= config.heartbeat_interval_ms {
            last_heartbeat_ms = now_ms;
            let switches = esp32_automation_node::SwitchId::all()
                .map(|id| SwitchState {
                    id,
                    state: bank.state(id),
                })
                .collect();
            send_ws(
                &ws,
                &Outbound::Heartbeat {
                    device_id: device_id.clone(),
                    uptime: now_ms,
                    free_heap: free_heap(),
                    wifi_signal: wifi.get_rssi().unwrap_or(0),
                    ip: ip.to_string(),
                    switches,
                    pir_active: config.has_pir.then(|| pir.motion_active()),
                },
            );
        }

        FreeRtos::delay_ms(config.loop_delay_ms as u32);
    }
}

fn drive_relay(
    pins: &mut [PinDriver<'_, AnyOutputPin, Output>; 4],
    change: &RelayChange,
) -> anyhow::Result<()> {
    let level = if change.state { Level::High } else { Level::Low };
    pins[change.id.index()].set_level(level)?;
    info!("Relay {} -> {:?} ({:?})", change.id, level, change.trigger);
    Ok(())
}

/// Pushes a transition over WebSocket and logs it to the activity endpoint.
/// Best effort: a device with a flaky uplink must keep switching locally.
fn report_change(
    ws: &WsClient,
    http: &mut BackendClient,
    device_id: &str,
    change: &RelayChange,
    wifi_up: bool,
    now_ms: u64,
) {
    if !wifi_up {
        warn!("WiFi down, skipping report for {}", change.id);
        return;
    }

    send_ws(
        ws,
        &Outbound::SwitchUpdate {
            device_id: device_id.to_string(),
            switch_id: change.id,
            state: change.state,
            timestamp: now_ms,
        },
    );

    let entry = ActivityLog::new(device_id, change.id, change.state, change.trigger, now_ms);
    if let Err(e) = http.log_activity(&entry) {
        warn!("Activity log failed: {}", e);
    }
}

fn send_ws(ws: &WsClient, msg: &Outbound) {
    if !ws.is_connected() {
        return;
    }
    match serde_json::to_string(msg) {
        Ok(json) => {
            if let Err(e) = ws.send(&json) {
                warn!("WebSocket send failed: {}", e);
            }
        }
        Err(e) => warn!("Serialization failed: {}", e),
    }
}

fn register_request(
    config: &ClassroomConfig,
    device_id: Option<String>,
    mac: &[u8; 6],
    ip: &str,
) -> RegisterRequest {
    let mac_str = mac
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(":");

    let switches = esp32_automation_node::SwitchId::all()
        .map(|id| SwitchInfo {
            id,
            name: config.switch_names[id.index()].as_str().to_string(),
            gpio: RELAY_GPIOS[id.index()],
            kind: config.switch_types[id.index()].as_str().to_string(),
            has_manual_switch: true,
            manual_switch_gpio: SWITCH_GPIOS[id.index()],
        })
        .collect();

    let pir_sensor = config.has_pir.then(|| PirInfo {
        id: "pir1".to_string(),
        name: "Motion Sensor".to_string(),
        gpio: PIR_GPIO,
        sensitivity: config.pir_sensitivity,
        timeout: config.pir_timeout_secs,
        linked_switches: esp32_automation_node::SwitchId::all()
            .filter(|id| config.pir_linked[id.index()])
            .collect(),
    });

    RegisterRequest {
        device_id,
        name: config.device_name.as_str().to_string(),
        ip: ip.to_string(),
        mac: mac_str,
        location: config.location.as_str().to_string(),
        classroom: config.classroom.as_str().to_string(),
        firmware: FIRMWARE_VERSION.to_string(),
        switches,
        pir_sensor,
    }
}

fn free_heap() -> u32 {
    unsafe { sys::esp_get_free_heap_size() }
}

#[allow(unreachable_code)]
fn restart_device(reason: &str) -> ! {
    log::error!("{}; restarting in 3s", reason);
    FreeRtos::delay_ms(3000);
    unsafe { sys::esp_restart() };
    unreachable!()
}
