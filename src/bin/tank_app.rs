//! Sump tank monitor and pump controller.
//!
//! Reads an HC-SR04 level sensor every two seconds, runs the pump state
//! machine, mirrors the result to the relay and panel indicators, and posts
//! telemetry to the backend REST API. Pump safety never depends on the
//! network: control runs entirely on-device.

use std::time::Instant;

use esp32_automation_node::network_config::{paths, BackendConfig, WifiConfig};
use esp32_automation_node::protocol::{
    MotorStatusReport, SensorDataReport, SystemAlert, TankHeartbeat, PROTOCOL_VERSION,
};
use esp32_automation_node::tank::{
    level_percent, volume_liters, MotorController, MotorEvent, TankConfig, TankMode, Ultrasonic,
};
use esp32_automation_node::{BackendClient, WifiManager};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{IOPin, InputPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys;
use log::{error, info, warn};

fn main() -> anyhow::Result<()> {
    sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!(
        "Sump tank controller starting (firmware {})",
        esp32_automation_node::FIRMWARE_VERSION
    );

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let config = TankConfig::default();
    let wifi_config = WifiConfig::default();
    let backend_config = BackendConfig::default();

    // Pump relay first, driven LOW. The pump must be off until the control
    // loop owns it.
    let mut motor_pin = PinDriver::output(peripherals.pins.gpio13.downgrade_output())?;
    motor_pin.set_low()?;

    let mut buzzer_pin = PinDriver::output(peripherals.pins.gpio14.downgrade_output())?;
    buzzer_pin.set_low()?;
    let mut auto_led = PinDriver::output(peripherals.pins.gpio16.downgrade_output())?;
    let mut full_led = PinDriver::output(peripherals.pins.gpio17.downgrade_output())?;
    let mut low_led = PinDriver::output(peripherals.pins.gpio21.downgrade_output())?;

    // Float switch closes to ground when submerged: high = sump dry.
    let mut float_pin = PinDriver::input(peripherals.pins.gpio4.downgrade())?;
    float_pin.set_pull(Pull::Up)?;
    // Panel switches, closed = low.
    let mut mode_switch = PinDriver::input(peripherals.pins.gpio25.downgrade())?;
    mode_switch.set_pull(Pull::Up)?;
    let mut manual_switch = PinDriver::input(peripherals.pins.gpio26.downgrade())?;
    manual_switch.set_pull(Pull::Up)?;

    let mut sensor = Ultrasonic::new(
        peripherals.pins.gpio5.downgrade_output(),
        peripherals.pins.gpio18.downgrade_input(),
    )?;

    let wifi = match WifiManager::new(
        peripherals.modem,
        sysloop,
        nvs_partition,
        wifi_config.ssid.as_str(),
        wifi_config.password.as_str(),
    ) {
        Ok(wifi) => wifi,
        Err(e) => restart_device(&format!("WiFi setup failed: {}", e)),
    };

    let mut http = BackendClient::new(&backend_config);
    let device_id = config.device_id.as_str().to_string();

    let mut controller = MotorController::new(config.clone());
    let boot = Instant::now();
    let mut last_level: Option<f32> = None;
    let mut last_heartbeat_ms: u64 = 0;
    let mut manual_on = false;

    info!("Entering control loop");
    loop {
        let now_ms = boot.elapsed().as_millis() as u64;
        let wifi_up = wifi.is_connected().unwrap_or(false);
        let float_dry = float_pin.is_high();

        controller.set_mode(if mode_switch.is_low() {
            TankMode::Manual
        } else {
            TankMode::Auto
        });

        let mut manual_event = None;
        let manual_requested = manual_switch.is_low();
        if manual_requested != manual_on {
            manual_on = manual_requested;
            if let Some(level) = last_level {
                manual_event = controller.manual_request(manual_requested, level, float_dry, now_ms);
            }
        }

        let measurement = match sensor.measure_cm() {
            Ok(Some(distance_cm)) => {
                let level = level_percent(distance_cm, &config);
                last_level = Some(level);
                Some((distance_cm, level))
            }
            Ok(None) => {
                warn!("Level sensor: no echo");
                None
            }
            Err(e) => {
                warn!("Level sensor read failed: {}", e);
                None
            }
        };

        // Control runs on the last known level when a reading drops out, so
        // the runtime and dry-run guards keep working.
        let (tick_event, alerts) = match last_level {
            Some(level) => controller.tick(level, float_dry, now_ms),
            None => (None, Vec::new()),
        };

        // Mirror controller state to the panel.
        motor_pin.set_level(controller.is_running().into())?;
        auto_led.set_level((controller.mode() == TankMode::Auto).into())?;
        if let Some(level) = last_level {
            full_led.set_level((level >= config.max_level_percent).into())?;
            low_led.set_level((level <= config.min_level_percent).into())?;
            buzzer_pin.set_level(
                (level <= config.critical_level_percent || level >= config.max_level_percent)
                    .into(),
            )?;
        }

        if wifi_up {
            if let Some((distance_cm, level)) = measurement {
                let report = SensorDataReport::new(
                    &device_id,
                    level,
                    volume_liters(level, &config),
                    distance_cm,
                    float_dry,
                    now_ms,
                );
                if let Err(e) = http.post_report(paths::SENSOR_DATA, &report) {
                    warn!("Sensor data post failed: {}", e);
                }
            }

            for event in manual_event.iter().chain(tick_event.iter()) {
                let (running, trigger, runtime_ms) = match *event {
                    MotorEvent::Started { trigger } => (true, trigger, 0),
                    MotorEvent::Stopped {
                        trigger,
                        runtime_ms,
                    } => (false, trigger, runtime_ms),
                };
                let report = MotorStatusReport::new(
                    &device_id,
                    running,
                    controller.mode(),
                    trigger,
                    runtime_ms,
                    now_ms,
                );
                if let Err(e) = http.post_report(paths::MOTOR_STATUS, &report) {
                    warn!("Motor status post failed: {}", e);
                }
            }

            for alert in &alerts {
                error!("Alert: {}", alert.message());
                let report = SystemAlert::new(
                    &device_id,
                    alert.severity(),
                    alert.code(),
                    alert.message(),
                    now_ms,
                );
                if let Err(e) = http.post_report(paths::SYSTEM_ALERT, &report) {
                    warn!("Alert post failed: {}", e);
                }
            }

            if now_ms.saturating_sub(last_heartbeat_ms) >= config.heartbeat_interval_ms {
                last_heartbeat_ms = now_ms;
                let heartbeat = TankHeartbeat {
                    device_id: device_id.clone(),
                    uptime_ms: now_ms,
                    free_heap: unsafe { sys::esp_get_free_heap_size() },
                    wifi_signal: wifi.get_rssi().unwrap_or(0),
                    protocol_version: PROTOCOL_VERSION,
                    timestamp: now_ms,
                };
                if let Err(e) = http.post_report(paths::HEARTBEAT, &heartbeat) {
                    warn!("Heartbeat post failed: {}", e);
                }
            }
        } else if measurement.is_some() || !alerts.is_empty() {
            warn!("WiFi down, skipping backend reports");
        }

        FreeRtos::delay_ms(config.sensor_read_interval_ms as u32);
    }
}

#[allow(unreachable_code)]
fn restart_device(reason: &str) -> ! {
    error!("{}; restarting in 3s", reason);
    FreeRtos::delay_ms(3000);
    unsafe { sys::esp_restart() };
    unreachable!()
}
