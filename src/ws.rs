//! WebSocket channel to the backend for realtime switch commands.
//!
//! The ESP-IDF client handles reconnects internally; this wrapper tracks
//! connection state in shared atomics and forwards text frames to the
//! caller's callback. The auth handshake is left to the main loop: every
//! (re)connect raises `auth_pending`, the loop answers with an auth message.

use anyhow::Result;
use esp_idf_svc::ws::client::{
    EspWebSocketClient, EspWebSocketClientConfig, FrameType, WebSocketEventType,
};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type MessageCallback = Arc<dyn Fn(&str) + Send + Sync>;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct WsStatus {
    pub url: String,
    pub connected: Arc<AtomicBool>,
    pub auth_pending: Arc<AtomicBool>,
    pub sent_count: Arc<Mutex<u32>>,
    pub received_count: Arc<Mutex<u32>>,
    pub last_received: Arc<Mutex<String>>,
}

impl Default for WsStatus {
    fn default() -> Self {
        Self {
            url: String::new(),
            connected: Arc::new(AtomicBool::new(false)),
            auth_pending: Arc::new(AtomicBool::new(false)),
            sent_count: Arc::new(Mutex::new(0)),
            received_count: Arc::new(Mutex::new(0)),
            last_received: Arc::new(Mutex::new(String::new())),
        }
    }
}

pub struct WsClient {
    client: Arc<Mutex<EspWebSocketClient<'static>>>,
    status: WsStatus,
}

impl WsClient {
    pub fn new(url: &str, message_callback: MessageCallback) -> Result<Self> {
        info!("Initializing WebSocket client...");
        info!("  URL: {}", url);

        let status = WsStatus {
            url: url.to_string(),
            ..Default::default()
        };

        let config = EspWebSocketClientConfig::default();

        let status_clone = status.clone();
        let client = EspWebSocketClient::new(url, &config, HANDSHAKE_TIMEOUT, move |event| {
            match event {
                Ok(event) => match &event.event_type {
                    WebSocketEventType::Connected => {
                        info!("WebSocket connected");
                        status_clone.connected.store(true, Ordering::Relaxed);
                        // Re-authenticate after every (re)connect.
                        status_clone.auth_pending.store(true, Ordering::Relaxed);
                    }
                    WebSocketEventType::Disconnected | WebSocketEventType::Closed => {
                        info!("WebSocket disconnected");
                        status_clone.connected.store(false, Ordering::Relaxed);
                    }
                    WebSocketEventType::Text(text) => {
                        debug!("WebSocket received: {}", text);
                        *status_clone.last_received.lock().unwrap() = text.to_string();
                        *status_clone.received_count.lock().unwrap() += 1;
                        message_callback(text);
                    }
                    WebSocketEventType::Binary(data) => {
                        debug!("WebSocket received {} binary bytes (ignored)", data.len());
                    }
                    _ => {}
                },
                Err(e) => {
                    warn!("WebSocket error: {:?}", e);
                    status_clone.connected.store(false, Ordering::Relaxed);
                }
            }
        })?;

        // Transmute to 'static - the client will live for the entire program
        let client_static: EspWebSocketClient<'static> = unsafe { std::mem::transmute(client) };

        Ok(Self {
            client: Arc::new(Mutex::new(client_static)),
            status,
        })
    }

    pub fn get_status(&self) -> WsStatus {
        self.status.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status.connected.load(Ordering::Relaxed)
    }

    /// True exactly once after each (re)connect; the caller sends auth.
    pub fn take_auth_pending(&self) -> bool {
        self.status.auth_pending.swap(false, Ordering::Relaxed)
    }

    pub fn send(&self, text: &str) -> Result<()> {
        self.client
            .lock()
            .unwrap()
            .send(FrameType::Text(false), text.as_bytes())?;

        *self.status.sent_count.lock().unwrap() += 1;
        debug!("WebSocket sent {} bytes", text.len());
        Ok(())
    }
}
