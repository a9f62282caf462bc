//! Blocking HTTP client for the backend REST API.
//!
//! A fresh connection is opened per request; devices post at most every
//! couple of seconds and the backend sits behind a load balancer that
//! closes idle connections anyway.

use std::time::Duration;

use anyhow::{anyhow, Result};
use embedded_svc::http::client::Client as HttpClient;
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::client::{Configuration as HttpClientConfiguration, EspHttpConnection};
use log::{debug, warn};
use serde::Serialize;

use crate::network_config::{paths, BackendConfig};
use crate::protocol::messages::{ActivityLog, RegisterRequest, RegisterResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RESPONSE_BYTES: usize = 4096;

pub struct BackendClient {
    base_url: String,
    auth_token: Option<String>,
}

impl BackendClient {
    pub fn new(cfg: &BackendConfig) -> Self {
        Self {
            base_url: cfg.base_url.as_str().to_string(),
            auth_token: cfg.auth_token.as_ref().map(|t| t.as_str().to_string()),
        }
    }

    pub fn set_auth_token(&mut self, token: &str) {
        self.auth_token = Some(token.to_string());
    }

    /// POSTs `payload` as JSON to `base_url + path`. Returns the status code
    /// and the response body (capped at 4 KiB).
    pub fn post_json<T: Serialize>(&mut self, path: &str, payload: &T) -> Result<(u16, Vec<u8>)> {
        let url = format!("{}{}", self.base_url, path);
        let body = serde_json::to_vec(payload)?;

        let conf = HttpClientConfiguration {
            timeout: Some(REQUEST_TIMEOUT),
            ..Default::default()
        };
        let mut client = HttpClient::wrap(EspHttpConnection::new(&conf)?);

        let content_length = body.len().to_string();
        let bearer = self.auth_token.as_ref().map(|t| format!("Bearer {}", t));
        let mut headers: Vec<(&str, &str)> = vec![
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];
        if let Some(bearer) = bearer.as_deref() {
            headers.push(("Authorization", bearer));
        }

        debug!("HTTP: POST {} ({} bytes)", url, body.len());
        let mut request = client.post(&url, &headers)?;
        request.write_all(&body)?;
        let mut response = request.submit()?;
        let status = response.status();

        let mut out = Vec::new();
        let mut buf = [0_u8; 256];
        loop {
            let n = response.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
            if out.len() >= MAX_RESPONSE_BYTES {
                warn!("HTTP: Response truncated at {} bytes", MAX_RESPONSE_BYTES);
                break;
            }
        }

        debug!("HTTP: {} -> {} ({} bytes)", url, status, out.len());
        Ok((status, out))
    }

    /// POST that only cares about success. Used for telemetry reports.
    pub fn post_report<T: Serialize>(&mut self, path: &str, payload: &T) -> Result<()> {
        let (status, _) = self.post_json(path, payload)?;
        if !(200..300).contains(&status) {
            return Err(anyhow!("POST {} failed with HTTP {}", path, status));
        }
        Ok(())
    }

    pub fn register_device(&mut self, req: &RegisterRequest) -> Result<RegisterResponse> {
        let (status, body) = self.post_json(paths::REGISTER, req)?;
        if !(200..300).contains(&status) {
            return Err(anyhow!("registration failed with HTTP {}", status));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    pub fn log_activity(&mut self, entry: &ActivityLog) -> Result<()> {
        self.post_report(paths::ACTIVITIES, entry)
    }
}
