//! HTTP alert sink.
//!
//! Implements [`AlertSink`] as a single JSON POST per alert:
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::http::client::EspHttpConnection`.
//! - **all other targets**: `ureq` (host simulator).
//!
//! The sink owns the network adapter, so connectivity checks and the
//! reconnect loop live next to the one thing that needs the network.
//! Any HTTP status, including 4xx/5xx, is returned as `Ok(status)`.

use log::debug;

use crate::app::ports::{AlertSink, ConnectivityPort};
use crate::error::DeliveryError;

pub struct HttpAlertSink<C: ConnectivityPort> {
    url: String,
    timeout_ms: u32,
    network: C,
}

impl<C: ConnectivityPort> HttpAlertSink<C> {
    pub fn new(url: &str, timeout_ms: u32, network: C) -> Self {
        Self { url: url.to_owned(), timeout_ms, network }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn network(&self) -> &C {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut C {
        &mut self.network
    }

    #[cfg(target_os = "espidf")]
    fn post(&mut self, body: &[u8]) -> Result<u16, DeliveryError> {
        use core::time::Duration;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
        use esp_idf_svc::http::Method;
        use esp_idf_svc::io::Write as _;

        let config = Configuration {
            timeout: Some(Duration::from_millis(u64::from(self.timeout_ms))),
            ..Default::default()
        };
        let mut conn = EspHttpConnection::new(&config).map_err(|_| DeliveryError::ConnectFailed)?;
        let content_length = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];
        conn.initiate_request(Method::Post, &self.url, &headers)
            .map_err(|_| DeliveryError::ConnectFailed)?;

        let mut remaining = body;
        while !remaining.is_empty() {
            let n = conn.write(remaining).map_err(|_| DeliveryError::RequestFailed)?;
            if n == 0 {
                return Err(DeliveryError::RequestFailed);
            }
            remaining = &remaining[n..];
        }
        conn.initiate_response().map_err(|_| DeliveryError::RequestFailed)?;
        Ok(conn.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn post(&mut self, body: &[u8]) -> Result<u16, DeliveryError> {
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_millis(u64::from(self.timeout_ms)))
            .build();
        match agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_bytes(body)
        {
            Ok(resp) => Ok(resp.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(t)) => Err(match t.kind() {
                ureq::ErrorKind::Dns | ureq::ErrorKind::ConnectionFailed | ureq::ErrorKind::InvalidUrl => {
                    DeliveryError::ConnectFailed
                }
                _ => DeliveryError::RequestFailed,
            }),
        }
    }
}

impl<C: ConnectivityPort> AlertSink for HttpAlertSink<C> {
    fn is_connected(&self) -> bool {
        self.network.is_connected()
    }

    fn post_json(&mut self, body: &[u8]) -> Result<u16, DeliveryError> {
        debug!("HTTP: POST {} ({} bytes)", self.url, body.len());
        self.post(body)
    }

    fn maintain(&mut self, now_ms: u64) {
        self.network.poll(now_ms);
    }
}
