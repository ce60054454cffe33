//! WiFi station-mode adapter.
//!
//! Implements [`ConnectivityPort`], the network link under the guard
//! node's HTTP alert sink.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests; the
//!   simulated access point can be taken down per adapter.
//!
//! ## Reconnection policy
//!
//! On disconnect the adapter waits an exponential backoff (2 s → 4 s →
//! 8 s … capped at 60 s) between retries, paced by the `now_ms` passed
//! to [`ConnectivityPort::poll`].  The alert path never blocks on it:
//! while reconnecting, alerts fail fast with `NetworkDown`.

use log::{error, info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort};
use crate::radio::message::is_printable;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

const INITIAL_BACKOFF_MS: u64 = 2_000;
const MAX_BACKOFF_MS: u64 = 60_000;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(ConnectivityError::InvalidSsid);
    }
    if !ssid.bytes().all(is_printable) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    backoff_ms: u64,
    next_attempt_ms: u64,
    last_rssi: Option<i8>,
    #[cfg(target_os = "espidf")]
    driver: Option<BlockingWifi<EspWifi<'static>>>,
    /// Simulation: whether the simulated access point is reachable.
    #[cfg(not(target_os = "espidf"))]
    sim_network_up: bool,
}

impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            backoff_ms: INITIAL_BACKOFF_MS,
            next_attempt_ms: 0,
            last_rssi: None,
            #[cfg(target_os = "espidf")]
            driver: None,
            #[cfg(not(target_os = "espidf"))]
            sim_network_up: true,
        }
    }

    /// Adapter bound to the ESP-IDF WiFi driver.
    #[cfg(target_os = "espidf")]
    pub fn with_driver(driver: BlockingWifi<EspWifi<'static>>) -> Self {
        let mut a = Self::new();
        a.driver = Some(driver);
        a
    }

    /// Simulation: make the access point reachable or not.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_network(&mut self, up: bool) {
        self.sim_network_up = up;
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn backoff_ms(&self) -> u64 {
        self.backoff_ms
    }

    fn on_connected(&mut self) {
        self.state = WifiState::Connected;
        self.backoff_ms = INITIAL_BACKOFF_MS;
        self.last_rssi = self.platform_rssi();
    }

    fn schedule_retry(&mut self, now_ms: u64, attempt: u32) {
        self.next_attempt_ms = now_ms.saturating_add(self.backoff_ms);
        self.state = WifiState::Reconnecting { attempt };
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let Some(wifi) = self.driver.as_mut() else {
            return Err(ConnectivityError::ConnectionFailed);
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method: if self.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        });
        wifi.set_configuration(&config)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        if !wifi.is_started().unwrap_or(false) {
            wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)?;
        wifi.wait_netif_up().map_err(|_| ConnectivityError::ConnectionFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<(), ConnectivityError> {
        if !self.sim_network_up {
            warn!("WiFi(sim): access point unreachable");
            return Err(ConnectivityError::ConnectionFailed);
        }
        info!("WiFi(sim): associated with '{}'", self.ssid);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_disconnect(&mut self) {
        if let Some(wifi) = self.driver.as_mut() {
            if let Err(e) = wifi.disconnect() {
                warn!("WiFi: disconnect failed: {}", e);
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_disconnect(&mut self) {
        info!("WiFi(sim): disconnected");
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.driver
            .as_ref()
            .is_some_and(|w| w.is_connected().unwrap_or(false))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.state == WifiState::Connected && self.sim_network_up
    }

    #[cfg(target_os = "espidf")]
    fn platform_rssi(&self) -> Option<i8> {
        let mut ap_info = esp_idf_svc::sys::wifi_ap_record_t::default();
        // SAFETY: ap_info is a valid out-pointer; the call only reads driver state.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        (ret == esp_idf_svc::sys::ESP_OK as i32).then_some(ap_info.rssi)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_rssi(&self) -> Option<i8> {
        (self.state == WifiState::Connected).then_some(-60)
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for WifiAdapter {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        if self.state == WifiState::Connected {
            return Err(ConnectivityError::AlreadyConnected);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        match self.platform_connect() {
            Ok(()) => {
                self.on_connected();
                info!("WiFi: connected (RSSI={:?})", self.last_rssi);
                Ok(())
            }
            Err(e) => {
                error!("WiFi: connection failed: {}", e);
                self.state = WifiState::Disconnected;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        self.platform_disconnect();
        self.state = WifiState::Disconnected;
        self.last_rssi = None;
        info!("WiFi: disconnected");
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Reconnecting { attempt } => {
                if now_ms < self.next_attempt_ms {
                    return;
                }
                info!("WiFi: reconnect attempt {} (backoff {} ms)", attempt, self.backoff_ms);
                match self.platform_connect() {
                    Ok(()) => {
                        self.on_connected();
                        info!("WiFi: reconnected (RSSI={:?})", self.last_rssi);
                    }
                    Err(_) => {
                        self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
                        self.schedule_retry(now_ms, attempt + 1);
                    }
                }
            }
            WifiState::Connected => {
                if self.platform_is_connected() {
                    self.last_rssi = self.platform_rssi();
                } else {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.last_rssi = None;
                    self.schedule_retry(now_ms, 0);
                }
            }
            WifiState::Disconnected | WifiState::Connecting => {}
        }
    }

    fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), ConnectivityError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|()| ConnectivityError::InvalidSsid)?;
        self.password.clear();
        self.password.push_str(password).map_err(|()| ConnectivityError::InvalidPassword)?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    fn rssi(&self) -> Option<i8> {
        self.last_rssi
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    fn connected() -> WifiAdapter {
        let mut a = WifiAdapter::new();
        a.set_credentials("FenceNet", "password1").unwrap();
        a.connect().unwrap();
        a
    }

    #[test]
    fn rejects_empty_ssid() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials("", "password123"), Err(ConnectivityError::InvalidSsid));
    }

    #[test]
    fn rejects_control_chars_in_ssid() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials("bad\nssid", ""), Err(ConnectivityError::InvalidSsid));
        assert_eq!(a.set_credentials("caf\u{e9}", ""), Err(ConnectivityError::InvalidSsid));
    }

    #[test]
    fn rejects_short_password() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.set_credentials("MyNet", "short"), Err(ConnectivityError::InvalidPassword));
    }

    #[test]
    fn accepts_open_network() {
        let mut a = WifiAdapter::new();
        assert!(a.set_credentials("Wokwi-GUEST", "").is_ok());
    }

    #[test]
    fn connect_without_credentials_fails() {
        let mut a = WifiAdapter::new();
        assert_eq!(a.connect(), Err(ConnectivityError::NoCredentials));
    }

    #[test]
    fn connect_disconnect_roundtrip() {
        let mut a = connected();
        assert!(a.is_connected());
        assert!(a.rssi().is_some());
        a.disconnect();
        assert!(!a.is_connected());
        assert!(a.rssi().is_none());
    }

    #[test]
    fn double_connect_fails() {
        let mut a = connected();
        assert_eq!(a.connect(), Err(ConnectivityError::AlreadyConnected));
    }

    #[test]
    fn lost_link_reconnects_with_backoff() {
        let mut a = connected();
        a.sim_set_network(false);
        a.poll(1_000);
        assert_eq!(a.state(), WifiState::Reconnecting { attempt: 0 });

        // First retry due at 1_000 + 2_000.
        a.poll(2_999);
        assert_eq!(a.state(), WifiState::Reconnecting { attempt: 0 });
        a.poll(3_000);
        assert_eq!(a.state(), WifiState::Reconnecting { attempt: 1 });
        assert_eq!(a.backoff_ms(), 4_000);

        a.sim_set_network(true);
        a.poll(6_999);
        assert!(!a.is_connected());
        a.poll(7_000);
        assert!(a.is_connected());
        assert_eq!(a.backoff_ms(), 2_000);
    }

    #[test]
    fn backoff_is_capped() {
        let mut a = connected();
        a.sim_set_network(false);
        let mut now = 0;
        a.poll(now);
        for _ in 0..20 {
            now += MAX_BACKOFF_MS;
            a.poll(now);
        }
        assert_eq!(a.backoff_ms(), MAX_BACKOFF_MS);
    }
}
