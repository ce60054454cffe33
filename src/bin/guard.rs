//! Guard node: watches fence voltage and the enclosure tamper switch,
//! cuts fence power on over-voltage, and posts alerts over HTTP.
//!
//! ```text
//!   ADC1 ch7 ──▶ ┌──────────────┐ ──▶ relay GPIO23
//!   GPIO18  ───▶ │ GuardService │
//!                └──────────────┘ ──▶ HttpAlertSink ──▶ WiFi
//! ```
//!
//! The relay stays open (fence off) until WiFi is up and the service
//! has started; a bring-up failure halts with the fence de-energised.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::info;

use fenceguard::adapters::hardware::{AdcInput, GpioInput, GpioOutput};
use fenceguard::adapters::http_sink::HttpAlertSink;
use fenceguard::adapters::time::Esp32TimeAdapter;
use fenceguard::adapters::wifi::WifiAdapter;
use fenceguard::app::ports::{Clock, ConnectivityPort};
use fenceguard::app::service::GuardService;
use fenceguard::config::FenceConfig;
use fenceguard::drivers::hw_init;
use fenceguard::node::GuardNode;
use fenceguard::error::Error;
use fenceguard::scheduler::{halt_safe, or_halt, PollLoop};

/// Build-time network settings.
const WIFI_SSID: &str = match option_env!("FENCE_WIFI_SSID") {
    Some(s) => s,
    None => "Wokwi-GUEST",
};
const WIFI_PASSWORD: &str = match option_env!("FENCE_WIFI_PASSWORD") {
    Some(s) => s,
    None => "",
};
const ALERT_URL: Option<&str> = option_env!("FENCE_ALERT_URL");

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("FenceGuard guard v{}", env!("CARGO_PKG_VERSION"));

    let config = FenceConfig::default();
    config.validate().map_err(Error::from)?;

    // ── 2. Peripherals (relay left open) ──────────────────────
    or_halt(hw_init::init_guard_peripherals(), "guard peripherals", &mut FreeRtos);

    let Some(url) = ALERT_URL else {
        halt_safe("no alert URL configured (FENCE_ALERT_URL)", &mut FreeRtos);
    };

    // ── 3. WiFi (startup-fatal) ───────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let driver = BlockingWifi::wrap(EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?, sysloop)?;

    let mut wifi = WifiAdapter::with_driver(driver);
    or_halt(wifi.set_credentials(WIFI_SSID, WIFI_PASSWORD), "WiFi credentials", &mut FreeRtos);
    or_halt(wifi.connect(), "WiFi", &mut FreeRtos);

    // ── 4. Guard service ──────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let sink = HttpAlertSink::new(url, config.http_timeout_ms, wifi);
    let mut service = GuardService::new(
        config,
        AdcInput::fence_voltage(),
        GpioInput::tamper(),
        GpioOutput::relay(),
        sink,
        clock.now_ms(),
    );
    or_halt(service.start(), "relay bring-up", &mut FreeRtos);

    PollLoop::new(clock, FreeRtos, GuardNode::new(service)).run_forever()
}
