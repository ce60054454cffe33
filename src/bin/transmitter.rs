//! Transmitter node: samples the fence pulse line, classifies every
//! rising edge and radios the result to the receiver.
//!
//! ```text
//!   GPIO34 ──▶ PulseClassifier ──▶ EventRelay ──▶ LoRa UART modem ~~~▶
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Delay, FreeRtos};
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;
use log::info;

use fenceguard::adapters::hardware::GpioInput;
use fenceguard::adapters::lora_uart::{LoraUartLink, UartTransport};
use fenceguard::adapters::time::Esp32TimeAdapter;
use fenceguard::app::ports::Clock;
use fenceguard::config::FenceConfig;
use fenceguard::drivers::hw_init;
use fenceguard::node::TransmitterNode;
use fenceguard::pins;
use fenceguard::error::Error;
use fenceguard::scheduler::{or_halt, PollLoop};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("FenceGuard transmitter v{}", env!("CARGO_PKG_VERSION"));

    let config = FenceConfig::default();
    config.validate().map_err(Error::from)?;

    // ── 2. Peripherals ────────────────────────────────────────
    or_halt(hw_init::init_pulse_input(), "pulse input", &mut FreeRtos);

    let peripherals = Peripherals::take()?;
    let uart = UartDriver::new(
        peripherals.uart2,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::LORA_UART_BAUD)),
    )?;

    // ── 3. Radio link (startup-fatal) ─────────────────────────
    let mut link = LoraUartLink::new(
        UartTransport::new(uart),
        pins::LORA_RECEIVER_ADDRESS,
        config.link_timeout_ms,
    );
    or_halt(
        link.init(pins::LORA_TRANSMITTER_ADDRESS, pins::LORA_NETWORK_ID, config.radio_frequency_hz),
        "LoRa modem",
        &mut FreeRtos,
    );
    info!("LoRa link up: {} Hz, peer {}", config.radio_frequency_hz, pins::LORA_RECEIVER_ADDRESS);

    // ── 4. Poll loop ──────────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let node = TransmitterNode::new(&config, GpioInput::fence_pulse(), link, clock.now_ms());
    // `Delay` busy-waits below one RTOS tick, keeping the 1 ms sample period.
    PollLoop::new(clock, Delay::new_default(), node).run_forever()
}
