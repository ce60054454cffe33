//! Receiver node: prints every packet from the transmitter, both the raw
//! text with signal quality and the decoded pulse classification.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{config::Config as UartConfig, UartDriver};
use esp_idf_hal::units::Hertz;
use log::info;

use fenceguard::adapters::log_sink::LogEventSink;
use fenceguard::adapters::lora_uart::{LoraUartLink, UartTransport};
use fenceguard::adapters::time::Esp32TimeAdapter;
use fenceguard::config::FenceConfig;
use fenceguard::node::ReceiverNode;
use fenceguard::pins;
use fenceguard::error::Error;
use fenceguard::scheduler::{or_halt, PollLoop};

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("FenceGuard receiver v{}", env!("CARGO_PKG_VERSION"));

    let config = FenceConfig::default();
    config.validate().map_err(Error::from)?;

    let peripherals = Peripherals::take()?;
    let uart = UartDriver::new(
        peripherals.uart2,
        peripherals.pins.gpio17,
        peripherals.pins.gpio16,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::LORA_UART_BAUD)),
    )?;

    let mut link = LoraUartLink::new(
        UartTransport::new(uart),
        pins::LORA_TRANSMITTER_ADDRESS,
        config.link_timeout_ms,
    );
    or_halt(
        link.init(pins::LORA_RECEIVER_ADDRESS, pins::LORA_NETWORK_ID, config.radio_frequency_hz),
        "LoRa modem",
        &mut FreeRtos,
    );
    info!("LoRa receiver ready on {} Hz", config.radio_frequency_hz);

    let node = ReceiverNode::new(&config, link, LogEventSink::new());
    PollLoop::new(Esp32TimeAdapter::new(), FreeRtos, node).run_forever()
}
