//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements              | Connects to                 |
//! |--------------|-------------------------|-----------------------------|
//! | `hardware`   | InputPin / OutputPin    | ESP32 GPIO                  |
//! |              | AnalogInput             | ESP32 ADC1                  |
//! | `http_sink`  | AlertSink               | HTTP endpoint (JSON POST)   |
//! | `log_sink`   | FenceEventSink          | Serial log output           |
//! |              | AlertSink               | Serial log output           |
//! | `lora_uart`  | RadioLink               | AT-command LoRa UART modem  |
//! | `loopback`   | RadioLink               | In-process packet queue     |
//! | `time`       | Clock / DelayNs         | ESP32 system timer          |
//! | `wifi`       | ConnectivityPort        | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod http_sink;
pub mod log_sink;
pub mod lora_uart;
pub mod loopback;
pub mod time;
pub mod wifi;
