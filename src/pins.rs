//! GPIO / peripheral pin assignments for the fence monitor boards.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  All three node roles use the same ESP32
//! (classic) module, so one table covers them.

// ---------------------------------------------------------------------------
// Transmitter node: fence pulse input
// ---------------------------------------------------------------------------

/// Digital input: conditioned fence pulse line (HIGH while a pulse is present).
/// GPIO34 is input-only on the ESP32, with no internal pulls.
pub const FENCE_PULSE_GPIO: i32 = 34;

// ---------------------------------------------------------------------------
// Guard node: voltage sense, relay, tamper switch
// ---------------------------------------------------------------------------

/// Analog input: fence voltage through a resistive divider (0 – 3.3 V).
/// ADC1 channel 7 (GPIO 35 on the ESP32).
pub const FENCE_VOLTAGE_ADC_GPIO: i32 = 35;
/// ADC1 channel backing [`FENCE_VOLTAGE_ADC_GPIO`].
pub const FENCE_VOLTAGE_ADC_CHANNEL: u32 = 7;

/// Digital output: fence power relay coil.  HIGH = relay closed (fence energised).
pub const RELAY_GPIO: i32 = 23;

/// Digital input with pull-up: enclosure tamper switch, active LOW.
pub const TAMPER_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// LoRa UART modem (transmitter and receiver nodes)
// ---------------------------------------------------------------------------

/// UART port number for the LoRa modem.
pub const LORA_UART_NUM: i32 = 2;
/// ESP32 TX → modem RX.
pub const LORA_UART_TX_GPIO: i32 = 17;
/// ESP32 RX ← modem TX.
pub const LORA_UART_RX_GPIO: i32 = 16;
/// Modem factory baud rate.
pub const LORA_UART_BAUD: u32 = 115_200;

/// Modem address of the transmitter node.
pub const LORA_TRANSMITTER_ADDRESS: u16 = 1;
/// Modem address of the receiver node.
pub const LORA_RECEIVER_ADDRESS: u16 = 2;
/// Shared network id for both modems.
pub const LORA_NETWORK_ID: u8 = 6;
