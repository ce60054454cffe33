//! One-shot hardware peripheral initialization.
//!
//! Configures the fence monitor's GPIO directions and the ADC channel
//! using raw ESP-IDF sys calls.  Called once from each node's `main()`
//! before the poll loop starts.
//!
//! On host targets the same `gpio_read` / `gpio_write` / `adc1_read`
//! helpers read and write simulation atomics instead, so the adapters
//! and the simulator exercise identical call paths.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::error::SensorFault;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::AdcInitFailed(_) => Self::Init("ADC1 init failed"),
            HwInitError::GpioConfigFailed(_) => Self::Init("GPIO config failed"),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

/// Configure the pulse-line input only (transmitter node).
#[cfg(target_os = "espidf")]
pub fn init_pulse_input() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the poll loop; single-threaded.
    unsafe { config_input(pins::FENCE_PULSE_GPIO, false)? };
    info!("hw_init: fence pulse input on GPIO{}", pins::FENCE_PULSE_GPIO);
    Ok(())
}

/// Configure relay output, tamper input and the voltage ADC (guard node).
///
/// The relay pin is left LOW (fence de-energised) until the guard
/// service explicitly closes it.
#[cfg(target_os = "espidf")]
pub fn init_guard_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the poll loop; single-threaded.
    unsafe {
        config_input(pins::TAMPER_GPIO, true)?;
        config_output(pins::RELAY_GPIO)?;
        init_adc()?;
    }
    info!("hw_init: guard peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_pulse_input() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): pulse input init skipped");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_guard_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): guard peripheral init skipped");
    Ok(())
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn config_input(pin: i32, pull_up: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn config_output(pin: i32) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(pin, 0) };
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> bool {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was configured during init. Main-loop only.
    (unsafe { gpio_set_level(pin, u32::from(high)) }) == ESP_OK as i32
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  `init_adc()` completes before the poll loop.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    // 12 dB attenuation gives the full 0 – 3.3 V input range.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe {
        adc_oneshot_config_channel(adc1_handle(), pins::FENCE_VOLTAGE_ADC_CHANNEL, &chan_cfg)
    };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 CH{} configured (fence voltage)", pins::FENCE_VOLTAGE_ADC_CHANNEL);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorFault> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorFault::AdcReadFailed);
    }
    u16::try_from(raw).map_err(|_| SensorFault::AdcReadFailed)
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

    const GPIO_COUNT: usize = 40;

    static GPIO_LEVELS: [AtomicBool; GPIO_COUNT] = [const { AtomicBool::new(false) }; GPIO_COUNT];
    static ADC_RAW: AtomicU16 = AtomicU16::new(0);
    static ADC_FAULT: AtomicBool = AtomicBool::new(false);

    fn slot(pin: i32) -> Option<&'static AtomicBool> {
        usize::try_from(pin).ok().and_then(|i| GPIO_LEVELS.get(i))
    }

    pub fn read(pin: i32) -> bool {
        slot(pin).is_some_and(|s| s.load(Ordering::Relaxed))
    }

    pub fn write(pin: i32, high: bool) -> bool {
        match slot(pin) {
            Some(s) => {
                s.store(high, Ordering::Relaxed);
                true
            }
            None => false,
        }
    }

    pub fn set_adc(raw: u16) {
        ADC_RAW.store(raw, Ordering::Relaxed);
    }

    pub fn set_adc_fault(fault: bool) {
        ADC_FAULT.store(fault, Ordering::Relaxed);
    }

    pub fn adc() -> Option<u16> {
        if ADC_FAULT.load(Ordering::Relaxed) {
            None
        } else {
            Some(ADC_RAW.load(Ordering::Relaxed))
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim::read(pin)
}

/// Returns `false` when the pin number is invalid.
#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> bool {
    sim::write(pin, high)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Result<u16, SensorFault> {
    sim::adc().ok_or(SensorFault::AdcReadFailed)
}

/// Drive a simulated input level (e.g. the pulse line or tamper switch).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gpio(pin: i32, high: bool) {
    sim::write(pin, high);
}

/// Current simulated level of any pin, including outputs like the relay.
#[cfg(not(target_os = "espidf"))]
pub fn sim_gpio_level(pin: i32) -> bool {
    sim::read(pin)
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(raw: u16) {
    sim::set_adc(raw);
}

/// Make subsequent ADC reads fail until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_fault(fault: bool) {
    sim::set_adc_fault(fault);
}
