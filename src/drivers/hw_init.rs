//! One-shot hardware peripheral initialization.
//!
//! Configures the panel indicator inputs, the optional ADC channel for the
//! armed indicator, and the SIM800L power pins using raw ESP-IDF sys calls.
//! Called once from `main()` before the polling loop starts.
//!
//! On non-espidf targets the reads are served from atomics that tests and
//! simulations set with [`sim_set_input`] / [`sim_set_adc`].

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::config::InputMode;
use crate::error::InitError;
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals(armed_input: InputMode) -> Result<(), InitError> {
    // SAFETY: Called once from main() before the polling loop; single-threaded.
    unsafe {
        init_inputs()?;
        if armed_input == InputMode::Analog {
            init_adc()?;
        }
        init_modem_power()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(armed_input: InputMode) -> Result<(), InitError> {
    log::info!("hw_init(sim): peripheral init skipped (armed input {:?})", armed_input);
    Ok(())
}

// ── GPIO inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_inputs() -> Result<(), InitError> {
    for &pin in &[pins::ARMED_GPIO, pins::SIREN_GPIO] {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(InitError::GpioConfigFailed(ret));
        }
    }
    info!("hw_init: panel inputs configured (armed={}, siren={})", pins::ARMED_GPIO, pins::SIREN_GPIO);
    Ok(())
}

/// Level of an input pin, `true` = high.
#[cfg(target_os = "espidf")]
pub fn read_input(gpio: i32) -> bool {
    // SAFETY: read-only register access on a pin configured in init_inputs().
    unsafe { gpio_get_level(gpio) != 0 }
}

// ── ADC (oneshot, armed indicator) ────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC2_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Written once by `init_adc()` before the polling loop starts;
/// read afterwards only from the polling loop.
#[cfg(target_os = "espidf")]
unsafe fn adc2_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC2_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), InitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_2,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC2_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC2_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(InitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc2_handle(), pins::ARMED_ADC_CHANNEL, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(InitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC2 CH{} configured (armed indicator)", pins::ARMED_ADC_CHANNEL);
    Ok(())
}

/// Raw 12-bit reading of the armed indicator; 0 on read failure.
#[cfg(target_os = "espidf")]
pub fn armed_adc_read() -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc2_handle() contract: single-threaded polling-loop access only.
    let ret = unsafe { adc_oneshot_read(adc2_handle(), pins::ARMED_ADC_CHANNEL, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

// ── SIM800L power ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_modem_power() -> Result<(), InitError> {
    let mask = (1u64 << pins::MODEM_PWRKEY_GPIO)
        | (1u64 << pins::MODEM_RST_GPIO)
        | (1u64 << pins::MODEM_POWER_GPIO);
    let cfg = gpio_config_t {
        pin_bit_mask: mask,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(InitError::GpioConfigFailed(ret));
    }
    unsafe {
        gpio_set_level(pins::MODEM_PWRKEY_GPIO, 0);
        gpio_set_level(pins::MODEM_RST_GPIO, 1);
    }
    Ok(())
}

/// Switch the modem supply on.  The caller waits for it to boot.
#[cfg(target_os = "espidf")]
pub fn modem_power_on() {
    // SAFETY: pin configured as output in init_modem_power().
    unsafe {
        gpio_set_level(pins::MODEM_POWER_GPIO, 1);
    }
    info!("hw_init: SIM800L powered");
}

// ── Simulation stubs ──────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

    use crate::pins;

    static ARMED: AtomicBool = AtomicBool::new(false);
    static SIREN: AtomicBool = AtomicBool::new(false);
    static ARMED_ADC: AtomicU16 = AtomicU16::new(0);

    pub fn set_input(gpio: i32, level: bool) {
        match gpio {
            pins::ARMED_GPIO => ARMED.store(level, Ordering::Relaxed),
            pins::SIREN_GPIO => SIREN.store(level, Ordering::Relaxed),
            _ => log::warn!("hw_init(sim): GPIO {} is not a panel input", gpio),
        }
    }

    pub fn input(gpio: i32) -> bool {
        match gpio {
            pins::ARMED_GPIO => ARMED.load(Ordering::Relaxed),
            pins::SIREN_GPIO => SIREN.load(Ordering::Relaxed),
            _ => false,
        }
    }

    pub fn set_adc(counts: u16) {
        ARMED_ADC.store(counts, Ordering::Relaxed);
    }

    pub fn adc() -> u16 {
        ARMED_ADC.load(Ordering::Relaxed)
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn read_input(gpio: i32) -> bool {
    sim::input(gpio)
}

#[cfg(not(target_os = "espidf"))]
pub fn armed_adc_read() -> u16 {
    sim::adc()
}

#[cfg(not(target_os = "espidf"))]
pub fn modem_power_on() {
    log::info!("hw_init(sim): modem power on");
}

/// Drive a simulated panel input.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_input(gpio: i32, level: bool) {
    sim::set_input(gpio, level);
}

/// Set the simulated armed-indicator ADC reading.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(counts: u16) {
    sim::set_adc(counts);
}
