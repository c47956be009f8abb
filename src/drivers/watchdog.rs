//! Task watchdog for the polling loop.
//!
//! A blocked SMS send or a modem that never answers a delete stalls the
//! loop; the TWDT then panics and the chip reboots.  `feed()` is called
//! once per iteration.

use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct Watchdog {
    timeout_ms: u32,
    /// `false` when the task could not be subscribed; feeding is then a no-op.
    armed: bool,
    feeds: u32,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    pub fn new(timeout_ms: u32) -> Self {
        let armed = subscribe_current_task(timeout_ms);
        if armed {
            info!("Watchdog: polling task subscribed, {}ms to reset", timeout_ms);
        } else {
            warn!("Watchdog: not subscribed, the loop runs unguarded");
        }
        Self { timeout_ms, armed, feeds: 0 }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Number of feeds since boot (wraps).
    pub fn feeds(&self) -> u32 {
        self.feeds
    }

    pub fn feed(&mut self) {
        if !self.armed {
            return;
        }
        self.feeds = self.feeds.wrapping_add(1);
        reset_current_task();
    }
}

#[cfg(target_os = "espidf")]
fn subscribe_current_task(timeout_ms: u32) -> bool {
    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: cfg outlives the call; a null handle means the calling task.
    unsafe {
        let ret = esp_task_wdt_reconfigure(&cfg);
        if ret != ESP_OK {
            warn!("Watchdog: reconfigure returned {}", ret);
        }
        esp_task_wdt_add(core::ptr::null_mut()) == ESP_OK
    }
}

#[cfg(target_os = "espidf")]
fn reset_current_task() {
    // SAFETY: only reached after a successful esp_task_wdt_add.
    unsafe {
        esp_task_wdt_reset();
    }
}

#[cfg(not(target_os = "espidf"))]
fn subscribe_current_task(timeout_ms: u32) -> bool {
    log::debug!("Watchdog(sim): {}ms", timeout_ms);
    true
}

#[cfg(not(target_os = "espidf"))]
fn reset_current_task() {}
