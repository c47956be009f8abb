//! Escalation timer.
//!
//! Implements [`TimerPort`] with a periodic timer whose only job is to mark
//! a tick in a [`TickGate`]; the polling loop consumes it.
//!
//! - **`target_os = "espidf"`**: an `esp_timer` dispatched from the ESP
//!   timer task (not ISR).  The callback never blocks and never touches
//!   the modem.
//! - **`not(target_os = "espidf")`**: a worker thread per run that sleeps
//!   one period and fires; it exits as soon as its run is closed.

use log::{error, info};

use crate::app::ports::TimerPort;
use crate::error::InitError;
use crate::escalation::TickGate;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Shared with the esp_timer callback, which cannot capture state.
#[cfg(target_os = "espidf")]
static GATE: TickGate = TickGate::new();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn escalation_tick_cb(_arg: *mut core::ffi::c_void) {
    GATE.fire(GATE.current_epoch());
}

pub struct EscalationTimer {
    #[cfg(target_os = "espidf")]
    handle: esp_timer_handle_t,
    #[cfg(not(target_os = "espidf"))]
    gate: std::sync::Arc<TickGate>,
}

#[cfg(target_os = "espidf")]
impl EscalationTimer {
    /// Create the (stopped) esp_timer.
    pub fn new() -> Result<Self, InitError> {
        let mut handle: esp_timer_handle_t = core::ptr::null_mut();
        let args = esp_timer_create_args_t {
            callback: Some(escalation_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"escalation\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        // SAFETY: args outlives the call; handle is written by esp_timer_create.
        let ret = unsafe { esp_timer_create(&args, &mut handle) };
        if ret != ESP_OK {
            return Err(InitError::TimerCreateFailed(ret));
        }
        info!("hw_timer: escalation timer created");
        Ok(Self { handle })
    }
}

#[cfg(target_os = "espidf")]
impl TimerPort for EscalationTimer {
    fn start_periodic(&mut self, period_ms: u32) -> Result<(), InitError> {
        GATE.open();
        // SAFETY: handle is valid for the lifetime of self.
        let ret = unsafe {
            // Not running is the expected case.
            esp_timer_stop(self.handle);
            esp_timer_start_periodic(self.handle, u64::from(period_ms) * 1000)
        };
        if ret != ESP_OK {
            GATE.close();
            error!("hw_timer: escalation timer start failed (rc={})", ret);
            return Err(InitError::TimerStartFailed(ret));
        }
        info!("hw_timer: escalation every {}ms", period_ms);
        Ok(())
    }

    fn stop(&mut self) {
        GATE.close();
        // SAFETY: handle is valid for the lifetime of self.
        unsafe {
            esp_timer_stop(self.handle);
        }
        info!("hw_timer: escalation timer stopped");
    }

    fn take_tick(&mut self) -> bool {
        GATE.take()
    }

    fn is_running(&self) -> bool {
        GATE.is_open()
    }
}

#[cfg(target_os = "espidf")]
impl Drop for EscalationTimer {
    fn drop(&mut self) {
        GATE.close();
        // SAFETY: handle came from esp_timer_create and is deleted once.
        unsafe {
            esp_timer_stop(self.handle);
            esp_timer_delete(self.handle);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl EscalationTimer {
    pub fn new() -> Result<Self, InitError> {
        log::info!("hw_timer(sim): thread-backed escalation timer");
        Ok(Self {
            gate: std::sync::Arc::new(TickGate::new()),
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl TimerPort for EscalationTimer {
    fn start_periodic(&mut self, period_ms: u32) -> Result<(), InitError> {
        let epoch = self.gate.open();
        let gate = std::sync::Arc::clone(&self.gate);
        let period = std::time::Duration::from_millis(u64::from(period_ms));
        let spawned = std::thread::Builder::new()
            .name("escalation-timer".into())
            .spawn(move || {
                loop {
                    std::thread::sleep(period);
                    if !gate.fire(epoch) {
                        break;
                    }
                }
            });
        if let Err(e) = spawned {
            self.gate.close();
            error!("hw_timer(sim): worker spawn failed: {}", e);
            return Err(InitError::TimerStartFailed(-1));
        }
        info!("hw_timer(sim): escalation every {}ms", period_ms);
        Ok(())
    }

    fn stop(&mut self) {
        self.gate.close();
        info!("hw_timer(sim): escalation timer stopped");
    }

    fn take_tick(&mut self) -> bool {
        self.gate.take()
    }

    fn is_running(&self) -> bool {
        self.gate.is_open()
    }
}

#[cfg(not(target_os = "espidf"))]
impl Drop for EscalationTimer {
    fn drop(&mut self) {
        self.gate.close();
    }
}
