//! Process-wide restart.

use log::warn;

/// Reset the chip.  Does not return.
#[cfg(target_os = "espidf")]
pub fn restart() -> ! {
    warn!("system: restarting");
    // SAFETY: esp_restart has no preconditions.
    unsafe { esp_idf_svc::sys::esp_restart() }
}

/// Host stand-in: end the process.
#[cfg(not(target_os = "espidf"))]
pub fn restart() -> ! {
    warn!("system(sim): restart requested, exiting");
    std::process::exit(0)
}
