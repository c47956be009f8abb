//! Arm/disarm toggle line driver.
//!
//! The panel input is active LOW: the line idles HIGH and a LOW pulse of
//! fixed width toggles the armed state.  Generic over the `embedded-hal`
//! output and delay traits so the pulse shape is testable on the host.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::debug;

use crate::error::ActuatorError;

pub struct ArmLine<P: OutputPin, D: DelayNs> {
    pin: P,
    delay: D,
}

impl<P: OutputPin, D: DelayNs> ArmLine<P, D> {
    /// Take the pin and drive it to its idle (HIGH) level.
    pub fn new(mut pin: P, delay: D) -> Result<Self, ActuatorError> {
        pin.set_high().map_err(|_| ActuatorError::GpioWriteFailed)?;
        Ok(Self { pin, delay })
    }

    /// Pull the line LOW for `duration_ms`, then release it.  Blocks.
    ///
    /// The line is released even if pulling it low reported an error.
    pub fn pulse(&mut self, duration_ms: u32) -> Result<(), ActuatorError> {
        debug!("arm_line: LOW for {}ms", duration_ms);
        let low = self.pin.set_low();
        if low.is_ok() {
            self.delay.delay_ms(duration_ms);
        }
        let high = self.pin.set_high();
        low.and(high).map_err(|_| ActuatorError::GpioWriteFailed)
    }
}
