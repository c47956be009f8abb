//! Panel adapter: bridges the indicator inputs and the arm line to
//! [`PanelPort`].
//!
//! This is the only module besides the drivers that touches panel
//! hardware.  On non-espidf targets the input reads come from the
//! simulation stubs in [`hw_init`](crate::drivers::hw_init).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::app::ports::PanelPort;
use crate::config::InputMode;
use crate::drivers::arm_line::ArmLine;
use crate::drivers::hw_init;
use crate::error::ActuatorError;
use crate::monitor::{Line, RawSample};
use crate::pins;

/// Concrete adapter that combines the panel wiring behind [`PanelPort`].
pub struct PanelAdapter<P: OutputPin, D: DelayNs> {
    arm_line: ArmLine<P, D>,
    armed_input: InputMode,
}

impl<P: OutputPin, D: DelayNs> PanelAdapter<P, D> {
    pub fn new(arm_line: ArmLine<P, D>, armed_input: InputMode) -> Self {
        Self { arm_line, armed_input }
    }
}

impl<P: OutputPin, D: DelayNs> PanelPort for PanelAdapter<P, D> {
    fn read_line(&mut self, line: Line) -> RawSample {
        match (line, self.armed_input) {
            (Line::Armed, InputMode::Digital) => RawSample::Digital(hw_init::read_input(pins::ARMED_GPIO)),
            (Line::Armed, InputMode::Analog) => RawSample::Analog(hw_init::armed_adc_read()),
            (Line::Siren, _) => RawSample::Digital(hw_init::read_input(pins::SIREN_GPIO)),
        }
    }

    fn pulse_arm_line(&mut self, duration_ms: u32) -> Result<(), ActuatorError> {
        self.arm_line.pulse(duration_ms)
    }
}
