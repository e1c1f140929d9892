//! esp-hal binding of the interrupt bridge's GPIO capability

use core::convert::Infallible;

use embedded_hal::digital::ErrorType;
use esp_hal::gpio::{Event, Input, InputConfig, Pull};
use iis2dlpc_core::{InterruptMode, InterruptPin};

/// Accelerometer interrupt line on an ESP32-S3 GPIO.
///
/// The sensor drives its pads active high, so "edge to active" is a rising
/// edge.
pub struct EspInterruptPin<'d> {
    input: Input<'d>,
    pull: Pull,
}

impl<'d> EspInterruptPin<'d> {
    pub fn new(input: Input<'d>, pull: Pull) -> Self {
        Self { input, pull }
    }

    /// Read and acknowledge the pin's interrupt status. Called from the GPIO
    /// interrupt handler to build the pin mask handed to the bridge.
    pub fn take_pending(&mut self) -> bool {
        let pending = self.input.is_interrupt_set();
        if pending {
            self.input.clear_interrupt();
        }
        pending
    }
}

impl ErrorType for EspInterruptPin<'_> {
    type Error = Infallible;
}

impl InterruptPin for EspInterruptPin<'_> {
    fn configure_input(&mut self) -> Result<(), Self::Error> {
        self.input
            .apply_config(&InputConfig::default().with_pull(self.pull));
        Ok(())
    }

    fn set_interrupt(&mut self, mode: InterruptMode) -> Result<(), Self::Error> {
        match mode {
            InterruptMode::Disabled => self.input.unlisten(),
            InterruptMode::EdgeToActive => {
                // Drop a status bit latched while the pin was masked
                self.input.clear_interrupt();
                self.input.listen(Event::RisingEdge);
            }
        }
        Ok(())
    }
}
