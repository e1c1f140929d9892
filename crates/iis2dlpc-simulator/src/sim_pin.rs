use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::ErrorType;
use iis2dlpc_core::{InterruptMode, InterruptPin};

/// GPIO whose interrupt enable is visible to the hardware thread
pub struct SimPin<'a> {
    listening: &'a AtomicBool,
}

impl<'a> SimPin<'a> {
    pub fn new(listening: &'a AtomicBool) -> Self {
        Self { listening }
    }
}

impl ErrorType for SimPin<'_> {
    type Error = Infallible;
}

impl InterruptPin for SimPin<'_> {
    fn configure_input(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_interrupt(&mut self, mode: InterruptMode) -> Result<(), Self::Error> {
        self.listening
            .store(mode == InterruptMode::EdgeToActive, Ordering::SeqCst);
        Ok(())
    }
}
