//! Board wiring of the accelerometer

use esp_hal::gpio::{Input, InputConfig, Pull};
use esp_hal::i2c::master::{Config as I2cConfig, ConfigError, I2c};
use esp_hal::peripherals::{GPIO11, GPIO12, GPIO14, I2C0};
use esp_hal::time::Rate;
use iis2dlpc_core::registers::I2C_ADDR_SA0_HIGH;
use iis2dlpc_core::{InterruptConfig, InterruptPad};

use crate::interrupt_pin::EspInterruptPin;

/// I2C bus frequency
pub const I2C_FREQUENCY_KHZ: u32 = 400;

/// SA0 is pulled up on the breakout
pub const ACCEL_I2C_ADDR: u8 = I2C_ADDR_SA0_HIGH;

/// GPIO the sensor's INT1 pad is wired to
pub const ACCEL_INT_GPIO: u8 = 14;

pub const ACCEL_INTERRUPT: InterruptConfig =
    InterruptConfig::new(InterruptPad::Int1, ACCEL_INT_GPIO);

/// Work item id of the accelerometer on the shared work queue
#[cfg(feature = "trigger-global-thread")]
pub const ACCEL_WORK_ID: iis2dlpc_core::WorkId = 0;

/// Create the async I2C bus the accelerometer sits on
pub fn create_i2c_bus(
    i2c0: I2C0<'static>,
    sda: GPIO12<'static>,
    scl: GPIO11<'static>,
) -> Result<I2c<'static, esp_hal::Async>, ConfigError> {
    Ok(I2c::new(
        i2c0,
        I2cConfig::default().with_frequency(Rate::from_khz(I2C_FREQUENCY_KHZ)),
    )?
    .with_sda(sda)
    .with_scl(scl)
    .into_async())
}

/// Interrupt line from the accelerometer's INT1 pad.
///
/// The pad idles low and is not driven before the sensor is configured, so
/// the line gets a pull-down.
pub fn accel_interrupt_pin(gpio: GPIO14<'static>) -> EspInterruptPin<'static> {
    let pull = Pull::Down;
    EspInterruptPin::new(Input::new(gpio, InputConfig::default().with_pull(pull)), pull)
}
