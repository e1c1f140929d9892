//! Bus access for the IIS2DLPC
//!
//! The driver only ever needs burst reads and single-byte writes, so the
//! interface is kept that small. Register auto-increment (`CTRL2.IF_ADD_INC`)
//! is on after reset, which both implementations rely on for burst reads.

use embedded_hal_async::i2c::I2c;
use embedded_hal_async::spi::{Operation, SpiDevice};

/// Abstraction over the low-level register access required by the driver.
pub trait RegisterInterface {
    /// Error type produced by the concrete bus implementation.
    type Error: core::fmt::Debug;

    /// Reads consecutive registers starting at `register` into `buf`.
    fn read_registers(
        &mut self,
        register: u8,
        buf: &mut [u8],
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Writes a single register.
    fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Reads a single register.
    fn read_register(&mut self, register: u8) -> impl Future<Output = Result<u8, Self::Error>> {
        async move {
            let mut value = [0u8; 1];
            self.read_registers(register, &mut value).await?;
            Ok(value[0])
        }
    }
}

/// I2C transport
pub struct I2cInterface<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> I2cInterface<I> {
    /// Create a new interface. `address` is usually
    /// [`I2C_ADDR_SA0_LOW`](crate::registers::I2C_ADDR_SA0_LOW) or
    /// [`I2C_ADDR_SA0_HIGH`](crate::registers::I2C_ADDR_SA0_HIGH).
    pub const fn new(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Give back the underlying bus.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> RegisterInterface for I2cInterface<I> {
    type Error = I::Error;

    async fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.i2c.write_read(self.address, &[register], buf).await
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[register, value]).await
    }
}

/// Read flag in the SPI address byte
const SPI_READ: u8 = 0x80;

/// 4-wire SPI transport
pub struct SpiInterface<S> {
    spi: S,
}

impl<S: SpiDevice> SpiInterface<S> {
    pub const fn new(spi: S) -> Self {
        Self { spi }
    }

    /// Give back the underlying device.
    pub fn release(self) -> S {
        self.spi
    }
}

impl<S: SpiDevice> RegisterInterface for SpiInterface<S> {
    type Error = S::Error;

    async fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi
            .transaction(&mut [Operation::Write(&[register | SPI_READ]), Operation::Read(buf)])
            .await
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.spi.write(&[register & !SPI_READ, value]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{CTRL4_INT1_PAD_CTRL, I2C_ADDR_SA0_HIGH, STATUS_DUP};
    use embassy_futures::block_on;
    use std::vec::Vec;

    /// Records every I2C call and answers reads with a fixed pattern.
    #[derive(Default)]
    struct RecordingI2c {
        writes: Vec<(u8, Vec<u8>)>,
    }

    impl embedded_hal_async::i2c::ErrorType for RecordingI2c {
        type Error = core::convert::Infallible;
    }

    impl I2c for RecordingI2c {
        async fn transaction(
            &mut self,
            address: u8,
            operations: &mut [embedded_hal_async::i2c::Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                match op {
                    embedded_hal_async::i2c::Operation::Write(bytes) => {
                        self.writes.push((address, bytes.to_vec()))
                    }
                    embedded_hal_async::i2c::Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = 0xA0 + i as u8;
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSpi {
        written: Vec<Vec<u8>>,
    }

    impl embedded_hal_async::spi::ErrorType for RecordingSpi {
        type Error = core::convert::Infallible;
    }

    impl SpiDevice for RecordingSpi {
        async fn transaction(
            &mut self,
            operations: &mut [Operation<'_, u8>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.written.push(bytes.to_vec()),
                    Operation::Read(buf) => buf.fill(0x5A),
                    _ => {}
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_i2c_read_prefixes_register_address() {
        let mut iface = I2cInterface::new(RecordingI2c::default(), I2C_ADDR_SA0_HIGH);
        let mut buf = [0u8; 3];

        block_on(iface.read_registers(STATUS_DUP, &mut buf)).unwrap();

        assert_eq!(buf, [0xA0, 0xA1, 0xA2]);
        let i2c = iface.release();
        assert_eq!(i2c.writes, [(I2C_ADDR_SA0_HIGH, std::vec![STATUS_DUP])]);
    }

    #[test]
    fn test_i2c_write_sends_register_then_value() {
        let mut iface = I2cInterface::new(RecordingI2c::default(), I2C_ADDR_SA0_HIGH);

        block_on(iface.write_register(CTRL4_INT1_PAD_CTRL, 0x41)).unwrap();

        let i2c = iface.release();
        assert_eq!(
            i2c.writes,
            [(I2C_ADDR_SA0_HIGH, std::vec![CTRL4_INT1_PAD_CTRL, 0x41])]
        );
    }

    #[test]
    fn test_spi_read_sets_read_flag() {
        let mut iface = SpiInterface::new(RecordingSpi::default());

        let value = block_on(iface.read_register(STATUS_DUP)).unwrap();

        assert_eq!(value, 0x5A);
        assert_eq!(iface.release().written, [std::vec![STATUS_DUP | 0x80]]);
    }

    #[test]
    fn test_spi_write_clears_read_flag() {
        let mut iface = SpiInterface::new(RecordingSpi::default());

        block_on(iface.write_register(CTRL4_INT1_PAD_CTRL, 0x01)).unwrap();

        assert_eq!(iface.release().written, [std::vec![CTRL4_INT1_PAD_CTRL, 0x01]]);
    }
}
