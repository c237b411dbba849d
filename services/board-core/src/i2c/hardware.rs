//! Real-silicon I2C backend, built on `embedded-hal`'s blocking I2C traits
//! so this core stays portable across MCU families rather than binding to
//! one vendor HAL. Mirrors the role of `services/llio`'s `i2c/hardware.rs`.
use embedded_hal::blocking::i2c::{Read, Write, WriteRead};

use super::I2cBus;

pub struct HardwareI2cBus<I> {
    i2c: I,
}

impl<I> HardwareI2cBus<I> {
    pub fn new(i2c: I) -> Self {
        HardwareI2cBus { i2c }
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I> I2cBus for HardwareI2cBus<I>
where
    I: Read + Write + WriteRead,
{
    fn enable(&mut self, _bus_id: u8, _frequency_khz: u16) {
        // Peripheral clock/pin muxing is owned by the board bring-up code
        // that constructs `I`; nothing to do once we hold a live instance.
    }

    fn disable(&mut self) {}

    fn probe(&mut self, address: u8) -> bool {
        let mut scratch = [0u8; 1];
        self.i2c.read(address, &mut scratch).is_ok()
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize, ()> {
        self.i2c.write(address, data).map(|_| data.len()).map_err(|_| ())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, ()> {
        self.i2c.read(address, buf).map(|_| buf.len()).map_err(|_| ())
    }
}
