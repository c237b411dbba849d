//! Desktop-hosted stand-in for a real I2C peripheral, used by `board-core`'s
//! own tests and by anything embedding the core without real hardware.
//! Mirrors the role of `services/llio`'s `i2c/hosted.rs`.
use std::collections::BTreeMap;

use super::I2cBus;

#[derive(Default)]
pub struct HostedI2cBus {
    enabled: bool,
    /// address -> register file; `write` overwrites it, `read` echoes it.
    devices: BTreeMap<u8, Vec<u8>>,
}

impl HostedI2cBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a simulated loopback device at `address`.
    pub fn add_device(&mut self, address: u8) {
        self.devices.entry(address).or_insert_with(Vec::new);
    }
}

impl I2cBus for HostedI2cBus {
    fn enable(&mut self, _bus_id: u8, _frequency_khz: u16) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn probe(&mut self, address: u8) -> bool {
        self.enabled && self.devices.contains_key(&address)
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize, ()> {
        if !self.enabled {
            return Err(());
        }
        let reg = self.devices.get_mut(&address).ok_or(())?;
        reg.clear();
        reg.extend_from_slice(data);
        Ok(data.len())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, ()> {
        if !self.enabled {
            return Err(());
        }
        let reg = self.devices.get(&address).ok_or(())?;
        let n = buf.len().min(reg.len());
        buf[..n].copy_from_slice(&reg[..n]);
        Ok(n)
    }
}
