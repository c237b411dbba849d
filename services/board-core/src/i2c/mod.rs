//! I2C bus engine: configure/init/deinit/reset/frequency/scan/start/stop
//! plus chunked read/write. Grounded on `firmware/common/i2c.c` and the
//! `I2CState` lifecycle in `SPEC_FULL.md` §3/§4.2.
#[cfg(feature = "hosted")]
mod hosted;
#[cfg(feature = "hosted")]
pub use hosted::HostedI2cBus;

#[cfg(feature = "hardware")]
mod hardware;
#[cfg(feature = "hardware")]
pub use hardware::HardwareI2cBus;

use core::fmt;

use bridge_proto::PinOwners;

use crate::config::{BoardConfig, FirmwareVersion};
use crate::error::{Error, I2cError};
use crate::pin_registry::PinRegistry;

/// Backend an `I2cEngine` drives. A real build talks to silicon
/// (`HardwareI2cBus`); tests and the desktop-hosted build talk to an
/// in-memory fake (`HostedI2cBus`).
pub trait I2cBus {
    fn enable(&mut self, bus_id: u8, frequency_khz: u16);
    fn disable(&mut self);
    /// Probe-only: does any device ACK at `address`? Used by `scan`.
    fn probe(&mut self, address: u8) -> bool;
    /// Write `data` to `address`, deferring STOP. `Err` on NACK/timeout.
    fn write(&mut self, address: u8, data: &[u8]) -> Result<usize, ()>;
    /// Read `buf.len()` bytes from `address`. `Err` on NACK/timeout.
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize, ()>;
}

#[derive(Debug, Copy, Clone)]
pub struct I2cState {
    pub is_ready: bool,
    pub is_started: bool,
    pub is_read_op: bool,
    pub bus_id: u8,
    pub sda_pin: u8,
    pub scl_pin: u8,
    pub frequency_khz: u16,
    pub address: u8,
}

/// Highest address `scan` probes, exclusive -- matches the source's
/// `0x00..0x77` inclusive sweep.
const SCAN_ADDRESS_LIMIT: u8 = 0x78;

pub struct ScanResult {
    pub addresses: [u8; SCAN_ADDRESS_LIMIT as usize],
    pub count: usize,
}

impl ScanResult {
    pub fn found(&self) -> &[u8] {
        &self.addresses[..self.count]
    }

    /// Render the wire reply: `"AA.BB.CC.\r\n"` or `"Z\r\n"` if empty.
    pub fn write_reply(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        if self.count == 0 {
            return write!(w, "Z\r\n");
        }
        for addr in self.found() {
            write!(w, "{:02X}.", addr)?;
        }
        write!(w, "\r\n")
    }
}

pub struct I2cEngine<B: I2cBus> {
    pub state: I2cState,
    bus: B,
}

impl<B: I2cBus> I2cEngine<B> {
    /// Direct access to the backend, for wiring up a simulated bus (or
    /// peeking at a hardware one) from outside this module.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn new(bus: B, cfg: &BoardConfig) -> Self {
        I2cEngine {
            state: I2cState {
                is_ready: false,
                is_started: false,
                is_read_op: false,
                bus_id: cfg.default_i2c_bus,
                sda_pin: cfg.default_sda_pin,
                scl_pin: cfg.default_scl_pin,
                frequency_khz: 400,
                address: 0xFF,
            },
            bus,
        }
    }

    /// Reject if the bus is already ready, the pair isn't permitted on this
    /// board, `sda == scl`, or either pin is owned by another subsystem.
    pub fn configure(
        &mut self,
        pins: &PinRegistry,
        cfg: &BoardConfig,
        bus_id: u8,
        sda: u8,
        scl: u8,
    ) -> Result<(), Error> {
        if self.state.is_ready {
            return Err(Error::I2c(I2cError::CouldNotConfigure));
        }
        if sda == scl || !cfg.is_permitted_pair(bus_id, sda, scl) {
            return Err(Error::I2c(I2cError::CouldNotConfigure));
        }
        if pins.is_taken(sda) || pins.is_taken(scl) {
            return Err(Error::I2c(I2cError::CouldNotConfigure));
        }
        self.state.bus_id = bus_id;
        self.state.sda_pin = sda;
        self.state.scl_pin = scl;
        log::debug!("i2c: configured bus {} on sda={} scl={}", bus_id, sda, scl);
        Ok(())
    }

    /// Acquire `sda`/`scl` and enable the peripheral. A no-op ACK if
    /// already ready.
    pub fn init(&mut self, pins: &mut PinRegistry) -> Result<(), Error> {
        if self.state.is_ready {
            return Ok(());
        }
        if pins.is_taken_by_other(self.state.sda_pin, PinOwners::I2C)
            || pins.is_taken_by_other(self.state.scl_pin, PinOwners::I2C)
        {
            return Err(Error::I2c(I2cError::PinsAlreadyInUse));
        }
        pins.acquire(self.state.sda_pin, PinOwners::I2C).ok();
        pins.acquire(self.state.scl_pin, PinOwners::I2C).ok();
        self.bus.enable(self.state.bus_id, self.state.frequency_khz);
        self.state.is_ready = true;
        log::info!("i2c: bus {} ready at {}kHz", self.state.bus_id, self.state.frequency_khz);
        Ok(())
    }

    pub fn deinit(&mut self, pins: &mut PinRegistry) {
        self.bus.disable();
        pins.release(self.state.sda_pin, PinOwners::I2C);
        pins.release(self.state.scl_pin, PinOwners::I2C);
        self.state.is_ready = false;
        self.state.is_started = false;
    }

    /// Disable and re-enable the peripheral at the current frequency.
    pub fn reset(&mut self) {
        self.bus.disable();
        self.bus.enable(self.state.bus_id, self.state.frequency_khz);
        self.state.is_started = false;
    }

    /// Accepts exactly 100 or 400; anything else is silently ignored (ACK)
    /// per the original firmware and Testable Property 5.
    pub fn set_frequency(&mut self, khz: u16) {
        if khz != 100 && khz != 400 {
            log::warn!("i2c: ignoring unsupported frequency {}kHz", khz);
            return;
        }
        if self.state.frequency_khz != khz {
            self.state.frequency_khz = khz;
            if self.state.is_ready {
                self.reset();
            }
        }
    }

    pub fn start(&mut self, addr_op_byte: u8) -> Result<(), Error> {
        if !self.state.is_ready {
            return Err(Error::I2c(I2cError::NotReady));
        }
        self.state.address = (addr_op_byte & 0xFE) >> 1;
        self.state.is_read_op = (addr_op_byte & 0x01) == 1;
        self.state.is_started = true;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), Error> {
        if !(self.state.is_ready && self.state.is_started) {
            return Err(Error::I2c(I2cError::AlreadyStopped));
        }
        let _ = self.bus.write(self.state.address, &[]);
        self.state.is_started = false;
        self.state.is_read_op = false;
        Ok(())
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        if !self.state.is_started {
            return Err(Error::I2c(I2cError::NotStarted));
        }
        self.bus
            .write(self.state.address, data)
            .map(|_| ())
            .map_err(|_| Error::I2c(I2cError::CouldNotWrite))
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        if !self.state.is_started {
            return Err(Error::I2c(I2cError::NotStarted));
        }
        self.bus
            .read(self.state.address, buf)
            .map(|_| ())
            .map_err(|_| Error::I2c(I2cError::CouldNotRead))
    }

    pub fn scan(&mut self) -> ScanResult {
        let mut result = ScanResult { addresses: [0; SCAN_ADDRESS_LIMIT as usize], count: 0 };
        for addr in 0..SCAN_ADDRESS_LIMIT {
            if self.bus.probe(addr) {
                result.addresses[result.count] = addr;
                result.count += 1;
            }
        }
        result
    }

    pub fn write_status(
        &self,
        fw: FirmwareVersion,
        chip_id_hex16: &str,
        model: &str,
        w: &mut dyn fmt::Write,
    ) -> fmt::Result {
        write!(
            w,
            "{}.{}.{}.{}.{}.{}.{}.{}.{}.{}.{}.{}.{}\r\n",
            self.state.is_ready as u8,
            self.state.is_started as u8,
            self.state.bus_id,
            self.state.sda_pin,
            self.state.scl_pin,
            self.state.frequency_khz,
            self.state.address,
            fw.major,
            fw.minor,
            fw.patch,
            fw.build,
            chip_id_hex16,
            model,
        )
    }
}
