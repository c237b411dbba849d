//! 1-Wire bit-bang engine: reset/read/write plus full-bus SEARCH ROM
//! enumeration. Grounded on `firmware/common/onewire.c`; the search
//! algorithm (`search`) is a direct port of `ow_search`, kept bit-for-bit
//! faithful since `SPEC_FULL.md` Testable Property 6 is checked against it.
#[cfg(feature = "hosted")]
mod hosted;
#[cfg(feature = "hosted")]
pub use hosted::HostedOneWireBus;

#[cfg(feature = "hardware")]
mod hardware;
#[cfg(feature = "hardware")]
pub use hardware::HardwareOneWireBus;

use core::fmt;

use bridge_proto::{PinOwners, OW_CMD_SEARCH_ROM, OW_MAX_DEVICES};

use crate::config::FirmwareVersion;
use crate::error::{Error, OneWireError};
use crate::pin_registry::PinRegistry;

/// Backend a `OneWireEngine` bit-bangs through. A single reset/read-bit/
/// write-bit contract, regardless of whether it is driven by real GPIO
/// timing (`HardwareOneWireBus`) or a software device simulation used in
/// tests (`HostedOneWireBus`).
pub trait OneWireBus {
    /// Issue a reset pulse and report whether any device asserted presence.
    fn reset(&mut self) -> bool;
    /// Write a single bit, LSB-first framing handled by the caller.
    fn write_bit(&mut self, bit: u8);
    /// Read a single bit.
    fn read_bit(&mut self) -> u8;
}

#[derive(Debug, Copy, Clone)]
pub struct OneWireState {
    pub is_ready: bool,
    pub data_pin: u8,
    pub device_count: usize,
    pub current_device: usize,
    pub device_ids: [u64; OW_MAX_DEVICES],
}

pub struct OneWireEngine<B: OneWireBus> {
    pub state: OneWireState,
    bus: B,
}

impl<B: OneWireBus> OneWireEngine<B> {
    /// Direct access to the backend, for wiring up a simulated bus from
    /// outside this module.
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn new(bus: B, default_pin: u8) -> Self {
        OneWireEngine {
            state: OneWireState {
                is_ready: false,
                data_pin: default_pin,
                device_count: 0,
                current_device: 0,
                device_ids: [0; OW_MAX_DEVICES],
            },
            bus,
        }
    }

    /// Rejected while `is_ready` or if the pin is already owned.
    pub fn configure(&mut self, pins: &PinRegistry, pin: u8) -> Result<(), Error> {
        if self.state.is_ready || pins.is_taken(pin) {
            return Err(Error::OneWire(OneWireError::CouldNotConfigure));
        }
        self.state.data_pin = pin;
        log::debug!("onewire: configured on pin {}", pin);
        Ok(())
    }

    /// Reset the bus and, if any device asserts presence, enumerate every
    /// device on it via `SEARCH ROM`.
    pub fn init(&mut self, pins: &mut PinRegistry) -> Result<(), Error> {
        if pins.is_taken_by_other(self.state.data_pin, PinOwners::ONEWIRE) {
            return Err(Error::OneWire(OneWireError::PinAlreadyInUse));
        }
        pins.acquire(self.state.data_pin, PinOwners::ONEWIRE).ok();

        self.state.device_count = 0;
        self.state.current_device = 0;
        self.state.device_ids = [0; OW_MAX_DEVICES];

        if self.bus.reset() {
            self.discover_devices();
        }
        self.state.is_ready = self.state.device_count != 0;

        if self.state.is_ready {
            log::info!("onewire: found {} device(s) on pin {}", self.state.device_count, self.state.data_pin);
            Ok(())
        } else {
            Err(Error::OneWire(OneWireError::NoDevicesFound))
        }
    }

    pub fn reset(&mut self) -> bool {
        self.bus.reset()
    }

    /// LSB-first, eight bits.
    pub fn write_byte(&mut self, value: u8) {
        for i in 0..8 {
            self.bus.write_bit((value >> i) & 0x01);
        }
    }

    /// Eight bits, shifted MSB-into-byte as they arrive.
    pub fn read_byte(&mut self) -> u8 {
        let mut value: u8 = 0;
        for _ in 0..8 {
            value >>= 1;
            if self.bus.read_bit() == 1 {
                value |= 0x80;
            }
        }
        value
    }

    /// One step of the classic 1-Wire tree search. `next_node` is the fork
    /// index to resume from (66 - first call uses 65); `cid` accumulates
    /// the 64-bit ROM code across calls and is *not* reset between them,
    /// since later calls reuse the common prefix established so far.
    ///
    /// Returns the new fork index; `0` means the enumeration is complete.
    fn search(&mut self, next_node: u32, cid: &mut u64) -> u32 {
        let mut last_fork_point: u32 = 0;

        if self.bus.reset() {
            self.write_byte(OW_CMD_SEARCH_ROM);

            for i in (1..=64u32).rev() {
                let byte = (i - 1) >> 3;

                let mut chosen_bit = self.bus.read_bit();
                let second_bit = self.bus.read_bit();

                if second_bit == 1 {
                    if chosen_bit == 1 {
                        // No devices responded at this branch at all.
                        last_fork_point = 0;
                        break;
                    }
                } else if chosen_bit == 0 {
                    let id_byte = ((*cid >> (byte * 8)) & 0xFF) as u8;
                    if next_node > i || (next_node != i && (id_byte & 1) != 0) {
                        chosen_bit = 1;
                        last_fork_point = i;
                    }
                }

                self.bus.write_bit(chosen_bit);

                *cid >>= 1;
                if chosen_bit == 1 {
                    *cid |= 0x8000_0000_0000_0000;
                }
            }
        }

        last_fork_point
    }

    fn discover_devices(&mut self) {
        let mut current_id: u64 = 0;
        let mut next_device: u32 = 65;

        while next_device > 0 {
            next_device = self.search(next_device, &mut current_id);
            if self.state.device_count >= OW_MAX_DEVICES {
                break;
            }
            self.state.device_ids[self.state.device_count] = current_id;
            self.state.device_count += 1;
        }
    }

    pub fn scan(&self) -> OneWireScanResult<'_> {
        OneWireScanResult { ids: &self.state.device_ids[..self.state.device_count] }
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
            "{}.{}.{}.{}.{}.{}.{}.{}.{}\r\n",
            self.state.is_ready as u8,
            self.state.data_pin,
            self.state.device_count,
            fw.major,
            fw.minor,
            fw.patch,
            fw.build,
            chip_id_hex16,
            model,
        )
    }
}

pub struct OneWireScanResult<'a> {
    ids: &'a [u64],
}

impl<'a> OneWireScanResult<'a> {
    pub fn ids(&self) -> &[u64] {
        self.ids
    }

    /// Concatenation of each device's ROM code as 16 hex digits, no
    /// separators, CRLF-terminated -- or `"Z\r\n"` if the bus is empty.
    pub fn write_reply(&self, w: &mut dyn fmt::Write) -> fmt::Result {
        if self.ids.is_empty() {
            return write!(w, "Z\r\n");
        }
        for id in self.ids {
            write!(w, "{:016X}", id)?;
        }
        write!(w, "\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hosted::HostedOneWireBus;

    fn engine_with(devices: &[u64]) -> OneWireEngine<HostedOneWireBus> {
        let mut bus = HostedOneWireBus::new();
        for &d in devices {
            bus.add_device(d);
        }
        OneWireEngine::new(bus, 22)
    }

    #[test]
    fn empty_bus_fails_to_init() {
        let mut pins = PinRegistry::new();
        let mut e = engine_with(&[]);
        assert!(e.init(&mut pins).is_err());
        assert_eq!(e.state.device_count, 0);
        assert!(!e.state.is_ready);
    }

    #[test]
    fn search_finds_single_device() {
        let mut pins = PinRegistry::new();
        let mut e = engine_with(&[0x1122_3344_5566_7788]);
        e.init(&mut pins).unwrap();
        assert_eq!(e.state.device_count, 1);
        assert_eq!(e.state.device_ids[0], 0x1122_3344_5566_7788);
    }

    #[test]
    fn search_finds_devices_differing_by_one_bit() {
        let mut pins = PinRegistry::new();
        let a: u64 = 0x2800_0001_2345_6789;
        let b: u64 = a ^ 0x0000_0000_0000_0001;
        let mut e = engine_with(&[a, b]);
        e.init(&mut pins).unwrap();
        assert_eq!(e.state.device_count, 2);
        let found: std::collections::BTreeSet<u64> =
            e.state.device_ids[..e.state.device_count].iter().copied().collect();
        let expected: std::collections::BTreeSet<u64> = [a, b].into_iter().collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn search_finds_several_devices() {
        let mut pins = PinRegistry::new();
        let roms: [u64; 4] = [
            0x0000_0000_0000_0000,
            0x0000_0000_0000_00FF,
            0xFFFF_FFFF_FFFF_FFFF,
            0x1234_5678_9ABC_DEF0,
        ];
        let mut e = engine_with(&roms);
        e.init(&mut pins).unwrap();
        assert_eq!(e.state.device_count, 4);
        let found: std::collections::BTreeSet<u64> =
            e.state.device_ids[..e.state.device_count].iter().copied().collect();
        let expected: std::collections::BTreeSet<u64> = roms.into_iter().collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn scan_reply_hex_encodes_each_rom() {
        let mut pins = PinRegistry::new();
        let mut e = engine_with(&[0x00000000_00000001]);
        e.init(&mut pins).unwrap();
        let mut line = String::new();
        e.scan().write_reply(&mut line).unwrap();
        assert_eq!(line, "0000000000000001\r\n");
    }

    #[test]
    fn configure_rejected_when_pin_taken() {
        let mut pins = PinRegistry::new();
        pins.acquire(22, PinOwners::GPIO).unwrap();
        let mut e = engine_with(&[1]);
        assert!(e.configure(&pins, 22).is_err());
    }
}
