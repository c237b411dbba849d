//! Raw GPIO engine: a single command byte encodes pin, direction, target
//! state and read-flag, plus an optional literal `0xF0` clear byte.
//! Grounded on `firmware/common/gpio.c`'s `set_gpio`/`clear_pin`.
use bridge_proto::{PinOwners, CLEAR_MARKER};

use crate::error::{Error, GpioError};
use crate::pin_registry::PinRegistry;
use crate::platform::GpioPin;

const DIRN_OUT: u8 = 1 << 0;
const STATE_HIGH: u8 = 1 << 1;

#[derive(Debug, Copy, Clone, Default)]
struct PinRecord {
    registered: bool,
    flags: u8,
}

pub struct GpioEngine<P: GpioPin> {
    gpio: P,
    records: [PinRecord; 32],
}

impl<P: GpioPin> GpioEngine<P> {
    pub fn new(gpio: P) -> Self {
        GpioEngine { gpio, records: [PinRecord::default(); 32] }
    }

    /// Decode and apply one GPIO command byte. Returns `Some(reply_byte)`
    /// only for a read (bit7 sampled level, bits4..0 echoed pin number).
    pub fn set(&mut self, pins: &mut PinRegistry, command: u8) -> Result<Option<u8>, Error> {
        let pin = command & 0x1F;
        let pin_state = (command & 0x80) != 0;
        let is_dir_out = (command & 0x40) != 0;
        let is_read = (command & 0x20) != 0;

        if pins.is_taken_by_other(pin, PinOwners::GPIO) {
            return Err(Error::Gpio(GpioError::PinAlreadyInUse));
        }
        pins.acquire(pin, PinOwners::GPIO).ok();

        let record = &mut self.records[pin as usize];
        if !record.registered {
            self.gpio.set_direction(pin, is_dir_out);
            record.registered = true;
            if is_dir_out {
                record.flags |= DIRN_OUT | STATE_HIGH;
            } else {
                self.gpio.pull_down(pin);
            }
            if pin_state {
                record.flags |= STATE_HIGH;
            }
        } else {
            let current_dir_out = (record.flags & DIRN_OUT) != 0;
            if current_dir_out != is_dir_out {
                self.gpio.set_direction(pin, is_dir_out);
                record.flags ^= STATE_HIGH;
            }
        }

        if is_read && !is_dir_out {
            let level = self.gpio.read(pin);
            log::trace!("gpio: pin {} read {}", pin, level);
            Ok(Some(((level as u8) << 7) | pin))
        } else if is_dir_out {
            self.gpio.write(pin, pin_state);
            log::trace!("gpio: pin {} set {}", pin, pin_state);
            Ok(None)
        } else {
            Ok(None)
        }
    }

    /// Release a pin: deinit the peripheral, forget the record, drop the
    /// owner bit. The redesigned dispatcher only reaches this for the
    /// literal `0xF0` follow-up byte (see `bridge_proto::CLEAR_MARKER`).
    pub fn clear(&mut self, pins: &mut PinRegistry, pin: u8) {
        self.gpio.deinit(pin);
        self.records[pin as usize] = PinRecord::default();
        pins.release(pin, PinOwners::GPIO);
    }

    pub fn is_clear_marker(byte: u8) -> bool {
        byte == CLEAR_MARKER
    }

    pub fn is_in_use(&self, pin: u8) -> bool {
        self.records[pin as usize].registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct FakeGpio {
        dir_out: BTreeMap<u8, bool>,
        level: BTreeMap<u8, bool>,
        pulled_down: BTreeMap<u8, bool>,
        deinited: Vec<u8>,
    }

    impl GpioPin for FakeGpio {
        fn set_direction(&mut self, pin: u8, output: bool) {
            self.dir_out.insert(pin, output);
        }
        fn write(&mut self, pin: u8, high: bool) {
            self.level.insert(pin, high);
        }
        fn read(&mut self, pin: u8) -> bool {
            *self.level.get(&pin).unwrap_or(&false)
        }
        fn pull_down(&mut self, pin: u8) {
            self.pulled_down.insert(pin, true);
        }
        fn pull_up(&mut self, _pin: u8) {}
        fn deinit(&mut self, pin: u8) {
            self.deinited.push(pin);
        }
    }

    #[test]
    fn write_high_then_read_back() {
        let mut pins = PinRegistry::new();
        let mut e = GpioEngine::new(FakeGpio::default());
        // pin 5, dir out, state high
        e.set(&mut pins, 0b1100_0101).unwrap();
        assert_eq!(e.gpio.level.get(&5), Some(&true));
    }

    #[test]
    fn read_input_pin_echoes_pin_number_and_level() {
        let mut pins = PinRegistry::new();
        let mut e = GpioEngine::new(FakeGpio::default());
        // pin 3, dir in, read flag
        e.set(&mut pins, 0b0010_0011).unwrap();
        e.gpio.level.insert(3, true);
        let reply = e.set(&mut pins, 0b0010_0011).unwrap().unwrap();
        assert_eq!(reply, 0b1000_0011);
    }

    #[test]
    fn second_use_same_pin_is_idempotent_owner() {
        let mut pins = PinRegistry::new();
        let mut e = GpioEngine::new(FakeGpio::default());
        e.set(&mut pins, 0b1100_0010).unwrap();
        assert!(e.set(&mut pins, 0b1100_0010).is_ok());
        assert_eq!(pins.owners(2), PinOwners::GPIO);
    }

    #[test]
    fn cross_owned_pin_is_rejected() {
        let mut pins = PinRegistry::new();
        pins.acquire(7, PinOwners::I2C).unwrap();
        let mut e = GpioEngine::new(FakeGpio::default());
        assert!(e.set(&mut pins, 0b1100_0111).is_err());
    }

    #[test]
    fn gpio_clear_releases_owner() {
        let mut pins = PinRegistry::new();
        let mut e = GpioEngine::new(FakeGpio::default());
        e.set(&mut pins, 0b1100_0100).unwrap();
        assert_eq!(pins.owners(4), PinOwners::GPIO);
        e.clear(&mut pins, 4);
        assert_eq!(pins.owners(4), PinOwners::empty());
        assert!(!e.is_in_use(4));
        assert_eq!(e.gpio.deinited, vec![4]);
    }

    #[test]
    fn clear_marker_is_literal_0xf0_only() {
        assert!(GpioEngine::<FakeGpio>::is_clear_marker(0xF0));
        assert!(!GpioEngine::<FakeGpio>::is_clear_marker(0x80));
        assert!(!GpioEngine::<FakeGpio>::is_clear_marker(0xFF));
    }
}
