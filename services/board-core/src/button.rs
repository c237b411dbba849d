//! Debounced button tracking. Grounded on `firmware/common/button.c`'s
//! polling variant (`poll_buttons`); the interrupt variant it also
//! documents is architecturally tied to a specific MCU's IRQ controller
//! and is out of scope here, but the observable contract -- debounce
//! window, polarity, trigger edge, `states` latch -- is the same either
//! way, so `tick()` below is safe to call from a housekeeping loop or
//! from an IRQ-driven debounce timer alike.
use core::sync::atomic::{AtomicU32, Ordering};

use bridge_proto::PinOwners;

use crate::error::{Error, GpioError};
use crate::pin_registry::PinRegistry;
use crate::platform::{Clock, GpioPin};

const READY: u64 = u64::MAX;
const DEBOUNCE_US: u64 = 5_000;

#[derive(Debug, Copy, Clone)]
struct ButtonRecord {
    polarity: bool,
    trigger_on_release: bool,
    pressed: bool,
    press_time: u64,
}

pub struct ButtonEngine<P: GpioPin, C: Clock> {
    gpio: P,
    clock: C,
    buttons: [Option<ButtonRecord>; 32],
    count: usize,
    states: AtomicU32,
}

impl<P: GpioPin, C: Clock> ButtonEngine<P, C> {
    pub fn new(gpio: P, clock: C) -> Self {
        ButtonEngine { gpio, clock, buttons: [None; 32], count: 0, states: AtomicU32::new(0) }
    }

    /// `command` bit7 = polarity, bit6 = trigger-on-release, bits4..0 = pin.
    /// Pin 0 is illegal (its state bit, `pin - 1`, would underflow).
    pub fn set(&mut self, pins: &mut PinRegistry, command: u8) -> Result<(), Error> {
        let pin = command & 0x1F;
        if pin == 0 {
            return Err(Error::Gpio(GpioError::CantSetButton));
        }
        let trigger_on_release = (command & 0x40) != 0;
        let polarity = (command & 0x80) != 0;

        if pins.is_taken_by_other(pin, PinOwners::BUTTON) {
            return Err(Error::Gpio(GpioError::PinAlreadyInUse));
        }
        pins.acquire(pin, PinOwners::BUTTON).ok();

        if self.buttons[pin as usize].is_none() {
            self.count += 1;
        }
        self.buttons[pin as usize] =
            Some(ButtonRecord { polarity, trigger_on_release, pressed: false, press_time: READY });

        self.gpio.set_direction(pin, false);
        if polarity {
            self.gpio.pull_up(pin);
        } else {
            self.gpio.pull_down(pin);
        }
        log::debug!(
            "button: pin {} armed (polarity={}, trigger_on_release={})",
            pin,
            polarity,
            trigger_on_release
        );
        Ok(())
    }

    /// Direct access to the backend GPIO, for driving a simulated pin level
    /// from outside this module.
    pub fn gpio_mut(&mut self) -> &mut P {
        &mut self.gpio
    }

    pub fn clear(&mut self, pins: &mut PinRegistry, pin: u8) -> Result<(), Error> {
        if self.buttons[pin as usize].take().is_none() {
            return Err(Error::Gpio(GpioError::CantSetButton));
        }
        self.count -= 1;
        self.gpio.deinit(pin);
        pins.release(pin, PinOwners::BUTTON);
        Ok(())
    }

    /// One housekeeping pass over every configured button.
    pub fn tick(&mut self) {
        let now = self.clock.now_us();
        for pin in 1u8..32 {
            let Some(btn) = self.buttons[pin as usize].as_mut() else { continue };
            let raw = self.gpio.read(pin);
            let is_pushed = if btn.polarity { !raw } else { raw };

            if is_pushed {
                if !btn.pressed {
                    if btn.press_time == READY {
                        btn.press_time = now;
                    } else if now.wrapping_sub(btn.press_time) > DEBOUNCE_US {
                        btn.press_time = READY;
                        btn.pressed = true;
                        if !btn.trigger_on_release {
                            Self::latch(&self.states, pin);
                        }
                    }
                }
            } else if btn.pressed {
                btn.pressed = false;
                if btn.trigger_on_release {
                    Self::latch(&self.states, pin);
                }
            }
        }
    }

    fn latch(states: &AtomicU32, pin: u8) {
        states.fetch_or(1 << (pin - 1), Ordering::SeqCst);
    }

    /// The 32-bit `states` latch, little-endian on the wire. Non-destructive;
    /// used by tests and anything that just wants to peek at the latch.
    pub fn read_state_le_bytes(&self) -> [u8; 4] {
        self.states.load(Ordering::SeqCst).to_le_bytes()
    }

    /// Snapshot `states` and clear it in the same step: a bit reflects
    /// "fired since the *previous* read", so the wire-facing `b` read
    /// command consumes the latch as it reports it.
    pub fn take_state_le_bytes(&mut self) -> [u8; 4] {
        self.states.swap(0, Ordering::SeqCst).to_le_bytes()
    }

    pub fn is_in_use(&self, pin: u8) -> bool {
        pin != 0 && self.buttons[pin as usize].is_some()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct FakeClock(u64);
    impl Clock for FakeClock {
        fn now_us(&self) -> u64 {
            self.0
        }
        fn delay_us(&mut self, us: u32) {
            self.0 += us as u64;
        }
    }

    #[derive(Default)]
    struct FakeGpio {
        level: BTreeMap<u8, bool>,
    }
    impl GpioPin for FakeGpio {
        fn set_direction(&mut self, _pin: u8, _output: bool) {}
        fn write(&mut self, pin: u8, high: bool) {
            self.level.insert(pin, high);
        }
        fn read(&mut self, pin: u8) -> bool {
            *self.level.get(&pin).unwrap_or(&false)
        }
        fn pull_down(&mut self, _pin: u8) {}
        fn pull_up(&mut self, _pin: u8) {}
        fn deinit(&mut self, _pin: u8) {}
    }

    fn engine() -> ButtonEngine<FakeGpio, FakeClock> {
        ButtonEngine::new(FakeGpio::default(), FakeClock(0))
    }

    #[test]
    fn pin_zero_is_illegal() {
        let mut pins = PinRegistry::new();
        let mut e = engine();
        assert!(e.set(&mut pins, 0b0000_0000).is_err());
    }

    #[test]
    fn press_trigger_latches_after_debounce() {
        let mut pins = PinRegistry::new();
        let mut e = engine();
        // pin 3, active-high (polarity=0), trigger on press
        e.set(&mut pins, 0b0000_0011).unwrap();
        e.gpio.level.insert(3, true);

        e.tick(); // arms press_time
        assert_eq!(e.read_state_le_bytes(), [0, 0, 0, 0]);

        e.clock.0 += 6_000;
        e.tick(); // debounce window elapsed -> latches

        let bits = u32::from_le_bytes(e.read_state_le_bytes());
        assert_eq!(bits, 1 << (3 - 1));
    }

    #[test]
    fn release_trigger_latches_on_release_only() {
        let mut pins = PinRegistry::new();
        let mut e = engine();
        // pin 5, trigger_on_release=1
        e.set(&mut pins, 0b0100_0101).unwrap();
        e.gpio.level.insert(5, true);
        e.tick();
        e.clock.0 += 6_000;
        e.tick();
        assert_eq!(u32::from_le_bytes(e.read_state_le_bytes()), 0);

        e.gpio.level.insert(5, false);
        e.tick();
        assert_eq!(u32::from_le_bytes(e.read_state_le_bytes()), 1 << (5 - 1));
    }

    #[test]
    fn take_state_clears_the_latch() {
        let mut pins = PinRegistry::new();
        let mut e = engine();
        e.set(&mut pins, 0b0000_0011).unwrap();
        e.gpio.level.insert(3, true);
        e.tick();
        e.clock.0 += 6_000;
        e.tick();
        assert_ne!(u32::from_le_bytes(e.take_state_le_bytes()), 0);
        assert_eq!(u32::from_le_bytes(e.read_state_le_bytes()), 0);
    }

    #[test]
    fn clear_removes_record_and_decrements_count() {
        let mut pins = PinRegistry::new();
        let mut e = engine();
        e.set(&mut pins, 0b0000_0100).unwrap();
        assert_eq!(e.count(), 1);
        e.clear(&mut pins, 4).unwrap();
        assert_eq!(e.count(), 0);
        assert!(!e.is_in_use(4));
        assert_eq!(pins.owners(4), PinOwners::empty());
    }
}
