//! Real-silicon 1-Wire backend: bit-bangs the bus through a `GpioPin` using
//! a `Clock` for timing. Delay constants are the standard 1-Wire timings
//! from `firmware/common/onewire.h`, in microseconds.
use crate::platform::{Clock, GpioPin};

use super::OneWireBus;

const DELAY_G: u32 = 0;
const DELAY_H: u32 = 485;
const DELAY_I: u32 = 55;
const DELAY_J: u32 = 430;
const DELAY_A: u32 = 10;
const DELAY_B: u32 = 70;
const DELAY_C: u32 = 60;
const DELAY_D: u32 = 20;
const DELAY_E: u32 = 4;
const DELAY_F: u32 = 66;
const DELAY_R: u32 = 1;

pub struct HardwareOneWireBus<P, C> {
    gpio: P,
    clock: C,
    pin: u8,
}

impl<P: GpioPin, C: Clock> HardwareOneWireBus<P, C> {
    pub fn new(gpio: P, clock: C, pin: u8) -> Self {
        HardwareOneWireBus { gpio, clock, pin }
    }

    pub fn release(self) -> (P, C) {
        (self.gpio, self.clock)
    }

    pub fn set_pin(&mut self, pin: u8) {
        self.pin = pin;
    }
}

impl<P: GpioPin, C: Clock> OneWireBus for HardwareOneWireBus<P, C> {
    fn reset(&mut self) -> bool {
        self.clock.delay_us(DELAY_G);

        self.gpio.set_direction(self.pin, true);
        self.gpio.write(self.pin, false);
        self.clock.delay_us(DELAY_H);

        self.gpio.set_direction(self.pin, false);
        self.clock.delay_us(DELAY_I);

        let devices_present = !self.gpio.read(self.pin);
        self.clock.delay_us(DELAY_J);

        devices_present
    }

    fn write_bit(&mut self, bit: u8) {
        let bit = bit & 0x01;

        self.gpio.set_direction(self.pin, true);
        self.gpio.write(self.pin, false);
        self.clock.delay_us(if bit == 1 { DELAY_A } else { DELAY_C });

        self.gpio.set_direction(self.pin, false);
        self.clock.delay_us(if bit == 1 { DELAY_B } else { DELAY_D });

        self.clock.delay_us(DELAY_R);
    }

    fn read_bit(&mut self) -> u8 {
        self.gpio.set_direction(self.pin, true);
        self.gpio.write(self.pin, false);
        self.clock.delay_us(DELAY_A);

        self.gpio.set_direction(self.pin, false);
        self.clock.delay_us(DELAY_E);

        let sample = if self.gpio.read(self.pin) { 1 } else { 0 };
        self.clock.delay_us(DELAY_F);
        self.clock.delay_us(DELAY_R);

        sample
    }
}
