//! Mode-indicator colour plus an optional heartbeat blink. Grounded on
//! `firmware/common/led.c` (the board-agnostic middleware; the Neopixel,
//! mono-LED, RGB and Neotron-specific backends it dispatches to are the
//! per-board data tables this core deliberately doesn't own) and the
//! `set_mode`/heartbeat loop in `firmware/common/serial.c`.
use bridge_proto::ModeCode;

use crate::error::{Error, GeneralError};

const HEARTBEAT_PERIOD_US: u64 = 2_000_000;
const HEARTBEAT_FLASH_US: u64 = 50_000;

const COLOUR_MODE_I2C: u32 = 0x002010;
const COLOUR_MODE_SPI: u32 = 0x010000;
const COLOUR_MODE_UART: u32 = 0x010000;
const COLOUR_MODE_ONE_WIRE: u32 = 0x101000;
const COLOUR_MODE_NONE: u32 = 0x100000;

/// Board-specific colour/on-off driver. A Neopixel sets `colour` directly;
/// a single-colour LED ignores it and just tracks on/off state.
pub trait LedDriver {
    fn set_state(&mut self, on: bool);
    fn set_colour(&mut self, rgb: u32);
}

fn colour_for_mode(mode: ModeCode) -> u32 {
    match mode {
        ModeCode::I2c => COLOUR_MODE_I2C,
        ModeCode::Spi => COLOUR_MODE_SPI,
        ModeCode::Uart => COLOUR_MODE_UART,
        ModeCode::OneWire => COLOUR_MODE_ONE_WIRE,
        ModeCode::None => COLOUR_MODE_NONE,
    }
}

pub struct LedService<L: LedDriver> {
    driver: L,
    heartbeat_available: bool,
    heartbeat_enabled: bool,
    last_toggle_us: u64,
    is_on: bool,
}

impl<L: LedDriver> LedService<L> {
    pub fn new(driver: L, heartbeat_available: bool) -> Self {
        LedService { driver, heartbeat_available, heartbeat_enabled: false, last_toggle_us: 0, is_on: false }
    }

    pub fn on_mode_changed(&mut self, mode: ModeCode) {
        self.driver.set_colour(colour_for_mode(mode));
    }

    /// `*` command: enable/disable heartbeat blink. ERR if the build has
    /// no heartbeat LED at all.
    pub fn set_heartbeat(&mut self, enabled: bool) -> Result<(), Error> {
        if !self.heartbeat_available {
            return Err(Error::General(GeneralError::LedNotEnabled));
        }
        self.heartbeat_enabled = enabled;
        if !enabled {
            self.driver.set_state(false);
            self.is_on = false;
        }
        Ok(())
    }

    /// Call once per housekeeping pass with the current microsecond clock.
    pub fn tick(&mut self, now_us: u64) {
        if !(self.heartbeat_available && self.heartbeat_enabled) {
            return;
        }
        if now_us.wrapping_sub(self.last_toggle_us) > HEARTBEAT_PERIOD_US {
            self.driver.set_state(true);
            self.is_on = true;
            self.last_toggle_us = now_us;
        } else if now_us.wrapping_sub(self.last_toggle_us) > HEARTBEAT_FLASH_US && self.is_on {
            self.driver.set_state(false);
            self.is_on = false;
        }
    }
}
