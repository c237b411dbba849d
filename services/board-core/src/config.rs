//! Per-board parameters, supplied at construction time instead of being
//! baked in with conditional compilation. Replaces the original firmware's
//! per-board pin-table files (`firmware/pico/pins.c`, `firmware/qtpy/pins.c`,
//! the `I2C_PIN_PAIRS_BUS_0`/`_1` arrays) with a single data value.

/// A permitted (SDA, SCL) combination for one of the board's I2C buses.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct I2cPinPair {
    pub sda: u8,
    pub scl: u8,
}

/// Firmware version reported by the handshake (`!`) and status (`?`)
/// commands.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub build: u16,
}

pub const FIRMWARE_VERSION: FirmwareVersion = FirmwareVersion { major: 1, minor: 2, patch: 0, build: 1 };

#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// Permitted (sda, scl) pairs for I2C bus 0.
    pub i2c_pin_pairs_bus0: &'static [I2cPinPair],
    /// Permitted (sda, scl) pairs for I2C bus 1.
    pub i2c_pin_pairs_bus1: &'static [I2cPinPair],
    pub default_i2c_bus: u8,
    pub default_sda_pin: u8,
    pub default_scl_pin: u8,
    pub default_onewire_pin: u8,
    /// Human-readable board model, e.g. `"PI-PICO"` or `"QTPY-RP2040"`.
    pub model: &'static str,
    /// Whether this build compiles in the heartbeat LED feature at all;
    /// if `false`, `*` always fails with `GenLedNotEnabled`.
    pub heartbeat_available: bool,
}

impl BoardConfig {
    /// `true` if `(sda, scl)` is a permitted pair on `bus_id` (0 or 1).
    pub fn is_permitted_pair(&self, bus_id: u8, sda: u8, scl: u8) -> bool {
        let table = if bus_id == 0 { self.i2c_pin_pairs_bus0 } else { self.i2c_pin_pairs_bus1 };
        table.iter().any(|pair| pair.sda == sda && pair.scl == scl)
    }
}

/// A reasonable default matching the original Pi Pico board file.
pub const PICO_BOARD_CONFIG: BoardConfig = BoardConfig {
    i2c_pin_pairs_bus0: &[
        I2cPinPair { sda: 0, scl: 1 },
        I2cPinPair { sda: 4, scl: 5 },
        I2cPinPair { sda: 8, scl: 9 },
        I2cPinPair { sda: 12, scl: 13 },
        I2cPinPair { sda: 16, scl: 17 },
        I2cPinPair { sda: 20, scl: 21 },
    ],
    i2c_pin_pairs_bus1: &[
        I2cPinPair { sda: 2, scl: 3 },
        I2cPinPair { sda: 6, scl: 7 },
        I2cPinPair { sda: 10, scl: 11 },
        I2cPinPair { sda: 14, scl: 15 },
        I2cPinPair { sda: 18, scl: 19 },
        I2cPinPair { sda: 26, scl: 27 },
    ],
    default_i2c_bus: 1,
    default_sda_pin: 2,
    default_scl_pin: 3,
    default_onewire_pin: 22,
    model: "PI-PICO",
    heartbeat_available: true,
};
