//! Typed per-bus operations, one module per firmware mode, each mirroring
//! its slice of the command table in `bridge-proto` one-to-one.
mod button;
mod gpio;
mod i2c;
mod onewire;

pub use button::ButtonOperations;
pub use gpio::GpioOperations;
pub use i2c::I2cOperations;
pub use onewire::OneWireOperations;
