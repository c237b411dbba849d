//! Firmware-side error taxonomy.
//!
//! Grounded on `firmware/common/errors.h` of the original source and the
//! error table in `SPEC_FULL.md` §7. Kept as a hand-rolled enum rather than
//! a `thiserror`-derived one, matching the style `services/llio` uses for
//! its own `Result<T, xous::Error>` call sites (`llio_lib.rs`) -- this type
//! must stay usable from a `no_std` firmware build.
use bridge_proto::ErrorCode;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GeneralError {
    UnknownMode,
    UnknownCommand,
    LedNotEnabled,
    CantConfigBus,
    CantGetBusInfo,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum I2cError {
    NotReady,
    NotStarted,
    CouldNotWrite,
    CouldNotRead,
    AlreadyStopped,
    CouldNotConfigure,
    PinsAlreadyInUse,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OneWireError {
    NotReady,
    NoDevicesFound,
    CouldNotRead,
    CouldNotConfigure,
    PinAlreadyInUse,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GpioError {
    IllegalPin,
    CantSetPin,
    PinAlreadyInUse,
    CantSetButton,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    General(GeneralError),
    I2c(I2cError),
    OneWire(OneWireError),
    Gpio(GpioError),
}

impl Error {
    /// The single byte this error is reported as via the `$` command.
    pub fn code(self) -> ErrorCode {
        match self {
            Error::General(GeneralError::UnknownMode) => ErrorCode::GenUnknownMode,
            Error::General(GeneralError::UnknownCommand) => ErrorCode::GenUnknownCommand,
            Error::General(GeneralError::LedNotEnabled) => ErrorCode::GenLedNotEnabled,
            Error::General(GeneralError::CantConfigBus) => ErrorCode::GenCantConfigBus,
            Error::General(GeneralError::CantGetBusInfo) => ErrorCode::GenCantGetBusInfo,

            Error::I2c(I2cError::NotReady) => ErrorCode::I2cNotReady,
            Error::I2c(I2cError::NotStarted) => ErrorCode::I2cNotStarted,
            Error::I2c(I2cError::CouldNotWrite) => ErrorCode::I2cCouldNotWrite,
            Error::I2c(I2cError::CouldNotRead) => ErrorCode::I2cCouldNotRead,
            Error::I2c(I2cError::AlreadyStopped) => ErrorCode::I2cAlreadyStopped,
            Error::I2c(I2cError::CouldNotConfigure) => ErrorCode::I2cCouldNotConfigure,
            Error::I2c(I2cError::PinsAlreadyInUse) => ErrorCode::I2cPinsAlreadyInUse,

            Error::OneWire(OneWireError::NotReady) => ErrorCode::OwNotReady,
            Error::OneWire(OneWireError::NoDevicesFound) => ErrorCode::OwNoDevicesFound,
            Error::OneWire(OneWireError::CouldNotRead) => ErrorCode::OwCouldNotRead,
            Error::OneWire(OneWireError::CouldNotConfigure) => ErrorCode::OwCouldNotConfigure,
            Error::OneWire(OneWireError::PinAlreadyInUse) => ErrorCode::OwPinAlreadyInUse,

            Error::Gpio(GpioError::IllegalPin) => ErrorCode::GpioIllegalPin,
            Error::Gpio(GpioError::CantSetPin) => ErrorCode::GpioCantSetPin,
            Error::Gpio(GpioError::PinAlreadyInUse) => ErrorCode::GpioPinAlreadyInUse,
            Error::Gpio(GpioError::CantSetButton) => ErrorCode::GpioCantSetButton,
        }
    }

    pub fn as_wire_byte(self) -> u8 {
        self.code().as_wire_byte()
    }
}
