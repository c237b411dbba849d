//! Desktop-side half of the bus-bridge protocol: serial framing,
//! handshake/session state, and typed per-bus operations. Carries no
//! firmware state of its own -- it only speaks the wire protocol that
//! `board-core` implements, mirroring the split between `services/llio`'s
//! agnostic core and the board it happens to be talking to.
mod error;
mod link;
mod ops;
mod session;

#[cfg(test)]
mod testing;

pub use error::HostError;
pub use link::SerialLink;
pub use ops::{ButtonOperations, GpioOperations, I2cOperations, OneWireOperations};
pub use session::{BoardSession, FirmwareVersion};
