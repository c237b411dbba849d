//! Host-board bridge firmware core.
//!
//! This crate is the firmware-side half of the bus-bridge protocol: framing,
//! command dispatch, mode state, pin ownership, and the I2C/1-Wire/GPIO/
//! button engines. It owns no transport and no board-specific pin tables --
//! both are supplied by the binary that links this crate in, mirroring the
//! way `services/llio` in the teacher codebase stays agnostic to whether it
//! is running against real silicon or a desktop-hosted stand-in.
#![cfg_attr(not(any(test, feature = "hosted")), no_std)]

pub mod button;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod error_log;
pub mod gpio;
pub mod i2c;
pub mod led;
pub mod mode;
pub mod onewire;
pub mod pin_registry;
pub mod platform;

pub use dispatcher::{Firmware, SerialTransport};
pub use error::Error;
