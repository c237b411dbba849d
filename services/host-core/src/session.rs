//! Handshake and session-wide commands. Mirrors `firmware/common/serial.c`'s
//! `!`, `#`, `?`, `$`, `*` handling from the desktop side.
use std::io::{Read, Write};

use crate::error::HostError;
use crate::link::SerialLink;
use crate::ops::{ButtonOperations, GpioOperations, I2cOperations, OneWireOperations};

/// Firmware version as reported by the handshake reply.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

pub struct BoardSession<T: Read + Write> {
    link: SerialLink<T>,
    version: FirmwareVersion,
}

impl<T: Read + Write> BoardSession<T> {
    /// Send the handshake and classify the reply. Firmware `<=1.1` answers
    /// `"OK\r\n"`; anything newer answers `"OK"` followed by the two version
    /// bytes -- both replies are exactly four bytes, so one `read_exact(4)`
    /// covers either shape.
    pub fn connect(stream: T) -> Result<Self, HostError> {
        let mut link = SerialLink::new(stream);
        link.send_command(b'!')?;
        let reply = link.read_exact(4)?;
        if &reply[0..2] != b"OK" {
            return Err(HostError::HandshakeFailed);
        }
        let version = if reply[2] == b'\r' && reply[3] == b'\n' {
            FirmwareVersion { major: 1, minor: 1 }
        } else {
            FirmwareVersion { major: reply[2], minor: reply[3] }
        };
        log::info!("host-core: connected to firmware {}.{}", version.major, version.minor);
        Ok(BoardSession { link, version })
    }

    pub fn version(&self) -> FirmwareVersion {
        self.version
    }

    /// `'0'` none, `'i'` I2C, `'s'` SPI, `'u'` UART, `'o'` 1-Wire.
    pub fn set_mode(&mut self, code: u8) -> Result<(), HostError> {
        self.link.send_command_with_payload(b'#', &[code])?;
        self.link.expect_ack()
    }

    pub fn get_status(&mut self) -> Result<String, HostError> {
        self.link.send_command(b'?')?;
        let line = self.link.read_until_crlf()?;
        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    pub fn get_last_error(&mut self) -> Result<u8, HostError> {
        self.link.send_command(b'$')?;
        let line = self.link.read_until_crlf()?;
        Ok(line.first().copied().unwrap_or(0))
    }

    /// `*` command: enable/disable the heartbeat LED blink.
    pub fn set_heartbeat(&mut self, enabled: bool) -> Result<(), HostError> {
        self.link.send_command_with_payload(b'*', &[enabled as u8])?;
        self.link.expect_ack()
    }

    pub fn i2c(&mut self) -> I2cOperations<'_, T> {
        I2cOperations::new(&mut self.link)
    }

    pub fn onewire(&mut self) -> OneWireOperations<'_, T> {
        OneWireOperations::new(&mut self.link)
    }

    pub fn gpio(&mut self) -> GpioOperations<'_, T> {
        GpioOperations::new(&mut self.link)
    }

    pub fn button(&mut self) -> ButtonOperations<'_, T> {
        ButtonOperations::new(&mut self.link)
    }
}
