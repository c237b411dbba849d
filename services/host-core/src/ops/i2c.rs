//! Desktop-side I2C operations. Grounded on `firmware/common/i2c.c`'s
//! command set and `I2cEngine` in `board-core`.
use std::io::{Read, Write};

use crate::error::HostError;
use crate::link::SerialLink;

/// Lowest/highest 7-bit address this protocol will `start()`, matching the
/// reserved-address ranges the original firmware's scan sweep skips.
const MIN_ADDRESS: u8 = 0x08;
const MAX_ADDRESS: u8 = 0x77;

pub struct I2cOperations<'a, T: Read + Write> {
    link: &'a mut SerialLink<T>,
}

impl<'a, T: Read + Write> I2cOperations<'a, T> {
    pub(crate) fn new(link: &'a mut SerialLink<T>) -> Self {
        I2cOperations { link }
    }

    pub fn configure(&mut self, bus_id: u8, sda: u8, scl: u8) -> Result<(), HostError> {
        self.link.send_command_with_payload(b'c', &[bus_id, sda, scl])?;
        self.link.expect_ack()
    }

    pub fn init(&mut self) -> Result<(), HostError> {
        self.link.send_command(b'i')?;
        self.link.expect_ack()
    }

    pub fn deinit(&mut self) -> Result<(), HostError> {
        self.link.send_command(b'k')?;
        self.link.expect_ack()
    }

    pub fn reset(&mut self) -> Result<(), HostError> {
        self.link.send_command(b'x')?;
        self.link.expect_ack()
    }

    pub fn set_frequency_100khz(&mut self) -> Result<(), HostError> {
        self.link.send_command(b'1')?;
        self.link.expect_ack()
    }

    pub fn set_frequency_400khz(&mut self) -> Result<(), HostError> {
        self.link.send_command(b'4')?;
        self.link.expect_ack()
    }

    /// `start(address, false)` for a write transaction, `start(address,
    /// true)` to restart into a read. Rejects addresses outside
    /// `[0x08, 0x77]` before it ever touches the wire.
    pub fn start(&mut self, address: u8, read: bool) -> Result<(), HostError> {
        if !(MIN_ADDRESS..=MAX_ADDRESS).contains(&address) {
            return Err(HostError::InvalidArgument(format!(
                "i2c address {:#04x} outside [{:#04x}, {:#04x}]",
                address, MIN_ADDRESS, MAX_ADDRESS
            )));
        }
        let addr_op = (address << 1) | (read as u8);
        self.link.send_command_with_payload(b's', &[addr_op])?;
        self.link.expect_ack()
    }

    pub fn stop(&mut self) -> Result<(), HostError> {
        self.link.send_command(b'p')?;
        self.link.expect_ack()
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), HostError> {
        self.link.write_chunked(data)
    }

    pub fn read(&mut self, len: usize) -> Result<Vec<u8>, HostError> {
        self.link.read_chunked(len)
    }

    /// Parses the `"AA.BB.CC.\r\n"` / `"Z\r\n"` scan reply into addresses.
    pub fn scan(&mut self) -> Result<Vec<u8>, HostError> {
        self.link.send_command(b'd')?;
        let line = self.link.read_until_crlf()?;
        parse_dotted_hex(&line)
    }
}

fn parse_dotted_hex(line: &[u8]) -> Result<Vec<u8>, HostError> {
    if line == b"Z" {
        return Ok(Vec::new());
    }
    let text = std::str::from_utf8(line)
        .map_err(|_| HostError::InvalidArgument("scan reply was not valid UTF-8".into()))?;
    text.split('.')
        .filter(|s| !s.is_empty())
        .map(|s| {
            u8::from_str_radix(s, 16)
                .map_err(|_| HostError::InvalidArgument(format!("bad scan address {:?}", s)))
        })
        .collect()
}
