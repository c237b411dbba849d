//! Desktop-side 1-Wire operations. Grounded on `firmware/common/onewire.c`
//! and `OneWireEngine` in `board-core`.
use std::io::{Read, Write};

use crate::error::HostError;
use crate::link::SerialLink;

pub struct OneWireOperations<'a, T: Read + Write> {
    link: &'a mut SerialLink<T>,
}

impl<'a, T: Read + Write> OneWireOperations<'a, T> {
    pub(crate) fn new(link: &'a mut SerialLink<T>) -> Self {
        OneWireOperations { link }
    }

    pub fn configure(&mut self, pin: u8) -> Result<(), HostError> {
        self.link.send_command_with_payload(b'c', &[pin])?;
        self.link.expect_ack()
    }

    /// Resets the bus and enumerates every device via `SEARCH ROM`.
    pub fn init(&mut self) -> Result<(), HostError> {
        self.link.send_command(b'i')?;
        self.link.expect_ack()
    }

    pub fn reset(&mut self) -> Result<(), HostError> {
        self.link.send_command(b'x')?;
        self.link.expect_ack()
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), HostError> {
        self.link.write_chunked(data)
    }

    pub fn read(&mut self, len: usize) -> Result<Vec<u8>, HostError> {
        self.link.read_chunked(len)
    }

    /// Decodes the concatenated 16-hex-digit ROM codes into 64-bit IDs.
    pub fn scan(&mut self) -> Result<Vec<u64>, HostError> {
        self.link.send_command(b'd')?;
        let line = self.link.read_until_crlf()?;
        parse_rom_ids(&line)
    }
}

fn parse_rom_ids(line: &[u8]) -> Result<Vec<u64>, HostError> {
    if line == b"Z" {
        return Ok(Vec::new());
    }
    let text = std::str::from_utf8(line)
        .map_err(|_| HostError::InvalidArgument("scan reply was not valid UTF-8".into()))?;
    if text.len() % 16 != 0 {
        return Err(HostError::InvalidArgument(format!(
            "scan reply length {} is not a multiple of 16",
            text.len()
        )));
    }
    text.as_bytes()
        .chunks(16)
        .map(|chunk| {
            let s = std::str::from_utf8(chunk).unwrap();
            u64::from_str_radix(s, 16)
                .map_err(|_| HostError::InvalidArgument(format!("bad ROM code {:?}", s)))
        })
        .collect()
}
