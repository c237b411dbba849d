//! Byte-level framing over whatever implements `Read + Write`. Generic over
//! the transport the same way `firmata-rs`'s `Board<T>` is -- a real build
//! wires this to `serialport::SerialPort`, tests wire it to an in-memory
//! duplex pipe (see `testing`).
use std::io::{Read, Write};
use std::time::{Duration, Instant};

use bridge_proto::{Frame, ACK, ERR, MAX_CHUNK_LEN};

use crate::error::HostError;

/// Outer wall-clock ceiling for a single reply, matching the source
/// client's serial timeout.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

pub struct SerialLink<T: Read + Write> {
    stream: T,
    read_timeout: Duration,
}

impl<T: Read + Write> SerialLink<T> {
    pub fn new(stream: T) -> Self {
        SerialLink { stream, read_timeout: READ_TIMEOUT }
    }

    /// Build with a non-default wall-clock read ceiling -- used by tests
    /// that want to exercise the timeout path without waiting 2 seconds.
    pub fn with_timeout(stream: T, read_timeout: Duration) -> Self {
        SerialLink { stream, read_timeout }
    }

    pub fn send_command(&mut self, cmd: u8) -> Result<(), HostError> {
        self.stream.write_all(&[cmd])?;
        Ok(())
    }

    pub fn send_command_with_payload(&mut self, cmd: u8, payload: &[u8]) -> Result<(), HostError> {
        self.stream.write_all(&[cmd])?;
        self.stream.write_all(payload)?;
        Ok(())
    }

    /// Send `data` as one or more write-prefixed chunks of at most
    /// `MAX_CHUNK_LEN` bytes each.
    pub fn write_chunked(&mut self, data: &[u8]) -> Result<(), HostError> {
        for chunk in data.chunks(MAX_CHUNK_LEN) {
            self.stream.write_all(&[Frame::write_prefix_byte(chunk.len())])?;
            self.stream.write_all(chunk)?;
        }
        Ok(())
    }

    /// Read `len` bytes back as one or more read-prefixed chunks.
    pub fn read_chunked(&mut self, len: usize) -> Result<Vec<u8>, HostError> {
        let mut out = Vec::with_capacity(len);
        let mut remaining = len;
        while remaining > 0 {
            let chunk_len = remaining.min(MAX_CHUNK_LEN);
            self.stream.write_all(&[Frame::read_prefix_byte(chunk_len)])?;
            out.extend(self.read_exact_timed(chunk_len)?);
            remaining -= chunk_len;
        }
        Ok(out)
    }

    pub fn read_byte(&mut self) -> Result<u8, HostError> {
        Ok(self.read_exact_timed(1)?[0])
    }

    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, HostError> {
        self.read_exact_timed(n)
    }

    /// Read until a `\r\n` terminator is seen, dropping it from the
    /// returned bytes. Used for status (`?`) and scan (`d`) replies, which
    /// are variable-length ASCII lines rather than a fixed byte count.
    pub fn read_until_crlf(&mut self) -> Result<Vec<u8>, HostError> {
        let deadline = Instant::now() + self.read_timeout;
        let mut line = Vec::new();
        loop {
            if Instant::now() >= deadline {
                return Err(HostError::Timeout);
            }
            let mut byte = [0u8; 1];
            match self.stream.read(&mut byte) {
                Ok(1) => {
                    line.push(byte[0]);
                    if line.ends_with(b"\r\n") {
                        line.truncate(line.len() - 2);
                        return Ok(line);
                    }
                }
                Ok(0) => continue,
                Ok(_) => unreachable!(),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// `true` iff the next byte is `ACK` (`0x0F`).
    pub fn ack(&mut self) -> Result<bool, HostError> {
        Ok(self.read_byte()? == ACK)
    }

    /// Read one reply byte; `Ok(())` on `ACK`, `Err(HostError::Protocol)`
    /// on `ERR` (fetching the detailed code with `$`), `Err(HostError::Io)`
    /// wrapping an unexpected byte otherwise.
    pub fn expect_ack(&mut self) -> Result<(), HostError> {
        match self.read_byte()? {
            ACK => Ok(()),
            ERR => {
                self.send_command(b'$')?;
                let line = self.read_until_crlf()?;
                let code = line.first().copied().unwrap_or(0);
                Err(HostError::Protocol { code })
            }
            other => Err(HostError::Protocol { code: other }),
        }
    }

    fn read_exact_timed(&mut self, n: usize) -> Result<Vec<u8>, HostError> {
        let deadline = Instant::now() + self.read_timeout;
        let mut buf = vec![0u8; n];
        let mut got = 0;
        while got < n {
            if Instant::now() >= deadline {
                return Err(HostError::Timeout);
            }
            match self.stream.read(&mut buf[got..]) {
                Ok(0) => continue,
                Ok(k) => got += k,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(buf)
    }
}
