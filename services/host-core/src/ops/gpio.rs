//! Desktop-side raw GPIO operations. Grounded on `firmware/common/gpio.c`
//! and `GpioEngine` in `board-core`.
use std::io::{Read, Write};

use bridge_proto::CLEAR_MARKER;

use crate::error::HostError;
use crate::link::SerialLink;

const PIN_MASK: u8 = 0x1F;

pub struct GpioOperations<'a, T: Read + Write> {
    link: &'a mut SerialLink<T>,
}

impl<'a, T: Read + Write> GpioOperations<'a, T> {
    pub(crate) fn new(link: &'a mut SerialLink<T>) -> Self {
        GpioOperations { link }
    }

    /// Drive `pin` to `high`/`low` as an output. The reply is a literal
    /// `0xFF` placeholder, not meaningful data, so it's discarded.
    pub fn write(&mut self, pin: u8, high: bool) -> Result<(), HostError> {
        let command = validate_pin(pin)? | 0x40 | if high { 0x80 } else { 0 };
        self.link.send_command_with_payload(b'g', &[command])?;
        self.link.read_byte()?;
        Ok(())
    }

    /// Sample `pin` as an input. Bit 7 of the reply is the sampled level.
    pub fn read(&mut self, pin: u8) -> Result<bool, HostError> {
        let command = validate_pin(pin)? | 0x20;
        self.link.send_command_with_payload(b'g', &[command])?;
        let reply = self.link.read_byte()?;
        Ok((reply & 0x80) != 0)
    }

    /// Release `pin` and drop its owner bit.
    pub fn clear(&mut self, pin: u8) -> Result<(), HostError> {
        let command = validate_pin(pin)?;
        self.link.send_command_with_payload(b'g', &[command, CLEAR_MARKER])?;
        self.link.expect_ack()
    }
}

/// Raw GPIO, unlike buttons, has no reserved pin -- pin 0 is addressable.
fn validate_pin(pin: u8) -> Result<u8, HostError> {
    if pin & !PIN_MASK != 0 {
        return Err(HostError::InvalidArgument(format!("pin {} is out of range", pin)));
    }
    Ok(pin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_pin_above_31() {
        let mut link = SerialLink::new(std::io::Cursor::new(Vec::<u8>::new()));
        let mut ops = GpioOperations::new(&mut link);
        assert!(matches!(ops.read(32), Err(HostError::InvalidArgument(_))));
    }
}
