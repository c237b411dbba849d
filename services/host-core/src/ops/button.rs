//! Desktop-side button operations. Grounded on `firmware/common/button.c`
//! and `ButtonEngine` in `board-core`.
use std::io::{Read, Write};

use bridge_proto::BUTTON_CLEAR_MARKER;

use crate::error::HostError;
use crate::link::SerialLink;

const PIN_MASK: u8 = 0x1F;

pub struct ButtonOperations<'a, T: Read + Write> {
    link: &'a mut SerialLink<T>,
}

impl<'a, T: Read + Write> ButtonOperations<'a, T> {
    pub(crate) fn new(link: &'a mut SerialLink<T>) -> Self {
        ButtonOperations { link }
    }

    /// Arm a button on `pin`. Pin 0 is reserved (its state bit would
    /// underflow) and rejected here before it ever reaches the wire.
    pub fn configure(&mut self, pin: u8, polarity_high: bool, trigger_on_release: bool) -> Result<(), HostError> {
        if pin == 0 || pin & !PIN_MASK != 0 {
            return Err(HostError::InvalidArgument(format!("button pin {} is out of range", pin)));
        }
        let command =
            pin | if trigger_on_release { 0x40 } else { 0 } | if polarity_high { 0x80 } else { 0 };
        self.link.send_command_with_payload(b'b', &[command])?;
        self.link.expect_ack()
    }

    pub fn clear(&mut self, pin: u8) -> Result<(), HostError> {
        self.link.send_command_with_payload(b'b', &[pin, BUTTON_CLEAR_MARKER])?;
        self.link.expect_ack()
    }

    /// Read and clear the 32-bit event latch.
    pub fn read_state(&mut self) -> Result<u32, HostError> {
        self.link.send_command_with_payload(b'b', &[0x20])?;
        let bytes = self.link.read_exact(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_pin_zero() {
        let mut link = SerialLink::new(std::io::Cursor::new(Vec::<u8>::new()));
        let mut ops = ButtonOperations::new(&mut link);
        assert!(matches!(ops.configure(0, true, false), Err(HostError::InvalidArgument(_))));
    }
}
