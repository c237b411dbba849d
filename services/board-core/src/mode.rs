//! Tracks which bus mode is currently selected and which modes this board
//! supports. Grounded on `firmware/common/serial.c`'s `supported_modes`
//! array and `set_mode`/`#` handling.
use bridge_proto::ModeCode;

/// Matches the source's `MAX_NUMBER_OF_MODES`.
const MAX_SUPPORTED_MODES: usize = 4;

#[derive(Debug)]
pub struct ModeRegistry {
    current: ModeCode,
    supported: [Option<ModeCode>; MAX_SUPPORTED_MODES],
}

impl ModeRegistry {
    /// A board starts up supporting `supported` modes (at most
    /// `MAX_SUPPORTED_MODES`), defaulting to the first one -- the original
    /// firmware defaults to I2C "for backwards compatibility".
    pub fn new(supported: &[ModeCode]) -> Self {
        assert!(!supported.is_empty(), "a board must support at least one mode");
        assert!(supported.len() <= MAX_SUPPORTED_MODES);
        let mut table = [None; MAX_SUPPORTED_MODES];
        for (slot, mode) in table.iter_mut().zip(supported.iter()) {
            *slot = Some(*mode);
        }
        ModeRegistry { current: supported[0], supported: table }
    }

    pub fn current(&self) -> ModeCode {
        self.current
    }

    pub fn is_supported(&self, mode: ModeCode) -> bool {
        self.supported.iter().any(|m| *m == Some(mode))
    }

    /// Switch modes, rejecting codes the board doesn't support.
    pub fn set(&mut self, mode: ModeCode) -> Result<(), ()> {
        if !self.is_supported(mode) {
            return Err(());
        }
        self.current = mode;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips() {
        let mut modes = ModeRegistry::new(&[ModeCode::I2c, ModeCode::OneWire]);
        assert_eq!(modes.current(), ModeCode::I2c);
        modes.set(ModeCode::OneWire).unwrap();
        assert_eq!(modes.current(), ModeCode::OneWire);
    }

    #[test]
    fn unsupported_mode_rejected() {
        let mut modes = ModeRegistry::new(&[ModeCode::I2c, ModeCode::OneWire]);
        assert!(modes.set(ModeCode::Spi).is_err());
        assert_eq!(modes.current(), ModeCode::I2c);
    }
}
