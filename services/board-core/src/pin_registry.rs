//! Authoritative per-pin ownership table, arbitrating GPIO / I2C / 1-Wire /
//! Button claims. Grounded on `firmware/common/serial.c:is_pin_taken` and
//! the per-subsystem `is_pin_in_use_by_*` checks it replaces with a single
//! table.
use bridge_proto::{PinOwners, PIN_COUNT};

#[derive(Debug)]
pub struct PinRegistry {
    owners: [PinOwners; PIN_COUNT],
}

impl Default for PinRegistry {
    fn default() -> Self {
        PinRegistry { owners: [PinOwners::empty(); PIN_COUNT] }
    }
}

impl PinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All owner bits currently set for `pin`.
    pub fn owners(&self, pin: u8) -> PinOwners {
        self.owners[pin as usize % PIN_COUNT]
    }

    /// `true` if any subsystem owns `pin`.
    pub fn is_taken(&self, pin: u8) -> bool {
        !self.owners(pin).is_empty()
    }

    /// `true` if some subsystem *other than* `by` owns `pin`.
    pub fn is_taken_by_other(&self, pin: u8, by: PinOwners) -> bool {
        !(self.owners(pin) & !by).is_empty()
    }

    /// Claim `pin` for `owner`. Idempotent if `owner` already holds it;
    /// fails if a different subsystem holds it.
    pub fn acquire(&mut self, pin: u8, owner: PinOwners) -> Result<(), ()> {
        if self.owners(pin).contains(owner) {
            return Ok(());
        }
        if self.is_taken_by_other(pin, owner) {
            return Err(());
        }
        self.owners[pin as usize % PIN_COUNT].insert(owner);
        Ok(())
    }

    /// Release `owner`'s claim on `pin`, if any. Releasing an unheld owner
    /// bit is a no-op.
    pub fn release(&mut self, pin: u8, owner: PinOwners) {
        self.owners[pin as usize % PIN_COUNT].remove(owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_idempotent() {
        let mut reg = PinRegistry::new();
        assert!(reg.acquire(3, PinOwners::I2C).is_ok());
        assert!(reg.acquire(3, PinOwners::I2C).is_ok());
        assert_eq!(reg.owners(3), PinOwners::I2C);
    }

    #[test]
    fn cross_subsystem_acquire_rejected() {
        let mut reg = PinRegistry::new();
        reg.acquire(3, PinOwners::I2C).unwrap();
        assert!(reg.acquire(3, PinOwners::GPIO).is_err());
    }

    #[test]
    fn release_then_acquire_by_other() {
        let mut reg = PinRegistry::new();
        reg.acquire(3, PinOwners::I2C).unwrap();
        reg.release(3, PinOwners::I2C);
        assert!(!reg.is_taken(3));
        assert!(reg.acquire(3, PinOwners::ONEWIRE).is_ok());
    }

    #[test]
    fn at_most_one_owner_bit_invariant() {
        let mut reg = PinRegistry::new();
        for pin in 0..32u8 {
            reg.acquire(pin, PinOwners::GPIO).unwrap();
            assert_eq!(reg.owners(pin).bits().count_ones(), 1);
        }
    }
}
