//! Hardware abstraction the bus engines are written against.
//!
//! `board-core` never talks to a specific chip's registers directly; every
//! engine that needs to wiggle a pin or measure time takes one of these
//! traits as a type parameter. This mirrors the split `services/llio` makes
//! between its `hardware` (real silicon) and `hosted` (desktop stand-in)
//! backends, generalized into trait objects so the same engine code runs
//! against either.

/// Raw digital I/O on a single GPIO pin, addressed by pin number.
pub trait GpioPin {
    /// Configure `pin` as an output (`true`) or input (`false`).
    fn set_direction(&mut self, pin: u8, output: bool);
    /// Drive an output pin high (`true`) or low (`false`).
    fn write(&mut self, pin: u8, high: bool);
    /// Sample the current level of a pin, regardless of direction.
    fn read(&mut self, pin: u8) -> bool;
    /// Enable an internal pull-down on an input pin.
    fn pull_down(&mut self, pin: u8);
    /// Enable an internal pull-up on an input/open-drain pin.
    fn pull_up(&mut self, pin: u8);
    /// Release a pin back to its reset state (used by GPIO/button clear).
    fn deinit(&mut self, pin: u8);
}

/// Timekeeping and busy-wait delay, needed by the 1-Wire bit-bang timing
/// and button debounce logic.
pub trait Clock {
    /// Free-running microsecond counter. Wraps are tolerated by callers via
    /// wrapping subtraction.
    fn now_us(&self) -> u64;
    /// Busy-wait for approximately `us` microseconds.
    fn delay_us(&mut self, us: u32);
}
