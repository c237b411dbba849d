//! Single "last error" register queryable from the desktop with `$`.
use bridge_proto::ErrorCode;

use crate::error::Error;

#[derive(Debug)]
pub struct ErrorLog {
    last: ErrorCode,
}

impl Default for ErrorLog {
    fn default() -> Self {
        ErrorLog { last: ErrorCode::NoError }
    }
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the detailed code for a failed command. A command that
    /// succeeds never clears this -- the prior failure is visible until
    /// overwritten by the next one, per `SPEC_FULL.md` §7.
    pub fn record(&mut self, err: Error) {
        log::debug!("error_log: recording {:?} ({:#04x})", err, err.as_wire_byte());
        self.last = err.code();
    }

    pub fn last(&self) -> ErrorCode {
        self.last
    }

    pub fn last_byte(&self) -> u8 {
        self.last.as_wire_byte()
    }
}
