//! Desktop-side error taxonomy. Unlike `board-core::Error` this is free to
//! pull in a derive-macro crate since `host-core` only ever targets `std`.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out waiting for a reply")]
    Timeout,

    #[error("handshake failed: firmware did not reply 'OK'")]
    HandshakeFailed,

    #[error("firmware reported error code {code:#04x}")]
    Protocol { code: u8 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
