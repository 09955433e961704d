//! Errors returned by the session and APDU layers.

use crate::apdu::StatusWord;
use crate::transport::TransportError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Card reader context is not established")]
    NotEstablished,

    #[error("Not connected to card")]
    NotConnected,

    #[error("No readers found")]
    NoReaders,

    #[error("Error occurred while communicating with the reader: {0}")]
    Subsystem(#[from] TransportError),

    #[error("The card returned an error: SW={0}")]
    Status(StatusWord),

    #[error("Operation not supported by this key slot: SW={0}")]
    NotSupported(StatusWord),

    #[error("Invalid response length: {0}")]
    MalformedResponse(usize),

    #[error("Invalid key: expected 12 hex digits, got {0} characters")]
    InvalidKey(usize),

    #[error("Invalid key type: {0:#04X}")]
    InvalidKeyType(u8),

    #[error("APDU payload is too long: {0} bytes")]
    PayloadTooLong(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
