//! The reader subsystem this crate talks through.
//!
//! A [`Transport`] is the subsystem-level handle (a PC/SC context, for example): it enumerates the
//! readers and opens connections. A [`Connection`] exchanges one request frame for one response
//! frame with the card in a reader. Both calls block until the reader answers.

use std::fmt::{Display, Formatter};

/// The wire protocol negotiated between the reader and the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Protocol {
    /// Character-oriented protocol.
    T0,
    /// Block-oriented protocol.
    T1,
}

impl Display for Protocol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::T0 => "T0",
            Self::T1 => "T1",
        })
    }
}

/// A failure reported by the reader subsystem itself, with its vendor status code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (0x{code:08X})")]
pub struct TransportError {
    pub code: u32,
    pub message: String,
}

/// `SCARD_E_UNKNOWN_READER`
const UNKNOWN_READER: u32 = 0x8010_0009;

impl TransportError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The reader name is missing or cannot be passed to the subsystem.
    pub fn invalid_reader_name() -> Self {
        Self::new(UNKNOWN_READER, "Invalid reader name")
    }
}

/// A subsystem-level handle to the card readers.
pub trait Transport: Sized {
    type Connection: Connection;

    /// Obtains a handle to the subsystem.
    fn establish() -> Result<Self, TransportError>;

    /// Lists the names of the readers in the order the subsystem reports them.
    fn list_readers(&self) -> Result<Vec<String>, TransportError>;

    /// Connects to the card in the reader.
    /// Implementations must request shared access and accept either T=0 or T=1,
    /// returning the protocol that was negotiated.
    fn connect(&self, reader: &str) -> Result<(Self::Connection, Protocol), TransportError>;

    /// Releases the handle.
    fn release(self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A live connection to a card.
pub trait Connection {
    /// Transmits a request frame to the card, then receives the response frame from them.
    fn transmit(&mut self, tx: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Closes the connection, leaving the card powered.
    fn disconnect(self) -> Result<(), TransportError>;
}
