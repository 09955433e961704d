//! PC/SC support for mifare library.
//! Can be enabled by turning `pcsc` feature on.
//!
//! ## What is PC/SC?
//! PC/SC (Personal Computer/Smart Card) is an abstraction layer for communicating with Smart Cards
//! from Windows. Using this layer, applications can connect to any devices that supports PC/SC,
//! without depending on their driver implementation. Windows and macOS supports PC/SC by themselves,
//! Linux also supports by installing pcsc-lite shared library.
//!
//! ## Supported platform
//! Linux, Windows and macOS are supported by pcsc-rust, backend of this implementation.
//! Refer the documentation of pcsc-rust for details:
//! <https://github.com/bluetech/pcsc-rust>
//!
//! ## Usage
//! ```rust,no_run
//! use mifare::pcsc::PcscTransport;
//! use mifare::Session;
//!
//! let mut session = Session::<PcscTransport>::establish().unwrap();
//! let readers = session.list_readers().unwrap();
//! let protocol = session.connect(&readers[0]).unwrap();
//! ```

use std::ffi::CString;

use pcsc::{
    Card, Disposition, Protocol as PcscProtocol, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE,
};

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::transport::{Connection, Protocol, Transport, TransportError};

impl From<pcsc::Error> for TransportError {
    fn from(e: pcsc::Error) -> Self {
        Self::new(e as u32, e.to_string())
    }
}

/// PC/SC context.
pub struct PcscTransport {
    ctx: pcsc::Context,
}

impl Transport for PcscTransport {
    type Connection = PcscCard;

    /// Creates a PC/SC context in system scope, so that every reader is visible.
    fn establish() -> Result<Self, TransportError> {
        Ok(Self {
            ctx: pcsc::Context::establish(Scope::System)?,
        })
    }

    fn list_readers(&self) -> Result<Vec<String>, TransportError> {
        let readers = match self.ctx.list_readers_owned() {
            Ok(readers) => readers,
            Err(pcsc::Error::NoReadersAvailable) => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(readers
            .into_iter()
            .map(|reader| reader.to_string_lossy().into_owned())
            .collect())
    }

    fn connect(&self, reader: &str) -> Result<(PcscCard, Protocol), TransportError> {
        let name = CString::new(reader).map_err(|_| TransportError::invalid_reader_name())?;

        let card = self
            .ctx
            .connect(&name, ShareMode::Shared, Protocols::T0 | Protocols::T1)?;
        let protocol = match card.status2_owned()?.protocol2() {
            Some(PcscProtocol::T0) => Protocol::T0,
            _ => Protocol::T1,
        };

        Ok((PcscCard { card }, protocol))
    }

    fn release(self) -> Result<(), TransportError> {
        self.ctx.release().map_err(|(_, e)| e.into())
    }
}

/// A card to be communicated through PC/SC.
pub struct PcscCard {
    card: Card,
}

impl Connection for PcscCard {
    fn transmit(&mut self, tx: &[u8]) -> Result<Vec<u8>, TransportError> {
        let mut rx = [0u8; MAX_BUFFER_SIZE];
        let rx = self.card.transmit(tx, &mut rx)?;

        Ok(Vec::from(rx))
    }

    fn disconnect(self) -> Result<(), TransportError> {
        debug!("Leaving the card powered");

        self.card
            .disconnect(Disposition::LeaveCard)
            .map_err(|(_, e)| e.into())
    }
}
