//! Lifecycle of the connection to a card.

use crate::apdu::{Command, Response};
use crate::transport::{Connection, Protocol, Transport};
use crate::{Error, Result};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// A session with the reader subsystem, holding at most one connection to a card.
///
/// The session is owned by the caller; every operation on it blocks until the reader answers.
/// Callers using it from many threads must serialise the calls themselves.
pub struct Session<T>
where
    T: Transport,
{
    context: Option<T>,
    connection: Option<T::Connection>,
    protocol: Option<Protocol>,
}

impl<T> Session<T>
where
    T: Transport,
{
    /// Wraps a subsystem handle that was obtained elsewhere.
    pub fn new(context: T) -> Self {
        Self {
            context: Some(context),
            connection: None,
            protocol: None,
        }
    }

    /// Obtains a handle to the reader subsystem.
    pub fn establish() -> Result<Self> {
        let context = T::establish()?;
        debug!("Established the reader context");

        Ok(Self::new(context))
    }

    /// Lists the reader names in the order reported by the subsystem.
    /// No readers at all is an error.
    pub fn list_readers(&self) -> Result<Vec<String>> {
        let readers = self.context()?.list_readers()?;
        if readers.is_empty() {
            return Err(Error::NoReaders);
        }

        debug!("Found readers: {}", readers.join(", "));
        Ok(readers)
    }

    /// Connects to the card in the reader, closing the current connection first.
    /// The card in a previously connected reader is left powered.
    pub fn connect(&mut self, reader: &str) -> Result<Protocol> {
        self.context()?;
        self.disconnect();

        let (connection, protocol) = self.context()?.connect(reader)?;
        info!("Connected to {} using protocol: {}", reader, protocol);

        self.connection = Some(connection);
        self.protocol = Some(protocol);

        Ok(protocol)
    }

    /// Closes the connection, leaving the card powered. Does nothing when not connected.
    pub fn disconnect(&mut self) {
        self.protocol = None;

        if let Some(connection) = self.connection.take() {
            match connection.disconnect() {
                Ok(()) => debug!("Disconnected from the card"),
                Err(e) => warn!("Failed to disconnect from the card: {}", e),
            }
        }
    }

    /// Disconnects and releases the subsystem handle.
    /// The session is unusable afterwards; establish a new one to continue.
    pub fn teardown(&mut self) {
        self.disconnect();

        if let Some(context) = self.context.take() {
            match context.release() {
                Ok(()) => debug!("Released the reader context"),
                Err(e) => warn!("Failed to release the reader context: {}", e),
            }
        }
    }

    pub fn is_established(&self) -> bool {
        self.context.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The protocol negotiated by the current connection.
    pub fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    /// Transmits an APDU command to the card, then receives a response from them.
    pub fn transmit(&mut self, command: &Command) -> Result<Response> {
        let connection = self.connection.as_mut().ok_or(Error::NotConnected)?;

        debug!("TX: {}", command);
        let rx = connection.transmit(&command.to_bytes())?;
        debug!("RX: {}", crate::codec::encode_hex(&rx));

        Response::from_bytes(rx)
    }

    fn context(&self) -> Result<&T> {
        self.context.as_ref().ok_or(Error::NotEstablished)
    }
}

impl<T> Drop for Session<T>
where
    T: Transport,
{
    fn drop(&mut self) {
        self.teardown();
    }
}
