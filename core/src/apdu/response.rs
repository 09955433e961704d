use std::fmt::{Display, Formatter};

use crate::Error;

/// The two trailing octets (SW1, SW2) of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord(pub u8, pub u8);

impl StatusWord {
    pub const SUCCESS: Self = Self(0x90, 0x00);

    /// Referenced data not found; the reader does not support the operation for this key slot.
    pub const NOT_SUPPORTED: Self = Self(0x69, 0x86);

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl Display for StatusWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02X}{:02X}", self.0, self.1)
    }
}

impl From<(u8, u8)> for StatusWord {
    fn from((sw1, sw2): (u8, u8)) -> Self {
        Self(sw1, sw2)
    }
}

/// An response that was received from the card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    payload: Vec<u8>,
    trailer: StatusWord,
}

impl Response {
    /// Parses a response from the octets.
    /// The last two octets are the status word; anything shorter is malformed.
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self, Error> {
        if bytes.len() < 2 {
            return Err(Error::MalformedResponse(bytes.len()));
        }

        let trailer = bytes.split_off(bytes.len() - 2);

        Ok(Self {
            payload: bytes,
            trailer: StatusWord(trailer[0], trailer[1]),
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn status(&self) -> StatusWord {
        self.trailer
    }

    /// Determines whether the response indicates success or not.
    pub fn is_ok(&self) -> bool {
        self.trailer.is_success()
    }

    /// Converts the response to a result of octets.
    pub fn into_result(self) -> Result<Vec<u8>, Error> {
        match self.is_ok() {
            true => Ok(self.payload),
            _ => Err(Error::Status(self.trailer)),
        }
    }

    /// Same as [`Response::into_result`], additionally telling `69 86` apart.
    /// Used by the key-load and authenticate flows.
    pub fn into_key_result(self) -> Result<Vec<u8>, Error> {
        match self.trailer {
            StatusWord::NOT_SUPPORTED => Err(Error::NotSupported(self.trailer)),
            _ => self.into_result(),
        }
    }
}

impl TryFrom<Vec<u8>> for Response {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_bytes(bytes)
    }
}
