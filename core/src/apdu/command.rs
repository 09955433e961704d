use std::fmt::{Display, Formatter};

use crate::apdu::{ins, AUTHENTICATE_VERSION, CLA_READER, LOAD_KEY_VOLATILE};
use crate::codec::{self, Block};
use crate::key::{Key, KeyType};
use crate::Error;

/// An APDU command to be transmitted.
/// Lc is never stored; it is always derived from the payload when encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    le: Option<u8>,
    payload: Option<Vec<u8>>,
}

impl Command {
    /// Constructs an command with CLA, INS, P1, and P2.
    /// No payloads will be transmitted or received.
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            le: None,
            payload: None,
        }
    }

    /// Constructs an command with CLA, INS, P1, P2, and Le.
    /// A payload will be received.
    pub fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: u8) -> Self {
        Self {
            le: Some(le),
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Constructs an command with CLA, INS, P1, P2, and a payload of at most 255 octets.
    /// No payload will be received.
    pub fn new_with_payload(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        payload: Vec<u8>,
    ) -> Result<Self, Error> {
        if payload.len() > u8::MAX as usize {
            return Err(Error::PayloadTooLong(payload.len()));
        }

        Ok(Self::with_short_payload(cla, ins, p1, p2, payload))
    }

    fn with_short_payload(cla: u8, ins: u8, p1: u8, p2: u8, payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Constructs a `LOAD KEY` command, storing the key into the volatile key `slot` of the reader.
    pub fn load_key(slot: u8, key: &Key) -> Self {
        Self::with_short_payload(
            CLA_READER,
            ins::LOAD_KEY,
            LOAD_KEY_VOLATILE,
            slot,
            key.as_bytes().to_vec(),
        )
    }

    /// Constructs a `GENERAL AUTHENTICATE` command for the block, using the key loaded in `slot`.
    pub fn authenticate(block: u8, key_type: KeyType, slot: u8) -> Self {
        Self::with_short_payload(
            CLA_READER,
            ins::GENERAL_AUTHENTICATE,
            0x00,
            0x00,
            vec![AUTHENTICATE_VERSION, 0x00, block, key_type.into(), slot],
        )
    }

    /// Constructs a `READ BINARY` command reading `le` octets from the block.
    pub fn read_binary(block: u8, le: u8) -> Self {
        Self::new_with_le(CLA_READER, ins::READ_BINARY, 0x00, block, le)
    }

    /// Constructs an `UPDATE BINARY` command writing an entire block.
    pub fn update_binary(block: u8, data: &Block) -> Self {
        Self::with_short_payload(CLA_READER, ins::UPDATE_BINARY, 0x00, block, data.to_vec())
    }

    pub fn ins(&self) -> u8 {
        self.ins
    }

    pub fn payload(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or_default()
    }

    /// Encodes the command into octets without consuming them.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer: Vec<u8> = vec![self.cla, self.ins, self.p1, self.p2];
        if let Some(p) = &self.payload {
            buffer.push(p.len() as u8);
            buffer.extend_from_slice(p);
        }

        if let Some(l) = self.le {
            buffer.push(l);
        }

        buffer
    }

    /// Converts the command into octets.
    pub fn into_bytes(self) -> Vec<u8> {
        self.to_bytes()
    }
}

impl From<Command> for Vec<u8> {
    fn from(command: Command) -> Self {
        command.into_bytes()
    }
}

/// Hex rendering for logs; the payload of `LOAD KEY` is never shown.
impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.ins {
            ins::LOAD_KEY => {
                let mut bytes = self.to_bytes();
                bytes.truncate(5);
                write!(f, "{} <redacted>", codec::encode_hex(&bytes))
            }
            _ => f.write_str(&codec::encode_hex(&self.to_bytes())),
        }
    }
}
