//! Authentication keys of MIFARE Classic sectors.

use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use crate::Error;

/// Size of a MIFARE Classic key in octets.
pub const KEY_SIZE: usize = 6;

/// A 6-octet key, forwarded to the reader as-is.
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Transport configuration key of blank cards.
    pub const DEFAULT: Self = Self([0xFF; KEY_SIZE]);

    pub const fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Key(..)")
    }
}

/// Parses 12 hex digits, optionally with spaces between them (`"FF FF FF FF FF FF"`).
impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|&c| c != ' ').collect();
        let mut bytes = [0u8; KEY_SIZE];

        hex::decode_to_slice(&digits, &mut bytes)
            .map_err(|_| Error::InvalidKey(digits.chars().count()))?;

        Ok(Self(bytes))
    }
}

/// Which of the two sector keys to authenticate with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum KeyType {
    #[default]
    A,
    B,
}

impl From<KeyType> for u8 {
    fn from(key_type: KeyType) -> Self {
        match key_type {
            KeyType::A => 0x60,
            KeyType::B => 0x61,
        }
    }
}

impl TryFrom<u8> for KeyType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x60 => Ok(Self::A),
            0x61 => Ok(Self::B),
            _ => Err(Error::InvalidKeyType(value)),
        }
    }
}
