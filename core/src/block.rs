//! Authenticated access to MIFARE Classic blocks.

use std::fmt::{Display, Formatter};

use crate::apdu::Command;
use crate::codec::{self, BLOCK_SIZE};
use crate::key::{Key, KeyType};
use crate::{Error, Session, Transport};

#[cfg(feature = "tracing")]
use tracing::debug;

/// First data block of the card; block 0 holds the manufacturer data.
pub const FIRST_DATA_BLOCK: u8 = 4;

/// Determines whether the block is the trailer (keys and access bits) of its sector.
/// Sectors 0-31 have 4 blocks, sectors 32-39 of 4K cards have 16.
pub fn is_sector_trailer(block: u8) -> bool {
    match block {
        0..=127 => block % 4 == 3,
        _ => block % 16 == 15,
    }
}

/// Key slot and key type used by the composite read and write operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct AccessOptions {
    pub key_slot: u8,
    pub key_type: KeyType,
}

/// The step of a composite operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadKey,
    Authenticate,
    Transmit,
    Status,
}

impl Stage {
    /// Numeric code of the stage, as returned through the C interface.
    pub fn code(self) -> i32 {
        match self {
            Self::LoadKey => -1,
            Self::Authenticate => -2,
            Self::Transmit => -3,
            Self::Status => -4,
        }
    }

    /// Stage of a failed data exchange: the transmission itself, or the response to it.
    fn of_exchange(e: &Error) -> Self {
        match e {
            Error::Subsystem(_) | Error::NotConnected => Self::Transmit,
            _ => Self::Status,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::LoadKey => "Load key",
            Self::Authenticate => "Authentication",
            Self::Transmit => "Transmit",
            Self::Status => "Status check",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct AccessError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

impl AccessError {
    fn at(stage: Stage) -> impl FnOnce(Error) -> Self {
        move |source| Self { stage, source }
    }

    fn exchange(source: Error) -> Self {
        Self {
            stage: Stage::of_exchange(&source),
            source,
        }
    }
}

/// A block that was read from the card.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BlockContents {
    pub block: u8,
    pub bytes: Vec<u8>,
}

impl BlockContents {
    /// Printable rendering of the block, up to the first NUL.
    pub fn text(&self) -> String {
        codec::encode_display(&self.bytes)
    }

    /// Hex dump of every octet of the block.
    pub fn hex(&self) -> String {
        codec::encode_hex(&self.bytes)
    }
}

impl Display for BlockContents {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n[Hex: {}]", self.text(), self.hex())
    }
}

/// Block-level operations over a connected session.
pub struct BlockAccess<'a, T>
where
    T: Transport,
{
    session: &'a mut Session<T>,
    options: AccessOptions,
}

impl<'a, T> BlockAccess<'a, T>
where
    T: Transport,
{
    pub fn new(session: &'a mut Session<T>) -> Self {
        Self::with_options(session, AccessOptions::default())
    }

    pub fn with_options(session: &'a mut Session<T>, options: AccessOptions) -> Self {
        Self { session, options }
    }

    pub fn options(&self) -> AccessOptions {
        self.options
    }

    /// Loads the key into the volatile key slot of the reader.
    pub fn load_key(&mut self, key: &Key, slot: u8) -> Result<(), Error> {
        self.session
            .transmit(&Command::load_key(slot, key))?
            .into_key_result()?;

        debug!("Key loaded into slot {}", slot);
        Ok(())
    }

    /// Authenticates the block with the key loaded in the slot.
    pub fn authenticate(&mut self, block: u8, key_type: KeyType, slot: u8) -> Result<(), Error> {
        self.session
            .transmit(&Command::authenticate(block, key_type, slot))?
            .into_key_result()?;

        debug!("Authenticated block {} with key {:?}", block, key_type);
        Ok(())
    }

    /// Reads `len` octets from the block. The sector must be authenticated.
    pub fn read_binary(&mut self, block: u8, len: u8) -> Result<Vec<u8>, Error> {
        self.session
            .transmit(&Command::read_binary(block, len))?
            .into_result()
    }

    /// Writes an entire block. The sector must be authenticated.
    pub fn update_binary(&mut self, block: u8, data: &codec::Block) -> Result<(), Error> {
        self.session
            .transmit(&Command::update_binary(block, data))?
            .into_result()
            .map(|_| ())
    }

    /// Loads the key, authenticates the block, then reads their 16 octets.
    pub fn read_block(&mut self, key: &Key, block: u8) -> Result<BlockContents, AccessError> {
        self.unlock(key, block)?;

        let bytes = self
            .read_binary(block, BLOCK_SIZE as u8)
            .map_err(AccessError::exchange)?;

        Ok(BlockContents { block, bytes })
    }

    /// Loads the key, authenticates the block, then writes the text padded to 16 octets.
    /// Text longer than a block is truncated.
    pub fn write_block(
        &mut self,
        key: &Key,
        block: u8,
        text: impl AsRef<[u8]>,
    ) -> Result<(), AccessError> {
        self.unlock(key, block)?;

        let data = codec::pad_to_block(text);
        self.update_binary(block, &data).map_err(AccessError::exchange)?;

        debug!("Wrote block {}", block);
        Ok(())
    }

    /// Writes each record to the next data block from `start_block`,
    /// skipping the manufacturer block and sector trailers.
    /// Returns the blocks written, in order; stops at the first failure.
    pub fn write_records<I, S>(
        &mut self,
        key: &Key,
        start_block: u8,
        records: I,
    ) -> Result<Vec<u8>, RecordError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut written = Vec::new();
        let mut next = Some(start_block);

        for record in records {
            let block = next
                .and_then(|from| (from..=u8::MAX).find(|&b| b != 0 && !is_sector_trailer(b)))
                .ok_or_else(|| RecordError::OutOfBlocks {
                    written: written.clone(),
                })?;

            self.write_block(key, block, record.as_ref().as_bytes())
                .map_err(|source| RecordError::Write {
                    block,
                    written: written.clone(),
                    source,
                })?;

            written.push(block);
            next = block.checked_add(1);
        }

        Ok(written)
    }

    fn unlock(&mut self, key: &Key, block: u8) -> Result<(), AccessError> {
        let AccessOptions { key_slot, key_type } = self.options;

        self.load_key(key, key_slot)
            .map_err(AccessError::at(Stage::LoadKey))?;
        self.authenticate(block, key_type, key_slot)
            .map_err(AccessError::at(Stage::Authenticate))
    }
}

/// A failure of [`BlockAccess::write_records`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("Failed to write block {block}: {source}")]
    Write {
        block: u8,
        written: Vec<u8>,
        #[source]
        source: AccessError,
    },

    #[error("No data blocks left on the card")]
    OutOfBlocks { written: Vec<u8> },
}

impl RecordError {
    /// Blocks written before the failure.
    pub fn written(&self) -> &[u8] {
        match self {
            Self::Write { written, .. } | Self::OutOfBlocks { written } => written,
        }
    }
}
