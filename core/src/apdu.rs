//! APDU framing for the proprietary command set of PC/SC contactless readers.

mod command;
mod response;

pub mod ins;

pub use command::Command;
pub use response::{Response, StatusWord};

/// Class byte of every reader-proprietary (pseudo-APDU) command.
pub const CLA_READER: u8 = 0xFF;

/// P1 of `LOAD KEY` selecting the reader's volatile key memory.
pub const LOAD_KEY_VOLATILE: u8 = 0x20;

/// Version byte of the `GENERAL AUTHENTICATE` data object.
pub const AUTHENTICATE_VERSION: u8 = 0x01;
