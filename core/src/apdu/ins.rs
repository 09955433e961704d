//! Instruction bytes.

pub const LOAD_KEY: u8 = 0x82;
pub const GENERAL_AUTHENTICATE: u8 = 0x86;
pub const READ_BINARY: u8 = 0xB0;
pub const UPDATE_BINARY: u8 = 0xD6;
