//! A crate to read and write MIFARE Classic blocks through a contactless reader.
//!
//! The reader itself is reached through a [`Transport`]; this crate owns the session lifecycle,
//! the APDU framing of the reader's proprietary commands and the encoding of 16-byte blocks.
//!
//! ```rust,no_run
//! # #[cfg(feature = "pcsc")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use mifare::pcsc::PcscTransport;
//! use mifare::{BlockAccess, Key, Session};
//!
//! let mut session = Session::<PcscTransport>::establish()?;
//! let reader = session.list_readers()?.remove(0);
//! session.connect(&reader)?;
//!
//! let key: Key = "FF FF FF FF FF FF".parse()?;
//! let mut access = BlockAccess::new(&mut session);
//! access.write_block(&key, 4, "HELLO")?;
//! println!("{}", access.read_block(&key, 4)?);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "pcsc"))]
//! # fn main() {}
//! ```

// No-op log macros; must stay above the module declarations.
#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($t: tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! info {
    ($($t: tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn {
    ($($t: tt)*) => {{
        let _ = format_args!($($t)*);
    }};
}

#[cfg(feature = "pcsc")]
pub mod pcsc;

pub mod apdu;
pub mod block;
pub mod codec;
pub mod error;
pub mod key;
pub mod session;
pub mod transport;

pub use block::{AccessError, AccessOptions, BlockAccess, BlockContents, RecordError, Stage};
pub use error::{Error, Result};
pub use key::{Key, KeyType};
pub use session::Session;
pub use transport::{Connection, Protocol, Transport, TransportError};
