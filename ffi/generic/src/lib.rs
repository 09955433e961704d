#![allow(clippy::missing_safety_doc)]

//! C interface over a single process-wide session.
//! Every call records its outcome, readable through `last_error` until the next call.

use std::ffi::{c_char, c_int, CStr, CString};
use std::fmt::Display;
use std::ptr::null_mut;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mifare::pcsc::PcscTransport;
use mifare::{BlockAccess, Error, Key, KeyType, Session, Transport, TransportError};

const OK: c_int = 0;
const FAILED: c_int = -1;

/// Prefix of every failure returned through a string channel.
const ERROR_PREFIX: &str = "ERROR: ";

struct State<T>
where
    T: Transport,
{
    session: Option<Session<T>>,
    last_error: String,
}

impl<T> State<T>
where
    T: Transport,
{
    const fn new() -> Self {
        Self {
            session: None,
            last_error: String::new(),
        }
    }

    /// Returns the session, establishing the reader context on first use.
    fn session(&mut self) -> Result<&mut Session<T>, Error> {
        if !self.session.as_ref().is_some_and(Session::is_established) {
            self.session = Some(Session::establish()?);
        }

        self.session.as_mut().ok_or(Error::NotEstablished)
    }

    /// Returns the session only when it is connected to a card.
    fn connected(&mut self) -> Result<&mut Session<T>, Error> {
        self.session
            .as_mut()
            .filter(|session| session.is_connected())
            .ok_or(Error::NotConnected)
    }

    /// Records the outcome, mapping a failure to its code.
    fn record<E>(&mut self, result: Result<String, E>, code: impl FnOnce(&E) -> c_int) -> c_int
    where
        E: Display,
    {
        match result {
            Ok(message) => {
                self.last_error = message;
                OK
            }
            Err(e) => {
                self.last_error = e.to_string();
                code(&e)
            }
        }
    }

    /// Records the outcome of a call answering through a string.
    fn reply<E>(&mut self, result: Result<(String, String), E>) -> String
    where
        E: Display,
    {
        match result {
            Ok((text, message)) => {
                self.last_error = message;
                text
            }
            Err(e) => {
                self.last_error = e.to_string();
                format!("{}{}", ERROR_PREFIX, e)
            }
        }
    }

    fn list_readers(&mut self) -> String {
        let result = self
            .session()
            .and_then(|session| session.list_readers())
            .map(|readers| readers.join(","))
            .map(|text| (text.clone(), text));

        self.reply(result)
    }

    fn connect_reader(&mut self, reader: Option<&str>) -> c_int {
        let result = reader
            .ok_or_else(|| Error::Subsystem(TransportError::invalid_reader_name()))
            .and_then(|reader| self.session()?.connect(reader))
            .map(|protocol| format!("Connected using protocol: {}", protocol));

        self.record(result, failed)
    }

    fn disconnect(&mut self) {
        if let Some(session) = &mut self.session {
            session.disconnect();
        }
    }

    fn cleanup(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
    }

    fn load_key(&mut self, key: Result<Key, Error>, slot: u8) -> c_int {
        let result = key.and_then(|key| BlockAccess::new(self.connected()?).load_key(&key, slot));

        self.record(result.map(|_| "Key loaded successfully".into()), failed)
    }

    fn authenticate_block(&mut self, block: u8, key_type: u8, slot: u8) -> c_int {
        let result = KeyType::try_from(key_type).and_then(|key_type| {
            BlockAccess::new(self.connected()?).authenticate(block, key_type, slot)
        });

        self.record(result.map(|_| "Authentication successful".into()), failed)
    }

    fn read_block_string(&mut self, key: Result<Key, Error>, block: u8) -> String {
        let result = key.map_err(|e| e.to_string()).and_then(|key| {
            let session = self.connected().map_err(|e| e.to_string())?;
            BlockAccess::new(session)
                .read_block(&key, block)
                .map_err(|e| e.to_string())
        });

        self.reply(result.map(|contents| (contents.to_string(), "Read successful".into())))
    }

    fn write_block_string(&mut self, key: Result<Key, Error>, block: u8, text: &[u8]) -> c_int {
        let result = key
            .and_then(|key| Ok(BlockAccess::new(self.connected()?).write_block(&key, block, text)));

        match result {
            Ok(result) => self.record(result.map(|_| "Write successful".into()), |e| {
                e.stage.code()
            }),
            Err(e) => self.record(Err(e), failed),
        }
    }
}

static STATE: Mutex<State<PcscTransport>> = Mutex::new(State::new());

fn state() -> MutexGuard<'static, State<PcscTransport>> {
    STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

fn with_state<R>(f: impl FnOnce(&mut State<PcscTransport>) -> R) -> R {
    f(&mut state())
}

fn into_raw(text: String) -> *mut c_char {
    // Interior NULs cannot cross the interface; the text is cut at the first one.
    let text = match text.find('\0') {
        Some(i) => &text[..i],
        None => &text,
    };

    CString::new(text).map_or(null_mut(), CString::into_raw)
}

unsafe fn str_arg<'a>(ptr: *const c_char) -> Option<&'a CStr> {
    match ptr.is_null() {
        true => None,
        _ => Some(CStr::from_ptr(ptr)),
    }
}

unsafe fn key_arg(ptr: *const c_char) -> Result<Key, Error> {
    str_arg(ptr)
        .ok_or(Error::InvalidKey(0))?
        .to_string_lossy()
        .parse()
}

fn failed<E>(_: &E) -> c_int {
    FAILED
}

/// Returns the outcome of the latest call, as a string to be released with `free_string`.
#[no_mangle]
pub extern "C" fn last_error() -> *mut c_char {
    into_raw(with_state(|state| state.last_error.clone()))
}

/// Lists the readers as a comma-separated string.
/// On failure the string starts with `"ERROR: "` instead.
#[no_mangle]
pub extern "C" fn list_readers() -> *mut c_char {
    into_raw(with_state(State::list_readers))
}

/// Connects to the card in the reader, closing the current connection first.
/// Returns 0 on success, -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn connect_reader(reader_name: *const c_char) -> c_int {
    let reader = str_arg(reader_name).map(|name| name.to_string_lossy().into_owned());

    with_state(|state| state.connect_reader(reader.as_deref()))
}

/// Disconnects from the card, leaving them powered.
#[no_mangle]
pub extern "C" fn disconnect_card() {
    with_state(State::disconnect)
}

/// Disconnects and releases the reader context.
#[no_mangle]
pub extern "C" fn cleanup() {
    with_state(State::cleanup)
}

/// Loads the 6-byte key, given as 12 hex digits, into the key slot of the reader.
/// Returns 0 on success, -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn load_key(key: *const c_char, key_location: c_int) -> c_int {
    let key = key_arg(key);

    with_state(|state| state.load_key(key, key_location as u8))
}

/// Authenticates the block with the loaded key.
/// `key_type` is 0x60 for key A or 0x61 for key B. Returns 0 on success, -1 on failure.
#[no_mangle]
pub extern "C" fn authenticate_block(
    block_number: c_int,
    key_type: c_int,
    key_location: c_int,
) -> c_int {
    with_state(|state| {
        state.authenticate_block(block_number as u8, key_type as u8, key_location as u8)
    })
}

/// Reads the block with key A in slot 0.
/// Returns the printable text followed by `"\n[Hex: ...]"`, or a string starting with `"ERROR: "`.
#[no_mangle]
pub unsafe extern "C" fn read_block_string(
    key: *const c_char,
    block_number: c_int,
) -> *mut c_char {
    let key = key_arg(key);

    into_raw(with_state(|state| state.read_block_string(key, block_number as u8)))
}

/// Writes the text, padded with zeros or truncated to 16 bytes, with key A in slot 0.
/// Returns 0 on success, or the failing stage:
/// -1 key load, -2 authentication, -3 transmission, -4 status word.
#[no_mangle]
pub unsafe extern "C" fn write_block_string(
    key: *const c_char,
    block_number: c_int,
    text: *const c_char,
) -> c_int {
    let key = key_arg(key);
    let text = str_arg(text).map(CStr::to_bytes).unwrap_or_default();

    with_state(|state| state.write_block_string(key, block_number as u8, text))
}

/// Releases a string returned by this library.
#[no_mangle]
pub unsafe extern "C" fn free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        let _ = CString::from_raw(ptr);
    }
}
