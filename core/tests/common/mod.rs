//! An in-memory reader that records every frame it receives.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use mifare::apdu::ins;
use mifare::codec::{Block, BLOCK_SIZE};
use mifare::{Connection, Protocol, Transport, TransportError};

pub const SUCCESS: [u8; 2] = [0x90, 0x00];

#[derive(Default)]
pub struct Reader {
    pub readers: Vec<String>,
    pub protocol: Option<Protocol>,
    /// Frames received, in order.
    pub frames: Vec<Vec<u8>>,
    /// Canned replies per instruction, replacing the default behaviour.
    pub replies: HashMap<u8, Result<Vec<u8>, TransportError>>,
    /// Blocks that refuse authentication with `63 00`.
    pub locked: HashSet<u8>,
    pub memory: HashMap<u8, Block>,
    pub connects: Vec<String>,
    pub disconnects: usize,
    pub released: bool,
}

impl Reader {
    /// Instruction bytes of the frames received, in order.
    pub fn instructions(&self) -> Vec<u8> {
        self.frames.iter().map(|frame| frame[1]).collect()
    }

    fn handle(&mut self, tx: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.frames.push(tx.to_vec());

        let ins = tx[1];
        if let Some(reply) = self.replies.get(&ins) {
            return reply.clone();
        }

        match ins {
            ins::GENERAL_AUTHENTICATE if self.locked.contains(&tx[7]) => Ok(vec![0x63, 0x00]),
            ins::READ_BINARY => {
                let mut rx = self.memory.get(&tx[3]).copied().unwrap_or_default().to_vec();
                rx.extend_from_slice(&SUCCESS);
                Ok(rx)
            }
            ins::UPDATE_BINARY => {
                let mut block = [0u8; BLOCK_SIZE];
                block.copy_from_slice(&tx[5..5 + BLOCK_SIZE]);
                self.memory.insert(tx[3], block);
                Ok(SUCCESS.to_vec())
            }
            _ => Ok(SUCCESS.to_vec()),
        }
    }
}

#[derive(Clone, Default)]
pub struct MockTransport(pub Rc<RefCell<Reader>>);

impl MockTransport {
    pub fn with_readers(readers: &[&str]) -> Self {
        let transport = Self::default();
        transport.0.borrow_mut().readers = readers.iter().map(|r| r.to_string()).collect();
        transport
    }

    pub fn reader(&self) -> std::cell::RefMut<'_, Reader> {
        self.0.borrow_mut()
    }
}

impl Transport for MockTransport {
    type Connection = MockConnection;

    fn establish() -> Result<Self, TransportError> {
        Ok(Self::with_readers(&["Reader1"]))
    }

    fn list_readers(&self) -> Result<Vec<String>, TransportError> {
        Ok(self.0.borrow().readers.clone())
    }

    fn connect(&self, reader: &str) -> Result<(MockConnection, Protocol), TransportError> {
        let mut state = self.0.borrow_mut();
        if !state.readers.iter().any(|r| r == reader) {
            return Err(TransportError::new(0x8010_0009, "Unknown reader"));
        }

        state.connects.push(reader.to_string());
        Ok((
            MockConnection(Rc::clone(&self.0)),
            state.protocol.unwrap_or(Protocol::T1),
        ))
    }

    fn release(self) -> Result<(), TransportError> {
        self.0.borrow_mut().released = true;
        Ok(())
    }
}

pub struct MockConnection(Rc<RefCell<Reader>>);

impl Connection for MockConnection {
    fn transmit(&mut self, tx: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.0.borrow_mut().handle(tx)
    }

    fn disconnect(self) -> Result<(), TransportError> {
        self.0.borrow_mut().disconnects += 1;
        Ok(())
    }
}
