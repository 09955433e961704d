mod common;

use mifare::apdu::{ins, StatusWord};
use mifare::{
    AccessError, AccessOptions, BlockAccess, Error, Key, KeyType, RecordError, Session, Stage,
    TransportError,
};

use crate::common::MockTransport;

fn connected() -> (MockTransport, Session<MockTransport>) {
    let transport = MockTransport::with_readers(&["Reader1"]);
    let mut session = Session::new(transport.clone());
    session.connect("Reader1").unwrap();

    (transport, session)
}

fn key() -> Key {
    "FFFFFFFFFFFF".parse().unwrap()
}

#[test]
fn read_loads_key_then_authenticates_then_reads() {
    let (transport, mut session) = connected();

    BlockAccess::new(&mut session).read_block(&key(), 4).unwrap();

    assert_eq!(
        vec![ins::LOAD_KEY, ins::GENERAL_AUTHENTICATE, ins::READ_BINARY],
        transport.reader().instructions()
    );
}

#[test]
fn write_loads_key_then_authenticates_then_writes() {
    let (transport, mut session) = connected();

    BlockAccess::new(&mut session)
        .write_block(&key(), 4, "HELLO")
        .unwrap();

    assert_eq!(
        vec![ins::LOAD_KEY, ins::GENERAL_AUTHENTICATE, ins::UPDATE_BINARY],
        transport.reader().instructions()
    );
}

#[test]
fn frames_use_slot_0_and_key_a_by_default() {
    let (transport, mut session) = connected();

    BlockAccess::new(&mut session).read_block(&key(), 9).unwrap();

    let reader = transport.reader();
    assert_eq!(
        vec![0xFF, 0x82, 0x20, 0x00, 0x06, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        reader.frames[0]
    );
    assert_eq!(
        vec![0xFF, 0x86, 0x00, 0x00, 0x05, 0x01, 0x00, 0x09, 0x60, 0x00],
        reader.frames[1]
    );
    assert_eq!(vec![0xFF, 0xB0, 0x00, 0x09, 0x10], reader.frames[2]);
}

#[test]
fn options_select_slot_and_key_type() {
    let (transport, mut session) = connected();
    let options = AccessOptions {
        key_slot: 1,
        key_type: KeyType::B,
    };

    BlockAccess::with_options(&mut session, options)
        .read_block(&key(), 5)
        .unwrap();

    let reader = transport.reader();
    assert_eq!(0x01, reader.frames[0][3]);
    assert_eq!(&[0x05, 0x61, 0x01], &reader.frames[1][7..]);
}

#[test]
fn write_then_read_round_trips_text() {
    let (_transport, mut session) = connected();
    let mut access = BlockAccess::new(&mut session);

    access.write_block(&key(), 4, "HELLO").unwrap();
    let contents = access.read_block(&key(), 4).unwrap();

    assert_eq!("HELLO", contents.text());
    assert_eq!(
        "48 45 4C 4C 4F 00 00 00 00 00 00 00 00 00 00 00",
        contents.hex()
    );
    assert_eq!(
        "HELLO\n[Hex: 48 45 4C 4C 4F 00 00 00 00 00 00 00 00 00 00 00]",
        contents.to_string()
    );
}

#[test]
fn long_text_is_truncated_to_a_block() {
    let (transport, mut session) = connected();

    BlockAccess::new(&mut session)
        .write_block(&key(), 4, "ABCDEFGHIJKLMNOPQRS")
        .unwrap();

    assert_eq!(Some(b"ABCDEFGHIJKLMNOP"), transport.reader().memory.get(&4));
}

#[test]
fn authenticate_failure_is_reported_as_authenticate() {
    let (transport, mut session) = connected();
    transport
        .reader()
        .replies
        .insert(ins::GENERAL_AUTHENTICATE, Ok(vec![0x63, 0x00]));

    let error = BlockAccess::new(&mut session)
        .write_block(&key(), 4, "HELLO")
        .unwrap_err();

    assert_eq!(
        AccessError {
            stage: Stage::Authenticate,
            source: Error::Status(StatusWord(0x63, 0x00)),
        },
        error
    );
    assert_eq!(-2, error.stage.code());
    assert_eq!(
        vec![ins::LOAD_KEY, ins::GENERAL_AUTHENTICATE],
        transport.reader().instructions()
    );
}

#[test]
fn read_stops_after_failed_authentication() {
    let (transport, mut session) = connected();
    transport.reader().locked.insert(4);

    let error = BlockAccess::new(&mut session)
        .read_block(&key(), 4)
        .unwrap_err();

    assert_eq!(Stage::Authenticate, error.stage);
    assert!(!transport
        .reader()
        .instructions()
        .contains(&ins::READ_BINARY));
}

#[test]
fn unsupported_key_slot_is_distinguished() {
    let (transport, mut session) = connected();
    transport
        .reader()
        .replies
        .insert(ins::LOAD_KEY, Ok(vec![0x69, 0x86]));

    let error = BlockAccess::new(&mut session)
        .read_block(&key(), 4)
        .unwrap_err();

    assert_eq!(Stage::LoadKey, error.stage);
    assert_eq!(Error::NotSupported(StatusWord::NOT_SUPPORTED), error.source);
    assert_eq!(vec![ins::LOAD_KEY], transport.reader().instructions());
}

#[test]
fn load_key_failure_is_code_minus_1() {
    let (transport, mut session) = connected();
    transport
        .reader()
        .replies
        .insert(ins::LOAD_KEY, Ok(vec![0x63, 0x00]));

    let error = BlockAccess::new(&mut session)
        .write_block(&key(), 4, "HELLO")
        .unwrap_err();

    assert_eq!(Stage::LoadKey, error.stage);
    assert_eq!(-1, error.stage.code());
}

#[test]
fn transmit_failure_is_code_minus_3() {
    let (transport, mut session) = connected();
    let removed = TransportError::new(0x8010_0069, "Card was removed");
    transport
        .reader()
        .replies
        .insert(ins::UPDATE_BINARY, Err(removed.clone()));

    let error = BlockAccess::new(&mut session)
        .write_block(&key(), 4, "HELLO")
        .unwrap_err();

    assert_eq!(Stage::Transmit, error.stage);
    assert_eq!(-3, error.stage.code());
    assert_eq!(Error::Subsystem(removed), error.source);
}

#[test]
fn write_status_failure_is_code_minus_4() {
    let (transport, mut session) = connected();
    transport
        .reader()
        .replies
        .insert(ins::UPDATE_BINARY, Ok(vec![0x65, 0x81]));

    let error = BlockAccess::new(&mut session)
        .write_block(&key(), 4, "HELLO")
        .unwrap_err();

    assert_eq!(Stage::Status, error.stage);
    assert_eq!(-4, error.stage.code());
    assert_eq!(Error::Status(StatusWord(0x65, 0x81)), error.source);
}

#[test]
fn short_read_response_is_a_status_failure() {
    let (transport, mut session) = connected();
    transport
        .reader()
        .replies
        .insert(ins::READ_BINARY, Ok(vec![0x90]));

    let error = BlockAccess::new(&mut session)
        .read_block(&key(), 4)
        .unwrap_err();

    assert_eq!(Stage::Status, error.stage);
    assert_eq!(Error::MalformedResponse(1), error.source);
}

#[test]
fn not_connected_fails_before_transmitting() {
    let transport = MockTransport::with_readers(&["Reader1"]);
    let mut session = Session::new(transport.clone());

    let error = BlockAccess::new(&mut session)
        .write_block(&key(), 4, "HELLO")
        .unwrap_err();

    assert_eq!(Stage::LoadKey, error.stage);
    assert_eq!(Error::NotConnected, error.source);
    assert!(transport.reader().frames.is_empty());
}

#[test]
fn primitives_take_caller_chosen_parameters() {
    let (transport, mut session) = connected();
    let mut access = BlockAccess::new(&mut session);

    access.load_key(&key(), 1).unwrap();
    access.authenticate(7, KeyType::B, 1).unwrap();
    let bytes = access.read_binary(7, 0x10).unwrap();

    assert_eq!(vec![0u8; 16], bytes);
    let reader = transport.reader();
    assert_eq!(0x01, reader.frames[0][3]);
    assert_eq!(&[0x07, 0x61, 0x01], &reader.frames[1][7..]);
}

#[test]
fn records_skip_sector_trailers() {
    let (transport, mut session) = connected();

    let written = BlockAccess::new(&mut session)
        .write_records(
            &key(),
            6,
            ["Premium Coffee Beans:2", "Organic Green Tea:1", "Maple:3"],
        )
        .unwrap();

    assert_eq!(vec![6, 8, 9], written);
    let reader = transport.reader();
    assert_eq!(Some(b"Premium Coffee B"), reader.memory.get(&6));
    assert!(!reader.memory.contains_key(&7));
}

#[test]
fn records_never_touch_the_manufacturer_block() {
    let (_transport, mut session) = connected();

    let written = BlockAccess::new(&mut session)
        .write_records(&key(), 0, ["a", "b"])
        .unwrap();

    assert_eq!(vec![1, 2], written);
}

#[test]
fn records_stop_at_the_first_failure() {
    let (transport, mut session) = connected();
    transport.reader().locked.insert(5);

    let error = BlockAccess::new(&mut session)
        .write_records(&key(), 4, ["a:1", "b:2", "c:3"])
        .unwrap_err();

    match &error {
        RecordError::Write { block, source, .. } => {
            assert_eq!(5, *block);
            assert_eq!(Stage::Authenticate, source.stage);
        }
        e => panic!("unexpected error: {e}"),
    }
    assert_eq!(&[4], error.written());
    assert!(!transport.reader().memory.contains_key(&6));
}

#[test]
fn records_run_out_of_blocks() {
    let (_transport, mut session) = connected();

    let error = BlockAccess::new(&mut session)
        .write_records(&key(), 253, ["a", "b", "c"])
        .unwrap_err();

    assert_eq!(&[253, 254], error.written());
    assert!(matches!(error, RecordError::OutOfBlocks { .. }));
}
