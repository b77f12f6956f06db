//! Integration tests for the osckey-core public API.
//!
//! Raw datagrams are built by hand the way a third-party sender would write
//! them, then decoded, flattened, and resolved against a binding table.

use osckey_core::{
    decode_packet, HidKeyCode, KeyBinding, KeyMap, KeyMapError, OscArg, OscMessage, OscPacket,
    ProtocolError,
};

/// Pads `s` with NULs the way an OSC-string is written on the wire.
fn osc_string(s: &str) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    out.push(0);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

fn int_trigger(address: &str, id: i32) -> Vec<u8> {
    let mut out = osc_string(address);
    out.extend(osc_string(",i"));
    out.extend_from_slice(&id.to_be_bytes());
    out
}

fn bundle(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut out = osc_string("#bundle");
    out.extend_from_slice(&1u64.to_be_bytes());
    for element in elements {
        out.extend_from_slice(&(element.len() as i32).to_be_bytes());
        out.extend_from_slice(element);
    }
    out
}

fn key_map() -> KeyMap {
    KeyMap::from_bindings(vec![
        KeyBinding::new(1, HidKeyCode::from_name("a").unwrap(), "a"),
        KeyBinding::new(2, HidKeyCode::from_name("space").unwrap(), "space"),
    ])
    .unwrap()
}

#[test]
fn test_hand_built_trigger_decodes_and_resolves() {
    // Arrange
    let bytes = int_trigger("/key", 2);

    // Act
    let packet = decode_packet(&bytes).expect("decode must succeed");
    let msgs = packet.into_messages();

    // Assert
    assert_eq!(msgs, vec![OscMessage::new("/key", vec![OscArg::Int(2)])]);
    let id = msgs[0].first_int_arg().unwrap();
    assert_eq!(key_map().resolve(id).unwrap().key_code, HidKeyCode::Space);
}

#[test]
fn test_bundle_of_controls_and_triggers_keeps_wire_order() {
    // Arrange
    let mut enable = osc_string("/enable");
    enable.extend(osc_string(","));
    let bytes = bundle(&[enable, int_trigger("/key", 1), int_trigger("/key", 7)]);

    // Act
    let msgs = decode_packet(&bytes).unwrap().into_messages();

    // Assert
    let addresses: Vec<&str> = msgs.iter().map(|m| m.address.as_str()).collect();
    assert_eq!(addresses, vec!["/enable", "/key", "/key"]);
    let map = key_map();
    assert!(map.resolve(msgs[1].first_int_arg().unwrap()).is_ok());
    assert_eq!(map.resolve(msgs[2].first_int_arg().unwrap()), Err(KeyMapError::NotFound(7)));
}

#[test]
fn test_message_without_type_tags_decodes_with_no_args() {
    // Arrange: OSC 1.0 allows old senders to omit the type tag string.
    let bytes = osc_string("/key");

    // Act
    let packet = decode_packet(&bytes).unwrap();

    // Assert
    assert_eq!(packet, OscPacket::Message(OscMessage::new("/key", vec![])));
}

#[test]
fn test_truncated_int_argument_is_an_error() {
    let mut bytes = int_trigger("/key", 1);
    bytes.truncate(bytes.len() - 2);
    assert!(matches!(
        decode_packet(&bytes),
        Err(ProtocolError::InsufficientData { .. })
    ));
}

#[test]
fn test_garbage_datagram_is_rejected() {
    assert!(decode_packet(b"hello world!").is_err());
    assert!(decode_packet(&[]).is_err());
}
