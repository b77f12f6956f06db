//! Protocol module containing OSC packet types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_packet, encode_message, encode_packet, ProtocolError};
pub use messages::*;
