//! OSC message and packet types.
//!
//! Messages follow the Open Sound Control 1.0 specification.  A packet is
//! either a single message or a bundle of packets sharing a time tag.

use serde::{Deserialize, Serialize};

/// Bundle marker string that begins every OSC bundle.
pub const BUNDLE_TAG: &str = "#bundle";

/// Time tag meaning "immediately" (the only one this receiver honours).
pub const TIMETAG_IMMEDIATE: u64 = 1;

/// A single typed OSC argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OscArg {
    /// `i`: 32-bit big-endian two's complement integer.
    Int(i32),
    /// `f`: 32-bit big-endian IEEE 754 float.
    Float(f32),
    /// `s`: NUL-terminated ASCII string padded to 4 bytes.
    String(String),
    /// `b`: size-prefixed blob padded to 4 bytes.
    Blob(Vec<u8>),
    /// `h`: 64-bit integer.
    Long(i64),
    /// `d`: 64-bit float.
    Double(f64),
    /// `t`: 64-bit NTP time tag.
    Time(u64),
    /// `T` / `F`: booleans carried in the type tag only.
    Bool(bool),
    /// `N`: nil.
    Nil,
    /// `I`: impulse ("bang").
    Impulse,
}

impl OscArg {
    /// Returns the type tag character for this argument.
    pub fn type_tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Float(_) => 'f',
            OscArg::String(_) => 's',
            OscArg::Blob(_) => 'b',
            OscArg::Long(_) => 'h',
            OscArg::Double(_) => 'd',
            OscArg::Time(_) => 't',
            OscArg::Bool(true) => 'T',
            OscArg::Bool(false) => 'F',
            OscArg::Nil => 'N',
            OscArg::Impulse => 'I',
        }
    }

    /// Interprets a numeric argument as an `i32`, truncating floats.
    ///
    /// Returns `None` for non-numeric arguments and for values outside the
    /// `i32` range.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            OscArg::Int(v) => Some(v),
            OscArg::Long(v) => i32::try_from(v).ok(),
            OscArg::Float(v) if v.is_finite() => float_to_i32(f64::from(v)),
            OscArg::Double(v) if v.is_finite() => float_to_i32(v),
            _ => None,
        }
    }
}

fn float_to_i32(v: f64) -> Option<i32> {
    let t = v.trunc();
    if t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX) {
        Some(t as i32)
    } else {
        None
    }
}

/// A decoded OSC message: an address pattern plus its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    /// Creates a message with the given address and arguments.
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        Self { address: address.into(), args }
    }

    /// Returns the first argument as an `i32`, if it is numeric.
    ///
    /// Trigger identifiers travel as the first argument.  Some senders emit
    /// them as floats, so `f`, `h` and `d` arguments are accepted too.
    pub fn first_int_arg(&self) -> Option<i32> {
        self.args.first().and_then(OscArg::as_i32)
    }
}

/// A decoded OSC packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OscPacket {
    Message(OscMessage),
    Bundle {
        /// NTP-format time tag.  Ignored: bundle contents are delivered at once.
        timetag: u64,
        content: Vec<OscPacket>,
    },
}

impl OscPacket {
    /// Flattens the packet into its messages in wire order.
    ///
    /// Nested bundles are walked depth-first, so the order the sender wrote the
    /// messages in is the order the dispatcher sees them.
    pub fn into_messages(self) -> Vec<OscMessage> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<OscMessage>) {
        match self {
            OscPacket::Message(msg) => out.push(msg),
            OscPacket::Bundle { content, .. } => {
                for packet in content {
                    packet.flatten_into(out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_int_arg_reads_int() {
        let msg = OscMessage::new("/key", vec![OscArg::Int(3)]);
        assert_eq!(msg.first_int_arg(), Some(3));
    }

    #[test]
    fn test_first_int_arg_truncates_float() {
        let msg = OscMessage::new("/key", vec![OscArg::Float(4.9)]);
        assert_eq!(msg.first_int_arg(), Some(4));
    }

    #[test]
    fn test_first_int_arg_rejects_strings_and_missing_args() {
        assert_eq!(OscMessage::new("/key", vec![OscArg::String("3".into())]).first_int_arg(), None);
        assert_eq!(OscMessage::new("/key", vec![]).first_int_arg(), None);
    }

    #[test]
    fn test_as_i32_rejects_out_of_range_and_non_finite_values() {
        assert_eq!(OscArg::Long(i64::from(i32::MAX) + 1).as_i32(), None);
        assert_eq!(OscArg::Double(1e12).as_i32(), None);
        assert_eq!(OscArg::Time(3).as_i32(), None);
        assert_eq!(OscArg::Float(f32::NAN).as_i32(), None);
    }

    #[test]
    fn test_into_messages_flattens_nested_bundles_in_order() {
        // Arrange
        let packet = OscPacket::Bundle {
            timetag: TIMETAG_IMMEDIATE,
            content: vec![
                OscPacket::Message(OscMessage::new("/enable", vec![])),
                OscPacket::Bundle {
                    timetag: TIMETAG_IMMEDIATE,
                    content: vec![OscPacket::Message(OscMessage::new("/key", vec![OscArg::Int(1)]))],
                },
                OscPacket::Message(OscMessage::new("/key", vec![OscArg::Int(2)])),
            ],
        };

        // Act
        let msgs = packet.into_messages();

        // Assert
        let ids: Vec<_> = msgs.iter().map(|m| (m.address.as_str(), m.first_int_arg())).collect();
        assert_eq!(ids, vec![("/enable", None), ("/key", Some(1)), ("/key", Some(2))]);
    }

    #[test]
    fn test_type_tags() {
        assert_eq!(OscArg::Bool(true).type_tag(), 'T');
        assert_eq!(OscArg::Bool(false).type_tag(), 'F');
        assert_eq!(OscArg::Impulse.type_tag(), 'I');
    }
}
