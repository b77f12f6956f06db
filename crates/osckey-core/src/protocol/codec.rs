//! Binary codec for OSC 1.0 packets.
//!
//! Wire format of a message:
//! ```text
//! [address: OSC-string][type tags: OSC-string starting with ','][arguments...]
//! ```
//! Wire format of a bundle:
//! ```text
//! ["#bundle": OSC-string][timetag: u64][size: i32][element: size bytes]...
//! ```
//! An OSC-string is NUL-terminated and padded with NULs to a multiple of 4
//! bytes.  All multi-byte numbers are big-endian.

use tracing::trace;

use crate::protocol::messages::{OscArg, OscMessage, OscPacket, BUNDLE_TAG};
use thiserror::Error;

/// Bundles nested deeper than this are rejected instead of recursed into.
pub const MAX_BUNDLE_DEPTH: usize = 8;

/// Errors that can occur while decoding an OSC packet.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice ended before a field was complete.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The packet does not start with `/` or `#bundle`.
    #[error("invalid address pattern: {0:?}")]
    InvalidAddress(String),

    /// The type tag string names a type this decoder does not understand.
    #[error("unknown type tag: {0:?}")]
    UnknownTypeTag(char),

    /// A string, blob size, or bundle element could not be parsed.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A bundle element declares more bytes than the bundle contains.
    #[error("bundle element length mismatch: declared {declared}, available is {available}")]
    ElementLengthMismatch { declared: usize, available: usize },

    /// Bundles are nested deeper than [`MAX_BUNDLE_DEPTH`].
    #[error("bundle nesting too deep")]
    NestingTooDeep,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Decodes one OSC packet occupying all of `bytes` (one UDP datagram).
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed.
///
/// # Examples
///
/// ```rust
/// use osckey_core::protocol::{decode_packet, encode_message};
/// use osckey_core::protocol::messages::{OscArg, OscMessage, OscPacket};
///
/// let msg = OscMessage::new("/key", vec![OscArg::Int(3)]);
/// let bytes = encode_message(&msg);
/// assert_eq!(decode_packet(&bytes).unwrap(), OscPacket::Message(msg));
/// ```
pub fn decode_packet(bytes: &[u8]) -> Result<OscPacket, ProtocolError> {
    decode_at_depth(bytes, 0)
}

/// Encodes an [`OscMessage`] into its wire representation.
pub fn encode_message(msg: &OscMessage) -> Vec<u8> {
    let mut buf = Vec::with_capacity(msg.address.len() + 8 + msg.args.len() * 8);
    write_string(&mut buf, &msg.address);

    let mut tags = String::with_capacity(msg.args.len() + 1);
    tags.push(',');
    tags.extend(msg.args.iter().map(OscArg::type_tag));
    write_string(&mut buf, &tags);

    for arg in &msg.args {
        match arg {
            OscArg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Float(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::String(s) => write_string(&mut buf, s),
            OscArg::Blob(b) => {
                buf.extend_from_slice(&(b.len() as i32).to_be_bytes());
                buf.extend_from_slice(b);
                pad_to_four(&mut buf);
            }
            OscArg::Long(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Double(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Time(v) => buf.extend_from_slice(&v.to_be_bytes()),
            OscArg::Bool(_) | OscArg::Nil | OscArg::Impulse => {}
        }
    }
    buf
}

/// Encodes an [`OscPacket`] (message or bundle) into its wire representation.
pub fn encode_packet(packet: &OscPacket) -> Vec<u8> {
    match packet {
        OscPacket::Message(msg) => encode_message(msg),
        OscPacket::Bundle { timetag, content } => {
            let mut buf = Vec::new();
            write_string(&mut buf, BUNDLE_TAG);
            buf.extend_from_slice(&timetag.to_be_bytes());
            for element in content {
                let bytes = encode_packet(element);
                buf.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
                buf.extend_from_slice(&bytes);
            }
            buf
        }
    }
}

// ── Decoding ──────────────────────────────────────────────────────────────────

fn decode_at_depth(bytes: &[u8], depth: usize) -> Result<OscPacket, ProtocolError> {
    if bytes.is_empty() {
        return Err(ProtocolError::InsufficientData { needed: 4, available: 0 });
    }
    match bytes[0] {
        b'/' => decode_message(bytes).map(OscPacket::Message),
        b'#' => decode_bundle(bytes, depth),
        _ => {
            let mut reader = Reader::new(bytes);
            let shown = reader.read_string().unwrap_or_else(|_| String::from("<binary>"));
            Err(ProtocolError::InvalidAddress(shown))
        }
    }
}

fn decode_message(bytes: &[u8]) -> Result<OscMessage, ProtocolError> {
    let mut reader = Reader::new(bytes);
    let address = reader.read_string()?;

    // Very old senders omit the type tag string entirely; treat that as "no args".
    if reader.remaining() == 0 {
        return Ok(OscMessage { address, args: Vec::new() });
    }

    let tags = reader.read_string()?;
    let tags = tags
        .strip_prefix(',')
        .ok_or_else(|| ProtocolError::MalformedPayload(format!("type tag string {tags:?} must start with ','")))?;

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => OscArg::Int(i32::from_be_bytes(reader.read_array()?)),
            'f' => OscArg::Float(f32::from_be_bytes(reader.read_array()?)),
            's' | 'S' => OscArg::String(reader.read_string()?),
            'b' => OscArg::Blob(reader.read_blob()?),
            'h' => OscArg::Long(i64::from_be_bytes(reader.read_array()?)),
            't' => OscArg::Time(u64::from_be_bytes(reader.read_array()?)),
            'd' => OscArg::Double(f64::from_be_bytes(reader.read_array()?)),
            'T' => OscArg::Bool(true),
            'F' => OscArg::Bool(false),
            'N' => OscArg::Nil,
            'I' => OscArg::Impulse,
            other => return Err(ProtocolError::UnknownTypeTag(other)),
        };
        args.push(arg);
    }
    Ok(OscMessage { address, args })
}

fn decode_bundle(bytes: &[u8], depth: usize) -> Result<OscPacket, ProtocolError> {
    if depth >= MAX_BUNDLE_DEPTH {
        return Err(ProtocolError::NestingTooDeep);
    }
    let mut reader = Reader::new(bytes);
    let tag = reader.read_string()?;
    if tag != BUNDLE_TAG {
        return Err(ProtocolError::InvalidAddress(tag));
    }
    let timetag = u64::from_be_bytes(reader.read_array()?);

    let mut content = Vec::new();
    while reader.remaining() > 0 {
        let size = i32::from_be_bytes(reader.read_array()?);
        let size = usize::try_from(size)
            .map_err(|_| ProtocolError::MalformedPayload(format!("negative bundle element size {size}")))?;
        if size > reader.remaining() {
            return Err(ProtocolError::ElementLengthMismatch {
                declared: size,
                available: reader.remaining(),
            });
        }
        let element = reader.take(size)?;
        content.push(decode_at_depth(element, depth + 1)?);
    }
    trace!(elements = content.len(), depth, "decoded OSC bundle");
    Ok(OscPacket::Bundle { timetag, content })
}

/// Cursor over a datagram that enforces OSC's 4-byte alignment.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if n > self.remaining() {
            return Err(ProtocolError::InsufficientData {
                needed: self.pos + n,
                available: self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_string(&mut self) -> Result<String, ProtocolError> {
        let rest = &self.bytes[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| ProtocolError::MalformedPayload("unterminated string".to_string()))?;
        let s = std::str::from_utf8(&rest[..nul])
            .map_err(|e| ProtocolError::MalformedPayload(format!("string is not UTF-8: {e}")))?
            .to_string();
        self.take(padded_len(nul + 1))?;
        Ok(s)
    }

    fn read_blob(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let len = i32::from_be_bytes(self.read_array()?);
        let len = usize::try_from(len)
            .map_err(|_| ProtocolError::MalformedPayload(format!("negative blob size {len}")))?;
        let data = self.take(len)?.to_vec();
        self.take(padded_len(len) - len)?;
        Ok(data)
    }
}

// ── Encoding helpers ──────────────────────────────────────────────────────────

fn padded_len(n: usize) -> usize {
    (n + 3) & !3
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    pad_to_four(buf);
}

fn pad_to_four(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::TIMETAG_IMMEDIATE;

    #[test]
    fn test_encode_message_pads_address_and_tags_to_four_bytes() {
        // Arrange
        let msg = OscMessage::new("/key", vec![OscArg::Int(3)]);

        // Act
        let bytes = encode_message(&msg);

        // Assert – "/key\0\0\0\0" ",i\0\0" then the big-endian int
        assert_eq!(
            bytes,
            vec![b'/', b'k', b'e', b'y', 0, 0, 0, 0, b',', b'i', 0, 0, 0, 0, 0, 3]
        );
    }

    #[test]
    fn test_decode_known_bytes_from_a_typical_sender() {
        // Arrange – "/enable" with no args, as sent by TouchOSC
        let bytes = [b'/', b'e', b'n', b'a', b'b', b'l', b'e', 0, b',', 0, 0, 0];

        // Act
        let packet = decode_packet(&bytes).unwrap();

        // Assert
        assert_eq!(packet, OscPacket::Message(OscMessage::new("/enable", vec![])));
    }

    #[test]
    fn test_decode_message_without_type_tag_string_has_no_args() {
        let bytes = [b'/', b'k', b'e', b'y', 0, 0, 0, 0];
        let packet = decode_packet(&bytes).unwrap();
        assert_eq!(packet, OscPacket::Message(OscMessage::new("/key", vec![])));
    }

    #[test]
    fn test_decode_all_argument_types() {
        // Arrange
        let msg = OscMessage::new(
            "/mixed",
            vec![
                OscArg::Int(-7),
                OscArg::Float(1.5),
                OscArg::String("hello".into()),
                OscArg::Blob(vec![1, 2, 3, 4, 5]),
                OscArg::Long(1 << 40),
                OscArg::Double(2.25),
                OscArg::Time(TIMETAG_IMMEDIATE),
                OscArg::Bool(true),
                OscArg::Bool(false),
                OscArg::Nil,
                OscArg::Impulse,
            ],
        );

        // Act
        let decoded = decode_packet(&encode_message(&msg)).unwrap();

        // Assert
        assert_eq!(decoded, OscPacket::Message(msg));
    }

    #[test]
    fn test_time_tag_argument_keeps_its_type_tag() {
        // Arrange
        let msg = OscMessage::new("/key", vec![OscArg::Time(0x0001_0000_0000_0002)]);

        // Act
        let bytes = encode_message(&msg);
        let decoded = decode_packet(&bytes).unwrap();

        // Assert: the tag string is ",t" and the value is not turned into 'h'
        assert_eq!(&bytes[8..12], b",t\0\0");
        assert_eq!(decoded, OscPacket::Message(msg));
        assert_eq!(encode_packet(&decoded), bytes);
    }

    #[test]
    fn test_decode_bundle_preserves_element_order() {
        // Arrange
        let packet = OscPacket::Bundle {
            timetag: TIMETAG_IMMEDIATE,
            content: vec![
                OscPacket::Message(OscMessage::new("/enable", vec![])),
                OscPacket::Message(OscMessage::new("/key", vec![OscArg::Int(3)])),
            ],
        };

        // Act
        let decoded = decode_packet(&encode_packet(&packet)).unwrap();

        // Assert
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_decode_empty_datagram_is_insufficient_data() {
        assert_eq!(
            decode_packet(&[]),
            Err(ProtocolError::InsufficientData { needed: 4, available: 0 })
        );
    }

    #[test]
    fn test_decode_rejects_packets_not_starting_with_slash_or_hash() {
        let bytes = [b'k', b'e', b'y', 0];
        assert_eq!(decode_packet(&bytes), Err(ProtocolError::InvalidAddress("key".into())));
    }

    #[test]
    fn test_decode_rejects_unterminated_address() {
        let bytes = [b'/', b'k', b'e', b'y'];
        assert!(matches!(decode_packet(&bytes), Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_type_tag() {
        let bytes = [b'/', b'k', 0, 0, b',', b'x', 0, 0];
        assert_eq!(decode_packet(&bytes), Err(ProtocolError::UnknownTypeTag('x')));
    }

    #[test]
    fn test_decode_rejects_truncated_int_argument() {
        let bytes = [b'/', b'k', 0, 0, b',', b'i', 0, 0, 0, 0];
        assert!(matches!(decode_packet(&bytes), Err(ProtocolError::InsufficientData { .. })));
    }

    #[test]
    fn test_decode_rejects_bundle_element_longer_than_bundle() {
        // Arrange
        let mut bytes = Vec::new();
        write_string(&mut bytes, BUNDLE_TAG);
        bytes.extend_from_slice(&TIMETAG_IMMEDIATE.to_be_bytes());
        bytes.extend_from_slice(&64i32.to_be_bytes());
        bytes.extend_from_slice(&[b'/', b'k', 0, 0]);

        // Act / Assert
        assert_eq!(
            decode_packet(&bytes),
            Err(ProtocolError::ElementLengthMismatch { declared: 64, available: 4 })
        );
    }

    #[test]
    fn test_decode_rejects_excessive_bundle_nesting() {
        // Arrange
        let mut packet = OscPacket::Message(OscMessage::new("/key", vec![OscArg::Int(1)]));
        for _ in 0..=MAX_BUNDLE_DEPTH {
            packet = OscPacket::Bundle { timetag: TIMETAG_IMMEDIATE, content: vec![packet] };
        }

        // Act / Assert
        assert_eq!(decode_packet(&encode_packet(&packet)), Err(ProtocolError::NestingTooDeep));
    }

    #[test]
    fn test_padded_len_rounds_up_to_multiple_of_four() {
        assert_eq!(padded_len(1), 4);
        assert_eq!(padded_len(4), 4);
        assert_eq!(padded_len(5), 8);
    }
}
