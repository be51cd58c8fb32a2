//! Frame struct and frame builders.
//!
//! A [`Frame`] is what the receive side hands out once a complete envelope
//! has been reassembled. The payload is a `bytes::Bytes` view detached from
//! the accumulator, so it stays valid however the accumulator is mutated
//! afterwards.
//!
//! # Example
//!
//! ```
//! use sandesh_session::protocol::{build_frame, MIN_FRAME_LEN};
//!
//! let bytes = build_frame(b"<uve/>").unwrap();
//! assert_eq!(bytes.len(), MIN_FRAME_LEN + 6);
//! assert!(bytes.starts_with(b"<sandesh length=\"0000000045\">"));
//! assert!(bytes.ends_with(b"</sandesh>"));
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{encode_header, frame_len_for_payload, CLOSE_LITERAL};
use crate::error::Result;

/// A complete reassembled frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Total length declared in the open tag (envelope included).
    pub declared_len: usize,
    /// Payload bytes between the open tag and the close literal.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from its declared length and payload.
    pub fn new(declared_len: usize, payload: Bytes) -> Self {
        Self {
            declared_len,
            payload,
        }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Consume the frame, returning the payload.
    #[inline]
    pub fn into_payload(self) -> Bytes {
        self.payload
    }
}

/// Append a complete frame wrapping `payload` to `buf`.
pub fn build_frame_into(buf: &mut BytesMut, payload: &[u8]) -> Result<()> {
    let total = frame_len_for_payload(payload.len());
    let header = encode_header(total)?;

    buf.reserve(total);
    buf.put_slice(&header);
    buf.put_slice(payload);
    buf.put_slice(CLOSE_LITERAL);
    Ok(())
}

/// Build a complete frame wrapping `payload`.
///
/// # Errors
///
/// Returns `FrameTooLarge` if the total length does not fit the length field.
pub fn build_frame(payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(frame_len_for_payload(payload.len()));
    build_frame_into(&mut buf, payload)?;
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_declared_length, HEADER_LEN, MIN_FRAME_LEN};

    #[test]
    fn test_frame_accessors() {
        let frame = Frame::new(44, Bytes::from_static(b"hello"));
        assert_eq!(frame.payload(), b"hello");
        assert_eq!(frame.payload_len(), 5);
        assert_eq!(frame.into_payload(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn test_build_frame_layout() {
        let bytes = build_frame(b"hello").unwrap();

        assert_eq!(bytes.len(), MIN_FRAME_LEN + 5);
        assert_eq!(parse_declared_length(&bytes).unwrap(), bytes.len());
        assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + 5], b"hello");
        assert!(bytes.ends_with(CLOSE_LITERAL));
    }

    #[test]
    fn test_build_frame_empty_payload() {
        let bytes = build_frame(b"").unwrap();
        assert_eq!(bytes.len(), MIN_FRAME_LEN);
        assert_eq!(&bytes[..], b"<sandesh length=\"0000000039\"></sandesh>");
    }

    #[test]
    fn test_build_frame_into_appends() {
        let mut buf = BytesMut::new();
        build_frame_into(&mut buf, b"a").unwrap();
        build_frame_into(&mut buf, b"bc").unwrap();

        assert_eq!(buf.len(), 2 * MIN_FRAME_LEN + 3);
        let second = &buf[MIN_FRAME_LEN + 1..];
        assert_eq!(parse_declared_length(second).unwrap(), MIN_FRAME_LEN + 2);
    }
}
