//! Wire format encoding and decoding.
//!
//! Every frame is an XML-style envelope whose open tag carries the total
//! frame length (self-inclusive) as a zero-padded decimal attribute:
//! ```text
//! ┌───────────────────┬────────────┬─────┬─────────┬────────────┐
//! │ <sandesh length=" │ 0000000123 │ ">  │ payload │ </sandesh> │
//! │ 17 bytes          │ 10 digits  │ 2 B │ N bytes │ 10 bytes   │
//! └───────────────────┴────────────┴─────┴─────────┴────────────┘
//! ```
//!
//! The literals and the digit width must match the peer bit-for-bit; there
//! is no version negotiation.

use bytes::Bytes;

use crate::error::{Result, SessionError};

/// Literal bytes preceding the length digits.
pub const OPEN_PREFIX: &[u8] = b"<sandesh length=\"";

/// Literal bytes following the length digits.
pub const OPEN_SUFFIX: &[u8] = b"\">";

/// Literal bytes closing every frame.
pub const CLOSE_LITERAL: &[u8] = b"</sandesh>";

/// Number of zero-padded decimal digits in the length field.
pub const LENGTH_FIELD_WIDTH: usize = 10;

/// Offset of the first length digit within the header.
pub const LENGTH_OFFSET: usize = OPEN_PREFIX.len();

/// Size of the open tag, i.e. everything before the payload (29 bytes).
pub const HEADER_LEN: usize = OPEN_PREFIX.len() + LENGTH_FIELD_WIDTH + OPEN_SUFFIX.len();

/// Size of the close literal (10 bytes).
pub const CLOSE_LEN: usize = CLOSE_LITERAL.len();

/// Length of a frame with an empty payload (39 bytes).
pub const MIN_FRAME_LEN: usize = HEADER_LEN + CLOSE_LEN;

/// Largest total length the length field can express.
pub const MAX_DECLARED_LEN: u64 = 9_999_999_999;

/// Total frame length for a payload of `payload_len` bytes.
#[inline]
pub const fn frame_len_for_payload(payload_len: usize) -> usize {
    MIN_FRAME_LEN + payload_len
}

/// Encode the open tag for a frame of `total_len` bytes into `buf`.
///
/// # Errors
///
/// Returns `FrameTooShort` / `FrameTooLarge` when `total_len` cannot be a
/// valid declared length.
///
/// # Panics
///
/// Panics if `buf` is smaller than `HEADER_LEN`.
pub fn encode_header_into(buf: &mut [u8], total_len: usize) -> Result<()> {
    check_declared_range(total_len as u64)?;
    debug_assert!(buf.len() >= HEADER_LEN);

    buf[..LENGTH_OFFSET].copy_from_slice(OPEN_PREFIX);

    let digits = &mut buf[LENGTH_OFFSET..LENGTH_OFFSET + LENGTH_FIELD_WIDTH];
    let mut value = total_len as u64;
    for slot in digits.iter_mut().rev() {
        *slot = b'0' + (value % 10) as u8;
        value /= 10;
    }

    buf[LENGTH_OFFSET + LENGTH_FIELD_WIDTH..HEADER_LEN].copy_from_slice(OPEN_SUFFIX);
    Ok(())
}

/// Encode the open tag for a frame of `total_len` bytes.
///
/// # Example
///
/// ```
/// use sandesh_session::protocol::{encode_header, HEADER_LEN};
///
/// let header = encode_header(100).unwrap();
/// assert_eq!(&header[..], b"<sandesh length=\"0000000100\">");
/// assert_eq!(header.len(), HEADER_LEN);
/// ```
pub fn encode_header(total_len: usize) -> Result<[u8; HEADER_LEN]> {
    let mut buf = [0u8; HEADER_LEN];
    encode_header_into(&mut buf, total_len)?;
    Ok(buf)
}

/// Parse the declared total frame length from an open tag.
///
/// Only the first `HEADER_LEN` bytes of `header` are examined.
///
/// # Example
///
/// ```
/// use sandesh_session::protocol::parse_declared_length;
///
/// let len = parse_declared_length(b"<sandesh length=\"0000000100\">").unwrap();
/// assert_eq!(len, 100);
/// ```
pub fn parse_declared_length(header: &[u8]) -> Result<usize> {
    if header.len() < HEADER_LEN {
        return Err(SessionError::MalformedHeader(format!(
            "need {} header bytes, got {}",
            HEADER_LEN,
            header.len()
        )));
    }
    validate_header(header)?;

    let digits = &header[LENGTH_OFFSET..LENGTH_OFFSET + LENGTH_FIELD_WIDTH];
    let declared = digits
        .iter()
        .fold(0u64, |acc, &d| acc * 10 + u64::from(d - b'0'));

    check_declared_range(declared)?;
    usize::try_from(declared).map_err(|_| SessionError::FrameTooLarge {
        declared: usize::MAX,
        max: usize::MAX,
    })
}

/// Validate the literals and digits of an open tag.
///
/// Checks:
/// - Tag starts with `<sandesh length="`
/// - Exactly `LENGTH_FIELD_WIDTH` ASCII digits follow
/// - Tag ends with `">`
pub fn validate_header(header: &[u8]) -> Result<()> {
    if header.len() < HEADER_LEN {
        return Err(SessionError::MalformedHeader(format!(
            "need {} header bytes, got {}",
            HEADER_LEN,
            header.len()
        )));
    }

    if &header[..LENGTH_OFFSET] != OPEN_PREFIX {
        return Err(SessionError::MalformedHeader(
            "open tag prefix mismatch".to_string(),
        ));
    }

    let digits = &header[LENGTH_OFFSET..LENGTH_OFFSET + LENGTH_FIELD_WIDTH];
    if let Some(pos) = digits.iter().position(|b| !b.is_ascii_digit()) {
        return Err(SessionError::MalformedHeader(format!(
            "non-digit byte 0x{:02x} in length field at offset {}",
            digits[pos],
            LENGTH_OFFSET + pos
        )));
    }

    if &header[LENGTH_OFFSET + LENGTH_FIELD_WIDTH..HEADER_LEN] != OPEN_SUFFIX {
        return Err(SessionError::MalformedHeader(
            "open tag suffix mismatch".to_string(),
        ));
    }

    Ok(())
}

/// Check that a complete frame of `declared` bytes ends with the close literal.
pub fn validate_trailer(frame: &[u8], declared: usize) -> Result<()> {
    if declared < MIN_FRAME_LEN || frame.len() < declared {
        return Err(SessionError::MalformedTrailer { declared });
    }
    if &frame[declared - CLOSE_LEN..declared] != CLOSE_LITERAL {
        return Err(SessionError::MalformedTrailer { declared });
    }
    Ok(())
}

/// Slice the payload out of a complete frame (zero-copy).
///
/// Returns `frame[HEADER_LEN..declared - CLOSE_LEN]` sharing the same
/// underlying allocation.
#[inline]
pub fn extract_payload(frame: &Bytes, declared: usize) -> Bytes {
    debug_assert!(declared >= MIN_FRAME_LEN && frame.len() >= declared);
    frame.slice(HEADER_LEN..declared - CLOSE_LEN)
}

fn check_declared_range(declared: u64) -> Result<()> {
    if declared < MIN_FRAME_LEN as u64 {
        return Err(SessionError::FrameTooShort {
            declared: declared as usize,
            min: MIN_FRAME_LEN,
        });
    }
    if declared > MAX_DECLARED_LEN {
        return Err(SessionError::FrameTooLarge {
            declared: declared.min(usize::MAX as u64) as usize,
            max: MAX_DECLARED_LEN.min(usize::MAX as u64) as usize,
        });
    }
    Ok(())
}
