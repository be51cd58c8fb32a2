//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the Sandesh session envelope:
//! - Open tag with self-inclusive zero-padded decimal length
//! - Frame buffer for accumulating partial reads
//! - Frame struct and frame builders

mod frame;
mod frame_buffer;
mod wire_format;

pub use frame::{build_frame, build_frame_into, Frame};
pub use frame_buffer::{FrameBuffer, DEFAULT_BUFFER_CAPACITY};
pub use wire_format::{
    encode_header, encode_header_into, extract_payload, frame_len_for_payload,
    parse_declared_length, validate_header, validate_trailer, CLOSE_LEN, CLOSE_LITERAL,
    HEADER_LEN, LENGTH_FIELD_WIDTH, LENGTH_OFFSET, MAX_DECLARED_LEN, MIN_FRAME_LEN, OPEN_PREFIX,
    OPEN_SUFFIX,
};
