//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` as the accumulator. Implements a state machine
//! for handling fragmented frames:
//! - `AwaitingHeader`: fewer than 29 bytes buffered, length unknown
//! - `AwaitingBody`: open tag parsed, waiting until the declared total is buffered
//!
//! A framing error poisons the buffer: the byte stream can no longer be
//! trusted and every later push fails with `Desynchronized` until `clear()`.
//!
//! # Example
//!
//! ```
//! use sandesh_session::protocol::{build_frame, FrameBuffer};
//!
//! let mut buffer = FrameBuffer::new();
//! let bytes = build_frame(b"payload").unwrap();
//!
//! assert!(buffer.push(&bytes[..5]).unwrap().is_empty());
//! let frames = buffer.push(&bytes[5..]).unwrap();
//! assert_eq!(frames[0].payload(), b"payload");
//! ```

use super::wire_format::{extract_payload, parse_declared_length, validate_trailer, HEADER_LEN};
use super::Frame;
use crate::error::{Result, SessionError};
use bytes::BytesMut;

/// Default initial accumulator capacity.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// State machine for frame parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Waiting for a complete open tag.
    AwaitingHeader,
    /// Open tag parsed; the declared length stays cached until the frame is drained.
    AwaitingBody { declared_len: usize },
    /// A framing error was seen; nothing more is parsed.
    Poisoned,
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// Frames are kept whole in the accumulator until complete, then split off
/// and frozen so the payload handed out never aliases the live buffer.
pub struct FrameBuffer {
    /// Received bytes not yet resolved into complete frames.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
    /// Optional cap on the declared frame length.
    max_frame_len: Option<usize>,
}

impl FrameBuffer {
    /// Create a new frame buffer with no cap on declared frame length.
    pub fn new() -> Self {
        Self::with_capacity_and_max_frame(DEFAULT_BUFFER_CAPACITY, None)
    }

    /// Create a new frame buffer rejecting frames declared longer than `max_frame_len`.
    pub fn with_max_frame(max_frame_len: usize) -> Self {
        Self::with_capacity_and_max_frame(DEFAULT_BUFFER_CAPACITY, Some(max_frame_len))
    }

    /// Create a new frame buffer with custom capacity and optional cap.
    pub fn with_capacity_and_max_frame(capacity: usize, max_frame_len: Option<usize>) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            state: State::AwaitingHeader,
            max_frame_len,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Returns the complete frames in arrival order (possibly none). Partial
    /// data is retained for the next push.
    ///
    /// # Errors
    ///
    /// Returns a framing error if an open tag or close literal is malformed,
    /// or the declared length is out of range. Frames completed before the
    /// bad one are lost with the error; use [`extend`](Self::extend) plus
    /// [`next_frame`](Self::next_frame) to observe them individually.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.extend(data)?;

        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// Append data to the accumulator without extracting frames.
    pub fn extend(&mut self, data: &[u8]) -> Result<()> {
        if self.state == State::Poisoned {
            return Err(SessionError::Desynchronized);
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }

    /// Try to extract a single frame from the accumulator.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` on a framing error (the buffer is poisoned afterwards)
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self.try_extract_one() {
            Ok(frame) => Ok(frame),
            Err(e) => {
                if e.is_framing() && self.state != State::Poisoned {
                    tracing::warn!("Inbound framing error, dropping stream: {}", e);
                    self.state = State::Poisoned;
                }
                Err(e)
            }
        }
    }

    fn try_extract_one(&mut self) -> Result<Option<Frame>> {
        match self.state {
            State::Poisoned => Err(SessionError::Desynchronized),

            State::AwaitingHeader => {
                if self.buffer.len() < HEADER_LEN {
                    return Ok(None);
                }

                let declared_len = parse_declared_length(&self.buffer[..HEADER_LEN])?;

                if let Some(max) = self.max_frame_len {
                    if declared_len > max {
                        return Err(SessionError::FrameTooLarge {
                            declared: declared_len,
                            max,
                        });
                    }
                }

                tracing::trace!(declared_len, "frame header parsed");
                self.state = State::AwaitingBody { declared_len };

                // Body may already be buffered
                self.try_extract_one()
            }

            State::AwaitingBody { declared_len } => {
                if self.buffer.len() < declared_len {
                    return Ok(None);
                }

                validate_trailer(&self.buffer[..declared_len], declared_len)?;

                let frame = self.buffer.split_to(declared_len).freeze();
                let payload = extract_payload(&frame, declared_len);

                self.state = State::AwaitingHeader;

                Ok(Some(Frame::new(declared_len, payload)))
            }
        }
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the current frame's open tag has been parsed.
    pub fn is_awaiting_body(&self) -> bool {
        matches!(self.state, State::AwaitingBody { .. })
    }

    /// Whether a framing error has poisoned the buffer.
    pub fn is_poisoned(&self) -> bool {
        self.state == State::Poisoned
    }

    /// Get the configured cap on declared frame length.
    pub fn max_frame_len(&self) -> Option<usize> {
        self.max_frame_len
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::AwaitingHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::AwaitingHeader => "AwaitingHeader",
            State::AwaitingBody { .. } => "AwaitingBody",
            State::Poisoned => "Poisoned",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
