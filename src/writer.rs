//! Write coalescer for outbound frames.
//!
//! Complete, already-framed messages are appended to a pending buffer and
//! handed to the transport as one write once either the buffer reaches
//! `max_send_buf_size` ([`SendMode::More`]) or the caller asks for an
//! immediate flush ([`SendMode::Flush`]).
//!
//! # Flush rules
//!
//! ```text
//! send(frame, More)  : pending += frame; if pending >= max -> write(pending), pending = []
//! send(frame, Flush) : pending += frame; write(pending), pending = []
//! ```
//!
//! A flush always writes the whole pending buffer as a single unit, even
//! when it exceeds `max_send_buf_size`. Each frame carries its own length,
//! so the peer re-splits a coalesced write without special casing.

use bytes::{Bytes, BytesMut};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::protocol::build_frame_into;
use crate::transport::Transport;

/// How a send interacts with the pending buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// More frames may follow; hold until the size threshold is reached.
    More,
    /// Nothing follows immediately; write everything pending now.
    Flush,
}

/// Counters for outbound traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Transport writes issued.
    pub writes: u64,
    /// Frames accepted by `send`.
    pub frames: u64,
    /// Bytes handed to the transport.
    pub bytes: u64,
}

/// Buffering/coalescing scheduler in front of a [`Transport`].
#[derive(Debug)]
pub struct Writer<T> {
    /// Underlying byte sink.
    transport: T,
    /// Concatenated frames awaiting a single write.
    pending: BytesMut,
    /// Flush threshold for `SendMode::More`.
    max_send_buf_size: usize,
    /// Traffic counters.
    stats: WriterStats,
}

impl<T: Transport> Writer<T> {
    /// Create a writer with the given flush threshold.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `max_send_buf_size` is zero.
    pub fn new(transport: T, max_send_buf_size: usize) -> Result<Self> {
        if max_send_buf_size == 0 {
            return Err(SessionError::InvalidConfig(
                "max_send_buf_size must be positive".to_string(),
            ));
        }
        Ok(Self {
            transport,
            pending: BytesMut::with_capacity(max_send_buf_size),
            max_send_buf_size,
            stats: WriterStats::default(),
        })
    }

    /// Create a writer from a session configuration.
    pub fn with_config(transport: T, config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Self::new(transport, config.max_send_buf_size)
    }

    /// Append a complete frame and flush according to `mode`.
    ///
    /// Issues zero or one transport write.
    pub fn send(&mut self, frame: &[u8], mode: SendMode) -> Result<()> {
        self.pending.extend_from_slice(frame);
        self.commit(mode)
    }

    /// Account for the frame just appended and flush according to `mode`.
    fn commit(&mut self, mode: SendMode) -> Result<()> {
        self.stats.frames += 1;

        let flush = match mode {
            SendMode::Flush => true,
            SendMode::More => self.pending.len() >= self.max_send_buf_size,
        };

        if flush {
            self.write_pending()
        } else {
            tracing::trace!(pending = self.pending.len(), "frame held for coalescing");
            Ok(())
        }
    }

    /// Append a frame; flush only once the pending buffer reaches the threshold.
    #[inline]
    pub fn send_opportunistic(&mut self, frame: &[u8]) -> Result<()> {
        self.send(frame, SendMode::More)
    }

    /// Append a frame and flush everything pending unconditionally.
    #[inline]
    pub fn send_flush(&mut self, frame: &[u8]) -> Result<()> {
        self.send(frame, SendMode::Flush)
    }

    /// Wrap `payload` in an envelope, then send it.
    pub fn send_payload(&mut self, payload: &[u8], mode: SendMode) -> Result<()> {
        build_frame_into(&mut self.pending, payload)?;
        self.commit(mode)
    }

    /// Write out whatever is pending. Does nothing if the buffer is empty.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.write_pending()
    }

    /// Hand the entire pending buffer to the transport as one write.
    ///
    /// The pending buffer is detached before the write is attempted, so it is
    /// empty afterwards whether or not the transport succeeds.
    fn write_pending(&mut self) -> Result<()> {
        let batch: Bytes = self.pending.split().freeze();
        let len = batch.len();

        tracing::trace!(len, "flushing pending buffer");
        self.transport.write_bytes(batch)?;

        self.stats.writes += 1;
        self.stats.bytes += len as u64;
        Ok(())
    }
}

impl<T> Writer<T> {
    /// Number of bytes held in the pending buffer.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Configured flush threshold.
    #[inline]
    pub fn max_send_buf_size(&self) -> usize {
        self.max_send_buf_size
    }

    /// Traffic counters.
    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the writer, returning the transport. Pending bytes are dropped.
    pub fn into_transport(self) -> T {
        self.transport
    }
}
