//! Session - one reader and one writer bound to one transport.
//!
//! A [`Session`] is constructed explicitly by the caller and owns both
//! accumulators for its lifetime; nothing is shared between sessions.
//! Handlers receive the session's [`Writer`] as their context, so a
//! handler can reply to a message from inside `feed`.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use sandesh_session::protocol::build_frame;
//! use sandesh_session::transport::RecordingTransport;
//! use sandesh_session::{Result, SendMode, Session, SessionConfig, Writer};
//!
//! let handler = |writer: &mut Writer<RecordingTransport>, payload: Bytes| -> Result<()> {
//!     writer.send_payload(&payload, SendMode::Flush)
//! };
//! let mut session = Session::new(RecordingTransport::new(), handler, SessionConfig::default())
//!     .unwrap();
//!
//! session.feed(&build_frame(b"ping").unwrap()).unwrap();
//! assert_eq!(session.writer().transport().write_count(), 1);
//! ```

use crate::config::SessionConfig;
use crate::error::Result;
use crate::reader::{MessageHandler, Reader, ReaderStats};
use crate::transport::Transport;
use crate::writer::{SendMode, Writer, WriterStats};

/// A framing session over one transport.
pub struct Session<T, H> {
    reader: Reader<H>,
    writer: Writer<T>,
    config: SessionConfig,
}

impl<T, H> Session<T, H>
where
    T: Transport,
    H: MessageHandler<Writer<T>>,
{
    /// Create a session.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` does not validate.
    pub fn new(transport: T, handler: H, config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let writer = Writer::with_config(transport, &config)?;
        let reader = Reader::with_config(handler, &config);

        tracing::debug!(
            max_send_buf_size = config.max_send_buf_size,
            max_frame_len = ?config.max_frame_len,
            "session created"
        );

        Ok(Self {
            reader,
            writer,
            config,
        })
    }

    /// Feed inbound bytes, dispatching every completed message to the handler.
    ///
    /// Returns the number of messages dispatched.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<usize> {
        self.reader.feed(&mut self.writer, chunk)
    }

    /// Send an already-framed message.
    pub fn send(&mut self, frame: &[u8], mode: SendMode) -> Result<()> {
        self.writer.send(frame, mode)
    }

    /// Send a framed message, holding it until the flush threshold.
    pub fn send_opportunistic(&mut self, frame: &[u8]) -> Result<()> {
        self.writer.send_opportunistic(frame)
    }

    /// Send a framed message and flush everything pending.
    pub fn send_flush(&mut self, frame: &[u8]) -> Result<()> {
        self.writer.send_flush(frame)
    }

    /// Frame `payload` and send it.
    pub fn send_payload(&mut self, payload: &[u8], mode: SendMode) -> Result<()> {
        self.writer.send_payload(payload, mode)
    }

    /// Write out anything pending.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()
    }
}

impl<T, H> Session<T, H> {
    /// Bytes waiting in the outbound pending buffer.
    pub fn pending_len(&self) -> usize {
        self.writer.pending_len()
    }

    /// Bytes received but not yet resolved into messages.
    pub fn buffered_len(&self) -> usize {
        self.reader.buffered_len()
    }

    /// Inbound counters.
    pub fn reader_stats(&self) -> ReaderStats {
        self.reader.stats()
    }

    /// Outbound counters.
    pub fn writer_stats(&self) -> WriterStats {
        self.writer.stats()
    }

    /// Get a reference to the reader.
    pub fn reader(&self) -> &Reader<H> {
        &self.reader
    }

    /// Get a mutable reference to the reader.
    pub fn reader_mut(&mut self) -> &mut Reader<H> {
        &mut self.reader
    }

    /// Get a reference to the writer.
    pub fn writer(&self) -> &Writer<T> {
        &self.writer
    }

    /// Get a mutable reference to the writer.
    pub fn writer_mut(&mut self) -> &mut Writer<T> {
        &mut self.writer
    }

    /// Get the session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Split the session into its reader and writer.
    pub fn into_parts(self) -> (Reader<H>, Writer<T>) {
        (self.reader, self.writer)
    }
}
