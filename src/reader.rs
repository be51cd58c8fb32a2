//! Stream reassembler with handler dispatch.
//!
//! [`Reader`] feeds arbitrary inbound chunks into a
//! [`FrameBuffer`](crate::protocol::FrameBuffer) and hands every completed
//! payload to a [`MessageHandler`], synchronously and in arrival order,
//! before `feed` returns.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use sandesh_session::protocol::build_frame;
//! use sandesh_session::reader::Reader;
//! use sandesh_session::Result;
//!
//! let mut received: Vec<Bytes> = Vec::new();
//! let mut reader = Reader::new(|seen: &mut Vec<Bytes>, payload: Bytes| -> Result<()> {
//!     seen.push(payload);
//!     Ok(())
//! });
//!
//! let bytes = build_frame(b"<msg/>").unwrap();
//! reader.feed(&mut received, &bytes[..10]).unwrap();
//! reader.feed(&mut received, &bytes[10..]).unwrap();
//! assert_eq!(&received[0][..], b"<msg/>");
//! ```

use bytes::Bytes;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::protocol::FrameBuffer;

/// Receiver of reassembled payloads.
///
/// `C` is the context passed alongside every payload; a
/// [`Session`](crate::session::Session) passes its writer so handlers can reply.
pub trait MessageHandler<C: ?Sized> {
    /// Handle one payload. The payload is an owned view and may be retained.
    fn on_message(&mut self, ctx: &mut C, payload: Bytes) -> Result<()>;
}

impl<C: ?Sized, F> MessageHandler<C> for F
where
    F: FnMut(&mut C, Bytes) -> Result<()>,
{
    fn on_message(&mut self, ctx: &mut C, payload: Bytes) -> Result<()> {
        self(ctx, payload)
    }
}

/// Counters for inbound traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    /// Payloads dispatched to the handler.
    pub messages: u64,
    /// Bytes received through `feed`.
    pub bytes: u64,
}

/// Receive-side reassembler bound to one handler.
pub struct Reader<H> {
    buffer: FrameBuffer,
    handler: H,
    stats: ReaderStats,
}

impl<H> Reader<H> {
    /// Create a reader with default buffer settings.
    pub fn new(handler: H) -> Self {
        Self {
            buffer: FrameBuffer::new(),
            handler,
            stats: ReaderStats::default(),
        }
    }

    /// Create a reader using the accumulator settings of `config`.
    pub fn with_config(handler: H, config: &SessionConfig) -> Self {
        Self {
            buffer: FrameBuffer::with_capacity_and_max_frame(
                config.recv_buffer_capacity,
                config.max_frame_len,
            ),
            handler,
            stats: ReaderStats::default(),
        }
    }

    /// Append `chunk` and dispatch every frame it completes.
    ///
    /// Returns the number of payloads dispatched by this call.
    ///
    /// # Errors
    ///
    /// - A framing error poisons the reader; see
    ///   [`FrameBuffer`](crate::protocol::FrameBuffer).
    /// - A handler error stops the drain. The frame being handled is already
    ///   consumed; complete frames behind it stay buffered for the next `feed`.
    pub fn feed<C: ?Sized>(&mut self, ctx: &mut C, chunk: &[u8]) -> Result<usize>
    where
        H: MessageHandler<C>,
    {
        self.buffer.extend(chunk)?;
        self.stats.bytes += chunk.len() as u64;

        let mut dispatched = 0;
        while let Some(frame) = self.buffer.next_frame()? {
            tracing::trace!(len = frame.declared_len, "dispatching message");
            self.stats.messages += 1;
            dispatched += 1;
            self.handler.on_message(ctx, frame.into_payload())?;
        }

        if dispatched > 0 {
            tracing::debug!(
                dispatched,
                retained = self.buffer.len(),
                "drained inbound frames"
            );
        }
        Ok(dispatched)
    }

    /// Number of received bytes not yet resolved into frames.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether a framing error has made the inbound stream untrusted.
    pub fn is_desynchronized(&self) -> bool {
        self.buffer.is_poisoned()
    }

    /// Traffic counters.
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Get a reference to the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Get a mutable reference to the handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Drop all buffered bytes and any framing error (e.g. after reconnect).
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Consume the reader, returning the handler.
    pub fn into_handler(self) -> H {
        self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::protocol::{build_frame, HEADER_LEN, MIN_FRAME_LEN};

    /// Handler recording the full frame length of each payload.
    #[derive(Default)]
    struct SizeRecorder {
        sizes: Vec<usize>,
    }

    impl MessageHandler<()> for SizeRecorder {
        fn on_message(&mut self, _ctx: &mut (), payload: Bytes) -> Result<()> {
            self.sizes.push(payload.len() + MIN_FRAME_LEN);
            Ok(())
        }
    }

    fn frame_of(total: usize) -> Bytes {
        build_frame(&vec![b'0'; total - MIN_FRAME_LEN]).unwrap()
    }

    fn stream_of(sizes: &[usize]) -> Vec<u8> {
        sizes.iter().flat_map(|&s| frame_of(s).to_vec()).collect()
    }

    #[test]
    fn test_split_header() {
        let mut reader = Reader::new(SizeRecorder::default());
        let bytes = frame_of(100);

        assert_eq!(reader.feed(&mut (), &bytes[..5]).unwrap(), 0);
        assert!(reader.handler().sizes.is_empty());
        assert_eq!(reader.buffered_len(), 5);

        assert_eq!(reader.feed(&mut (), &bytes[5..]).unwrap(), 1);
        assert_eq!(reader.handler().sizes, vec![100]);
        assert_eq!(reader.buffered_len(), 0);
    }

    #[test]
    fn test_multi_frame_batch() {
        let mut reader = Reader::new(SizeRecorder::default());
        let stream = stream_of(&[80, 101]);
        assert_eq!(stream.len(), 181);

        assert_eq!(reader.feed(&mut (), &stream).unwrap(), 2);
        assert_eq!(reader.handler().sizes, vec![80, 101]);
    }

    #[test]
    fn test_read_msg_segments() {
        let sizes = [100, 400, 80, 110, 70, 80, 100];
        let segments = [
            100 + 60,      // complete msg + start (with header)
            200,           // mid part
            140 + 80 + 10, // end + full msg + start (no header)
            7,             // still no header
            50,            // header but not end
            43,            // end of message
            70,            // complete msg
            80 + 101,      // two complete messages, one byte short of the segment
        ];
        let expected_dispatch = [1, 0, 2, 0, 0, 1, 1, 2];

        let stream = stream_of(&sizes);
        assert_eq!(segments.iter().sum::<usize>(), stream.len() + 1);

        let mut reader = Reader::new(SizeRecorder::default());
        let mut rest = &stream[..];
        for (segment, expected) in segments.iter().zip(expected_dispatch) {
            let take = (*segment).min(rest.len());
            let (chunk, tail) = rest.split_at(take);
            assert_eq!(reader.feed(&mut (), chunk).unwrap(), expected);
            rest = tail;
        }

        assert_eq!(reader.handler().sizes, sizes.to_vec());
        assert_eq!(reader.buffered_len(), 0);
    }

    #[test]
    fn test_completes_one_and_starts_partial_header() {
        let mut reader = Reader::new(SizeRecorder::default());
        let stream = stream_of(&[60, 90]);
        let cut = 60 + HEADER_LEN - 3;

        assert_eq!(reader.feed(&mut (), &stream[..cut]).unwrap(), 1);
        assert_eq!(reader.buffered_len(), HEADER_LEN - 3);
        assert_eq!(reader.feed(&mut (), &stream[cut..]).unwrap(), 1);
        assert_eq!(reader.handler().sizes, vec![60, 90]);
    }

    #[test]
    fn test_closure_handler_with_context() {
        let mut reader = Reader::new(|log: &mut Vec<String>, payload: Bytes| -> Result<()> {
            log.push(String::from_utf8_lossy(&payload).into_owned());
            Ok(())
        });

        let mut log = Vec::new();
        let mut stream = build_frame(b"alpha").unwrap().to_vec();
        stream.extend_from_slice(&build_frame(b"beta").unwrap());

        reader.feed(&mut log, &stream).unwrap();
        assert_eq!(log, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_handler_error_keeps_later_frames() {
        let mut calls = 0;
        let mut reader = Reader::new(|calls: &mut usize, _payload: Bytes| -> Result<()> {
            *calls += 1;
            if *calls == 1 {
                return Err(SessionError::Handler("rejected".to_string()));
            }
            Ok(())
        });

        let stream = stream_of(&[50, 60]);
        let err = reader.feed(&mut calls, &stream).unwrap_err();
        assert!(matches!(err, SessionError::Handler(_)));
        assert_eq!(calls, 1);
        assert_eq!(reader.buffered_len(), 60);

        assert_eq!(reader.feed(&mut calls, &[]).unwrap(), 1);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_framing_error_desynchronizes() {
        let mut reader = Reader::new(SizeRecorder::default());
        let err = reader
            .feed(&mut (), b"<sandesh length=\"00000000x0\">")
            .unwrap_err();
        assert!(err.is_framing());
        assert!(reader.is_desynchronized());

        let err = reader.feed(&mut (), &frame_of(50)).unwrap_err();
        assert!(matches!(err, SessionError::Desynchronized));

        reader.reset();
        assert_eq!(reader.feed(&mut (), &frame_of(50)).unwrap(), 1);
    }

    #[test]
    fn test_stats_and_config() {
        let config = SessionConfig::new().max_frame_len(200);
        let mut reader = Reader::with_config(SizeRecorder::default(), &config);

        reader.feed(&mut (), &stream_of(&[100, 150])).unwrap();
        let stats = reader.stats();
        assert_eq!(stats.messages, 2);
        assert_eq!(stats.bytes, 250);

        let err = reader.feed(&mut (), &frame_of(201)).unwrap_err();
        assert!(matches!(err, SessionError::FrameTooLarge { declared: 201, max: 200 }));
        assert_eq!(reader.into_handler().sizes, vec![100, 150]);
    }
}
