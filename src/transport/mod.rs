//! Transport module - the byte sink behind a session's writer.
//!
//! The framing layer only needs one primitive from a transport: a
//! synchronous `write` of a whole buffer. Partial writes, retries and
//! reconnection are the transport's business.
//!
//! Provides:
//! - [`Transport`] - the write primitive
//! - [`IoTransport`] - adapter over any blocking `std::io::Write`
//! - [`RecordingTransport`] - keeps every write as a separate `Bytes`
//! - [`drive_session`] - async tokio driver for an already connected stream

mod stream;

use std::io::Write;

use bytes::Bytes;

use crate::error::Result;

pub use stream::drive_session;

/// Outbound byte sink used by [`Writer`](crate::writer::Writer).
pub trait Transport {
    /// Write the whole of `buf` as one logical transfer.
    ///
    /// Returns the number of bytes written. The writer does not interpret
    /// the count; a transport that cannot write everything must retry
    /// internally or return an error.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Write an owned, already-frozen batch.
    ///
    /// The writer hands every flush through here. Transports that keep the
    /// bytes around can take ownership instead of copying.
    fn write_bytes(&mut self, buf: Bytes) -> Result<usize> {
        self.write(&buf)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn write_bytes(&mut self, buf: Bytes) -> Result<usize> {
        (**self).write_bytes(buf)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        (**self).write(buf)
    }

    fn write_bytes(&mut self, buf: Bytes) -> Result<usize> {
        (**self).write_bytes(buf)
    }
}

/// Transport over a blocking `std::io::Write` (e.g. `std::net::TcpStream`).
///
/// Uses `write_all` followed by `flush`, so short writes are retried here.
#[derive(Debug)]
pub struct IoTransport<W> {
    inner: W,
}

impl<W: Write> IoTransport<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Get a reference to the wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Get a mutable reference to the wrapped writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Transport for IoTransport<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner.write_all(buf)?;
        self.inner.flush()?;
        Ok(buf.len())
    }
}

/// Transport that records each write as a separate buffer.
///
/// Used as the outbound queue of [`drive_session`] and for inspecting
/// write boundaries.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    writes: Vec<Bytes>,
}

impl RecordingTransport {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes recorded so far, in order.
    pub fn writes(&self) -> &[Bytes] {
        &self.writes
    }

    /// Number of writes recorded so far.
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    /// Total bytes across all recorded writes.
    pub fn total_bytes(&self) -> usize {
        self.writes.iter().map(Bytes::len).sum()
    }

    /// Remove and return all recorded writes.
    pub fn take_writes(&mut self) -> Vec<Bytes> {
        std::mem::take(&mut self.writes)
    }
}

impl Transport for RecordingTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.writes.push(Bytes::copy_from_slice(buf));
        Ok(buf.len())
    }

    fn write_bytes(&mut self, buf: Bytes) -> Result<usize> {
        let len = buf.len();
        self.writes.push(buf);
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_transport_writes_all() {
        let mut transport = IoTransport::new(Vec::new());
        assert_eq!(transport.write(b"abc").unwrap(), 3);
        assert_eq!(transport.write(b"de").unwrap(), 2);
        assert_eq!(transport.into_inner(), b"abcde");
    }

    #[test]
    fn test_io_transport_surfaces_errors() {
        let mut slice = [0u8; 2];
        let mut transport = IoTransport::new(&mut slice[..]);
        let err = transport.write(b"too long").unwrap_err();
        assert!(matches!(err, crate::SessionError::Io(_)));
    }

    #[test]
    fn test_recording_transport() {
        let mut transport = RecordingTransport::new();
        transport.write(b"one").unwrap();
        transport.write(b"three").unwrap();

        assert_eq!(transport.write_count(), 2);
        assert_eq!(transport.total_bytes(), 8);
        assert_eq!(&transport.writes()[1][..], b"three");

        let taken = transport.take_writes();
        assert_eq!(taken.len(), 2);
        assert_eq!(transport.write_count(), 0);
    }

    #[test]
    fn test_recording_transport_keeps_owned_batch() {
        let batch = Bytes::from(b"coalesced".to_vec());
        let mut transport = RecordingTransport::new();
        assert_eq!(transport.write_bytes(batch.clone()).unwrap(), 9);

        assert_eq!(transport.writes()[0].as_ptr(), batch.as_ptr());
    }

    #[test]
    fn test_io_transport_write_bytes_default() {
        let mut transport = IoTransport::new(Vec::new());
        assert_eq!(transport.write_bytes(Bytes::from_static(b"xyz")).unwrap(), 3);
        assert_eq!(transport.into_inner(), b"xyz");
    }

    #[test]
    fn test_transport_through_mut_ref() {
        let mut recorder = RecordingTransport::new();
        {
            let mut by_ref = &mut recorder;
            Transport::write(&mut by_ref, b"x").unwrap();
        }
        assert_eq!(recorder.write_count(), 1);
    }
}
