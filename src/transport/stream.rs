//! Async driver for a session over a connected tokio stream.
//!
//! The session itself is synchronous; this driver reads chunks from the
//! stream, feeds them through the session, and writes out whatever the
//! session's writer queued, one `write_all` per coalesced write.
//!
//! # Example
//!
//! ```ignore
//! use sandesh_session::transport::{drive_session, RecordingTransport};
//! use sandesh_session::{Session, SessionConfig};
//!
//! let stream = tokio::net::TcpStream::connect("127.0.0.1:8086").await?;
//! let mut session = Session::new(RecordingTransport::new(), handler, SessionConfig::default())?;
//! drive_session(stream, &mut session).await?;
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::RecordingTransport;
use crate::error::{Result, SessionError};
use crate::reader::MessageHandler;
use crate::session::Session;
use crate::writer::Writer;

/// Run `session` over `stream` until the peer closes its side.
///
/// Writes queued by the session (including replies made from the handler)
/// are sent after every chunk. On EOF anything still pending is flushed
/// before returning.
///
/// # Errors
///
/// Returns the first I/O, framing or handler error. Everything the writer
/// accepted before a framing or handler error, including frames held for
/// coalescing, is still sent.
pub async fn drive_session<S, H>(
    mut stream: S,
    session: &mut Session<RecordingTransport, H>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: MessageHandler<Writer<RecordingTransport>>,
{
    let mut buf = vec![0u8; session.config().read_buffer_size];

    // Anything queued before the driver started
    write_queued(&mut stream, session).await?;

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) => {
                tracing::debug!("peer closed stream");
                session.flush()?;
                write_queued(&mut stream, session).await?;
                return Ok(());
            }
            Ok(n) => n,
            Err(e) => return Err(SessionError::Io(e)),
        };

        if let Err(e) = session.feed(&buf[..n]) {
            tracing::error!("Session read error: {}", e);
            // Replies accepted before the failure still go out
            if let Err(flush_err) = session.flush() {
                tracing::warn!("Flush after read error failed: {}", flush_err);
            }
            if let Err(write_err) = write_queued(&mut stream, session).await {
                tracing::warn!("Write after read error failed: {}", write_err);
            }
            return Err(e);
        }

        write_queued(&mut stream, session).await?;
    }
}

async fn write_queued<S, H>(
    stream: &mut S,
    session: &mut Session<RecordingTransport, H>,
) -> Result<()>
where
    S: AsyncWrite + Unpin,
{
    let writes = session.writer_mut().transport_mut().take_writes();
    if writes.is_empty() {
        return Ok(());
    }

    for write in &writes {
        stream.write_all(write).await?;
    }
    stream.flush().await?;
    Ok(())
}
