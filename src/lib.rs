//! # sandesh-session
//!
//! Session-level framing for the Sandesh telemetry protocol.
//!
//! Every message travels in a self-describing envelope whose open tag
//! carries the total frame length:
//!
//! ```text
//! <sandesh length="0000000045">payload</sandesh>
//! ```
//!
//! ## Architecture
//!
//! - **Receive side** ([`Reader`]): reassembles arbitrarily fragmented
//!   inbound chunks and dispatches each payload exactly once, in order
//! - **Send side** ([`Writer`]): coalesces framed messages into fewer
//!   transport writes, bounded by `max_send_buf_size`
//! - **Session** ([`Session`]): one reader, one writer, one transport
//!
//! ## Example
//!
//! ```
//! use bytes::Bytes;
//! use sandesh_session::protocol::build_frame;
//! use sandesh_session::transport::RecordingTransport;
//! use sandesh_session::{Result, Session, SessionConfig, Writer};
//!
//! let mut seen = Vec::new();
//! let handler = |_: &mut Writer<RecordingTransport>, payload: Bytes| -> Result<()> {
//!     seen.push(payload);
//!     Ok(())
//! };
//!
//! let config = SessionConfig::default().max_send_buf_size(4096);
//! let mut session = Session::new(RecordingTransport::new(), handler, config).unwrap();
//!
//! let bytes = build_frame(b"<uve/>").unwrap();
//! session.feed(&bytes[..3]).unwrap();
//! session.feed(&bytes[3..]).unwrap();
//! drop(session);
//! assert_eq!(&seen[0][..], b"<uve/>");
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod reader;
pub mod session;
pub mod transport;
pub mod writer;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use reader::{MessageHandler, Reader};
pub use session::Session;
pub use writer::{SendMode, Writer};
