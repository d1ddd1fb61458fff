//! Drishti IO - camera frame streaming over UDP
//!
//! Streams frames from a camera to exactly one viewer:
//!
//! 1. Bind a UDP socket on the stream port (9000 by default)
//! 2. Wait for an empty datagram; its source becomes the subscriber
//! 3. Forever: acquire a frame, send it as `max_chunk_size` datagrams,
//!    release the frame, yield
//!
//! Frames are sent as raw payload with no framing header. See
//! [`streaming::chunked`] for the wire layout and its limits.

pub mod app;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod streaming;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use crate::core::source::{FrameBuffer, FrameSource};
pub use error::{Error, Result};
pub use streaming::{ChunkedTransmitter, FrameOutcome, StreamLoop, StreamState};
pub use transport::{DatagramTransport, UdpTransport};
