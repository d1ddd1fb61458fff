//! Rendezvous: learn the subscriber's address
//!
//! A viewer requests the stream by sending an **empty** datagram to the
//! stream port. Anything else arriving on the port before that is noise and
//! is discarded unread. No acknowledgement is sent back; the first chunk of
//! the first frame is the reply.
//!
//! ```text
//! viewer                         camera :9000
//!   │ ── "ping" (4 bytes) ──────▶ │  discarded
//!   │ ── "" (0 bytes) ──────────▶ │  subscriber = viewer's source address
//!   │ ◀───────────── chunk 0 ──── │
//! ```

use crate::transport::{DatagramTransport, is_timeout};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Transport address of the single stream recipient
pub type SubscriberAddress = SocketAddr;

/// Receive buffer for rendezvous traffic; payloads are never inspected
const RENDEZVOUS_BUFFER_SIZE: usize = 64;

/// Pause after a receive error so a persistent failure does not spin
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// Block until a zero-length datagram arrives and return its source
///
/// Receive errors are logged and the wait continues. Returns `None` only
/// when `running` is cleared; the transport's read timeout bounds how long
/// that takes to notice.
pub fn await_subscriber<T: DatagramTransport + ?Sized>(
    transport: &T,
    running: &AtomicBool,
) -> Option<SubscriberAddress> {
    let mut buf = [0u8; RENDEZVOUS_BUFFER_SIZE];

    while running.load(Ordering::Relaxed) {
        match transport.recv_from(&mut buf) {
            Ok((0, from)) => {
                log::info!("Stream requested by {}", from);
                return Some(from);
            }
            Ok((len, from)) => {
                log::debug!("Discarding {} byte datagram from {}", len, from);
            }
            Err(ref e) if is_timeout(e) => {}
            Err(e) => {
                log::warn!("recvfrom() failed while awaiting subscriber: {}", e);
                thread::sleep(RECV_ERROR_BACKOFF);
            }
        }
    }

    None
}
