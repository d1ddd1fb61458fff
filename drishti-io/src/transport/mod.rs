//! Datagram transport abstraction
//!
//! The stream loop talks to the network through [`DatagramTransport`] so the
//! rendezvous and chunking logic can be driven by a scripted mock in tests.

use std::io;
use std::net::SocketAddr;

#[cfg(test)]
mod mock;
mod udp;

#[cfg(test)]
pub(crate) use mock::{MockTransport, SendBehavior};
pub use udp::UdpTransport;

/// Connectionless, unreliable datagram socket
pub trait DatagramTransport: Send {
    /// Send one datagram, returns number of bytes the transport accepted
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;

    /// Receive one datagram, returns its length and source address
    ///
    /// Implementations with a read timeout report expiry as `WouldBlock`
    /// or `TimedOut` (see [`is_timeout`]).
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Local address the transport is bound to
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

/// Send failures worth retrying at the same offset after a short wait
///
/// Local buffer exhaustion (ENOMEM, ENOBUFS) clears as the network stack
/// drains its transmit queue.
pub fn is_transient_send_error(err: &io::Error) -> bool {
    if matches!(
        err.kind(),
        io::ErrorKind::OutOfMemory | io::ErrorKind::WouldBlock
    ) {
        return true;
    }
    matches!(err.raw_os_error(), Some(libc::ENOMEM) | Some(libc::ENOBUFS))
}

/// Receive timed out with no datagram
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
