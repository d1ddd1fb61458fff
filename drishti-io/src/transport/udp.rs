//! UDP transport endpoint

use super::DatagramTransport;
use crate::error::{Error, Result};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// The stream's UDP socket, bound once at startup
///
/// Owned by the stream worker for its whole lifetime. A read timeout lets
/// blocking receives return periodically so the worker can observe shutdown.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Resolve `address` and bind a UDP socket to it
    ///
    /// # Arguments
    /// * `address` - Bind address, e.g. `"0.0.0.0:9000"`
    /// * `read_timeout` - Receive timeout; zero blocks indefinitely
    pub fn bind(address: &str, read_timeout: Duration) -> Result<Self> {
        let resolved: SocketAddr = address
            .to_socket_addrs()
            .map_err(|e| Error::AddressResolution(format!("{}: {}", address, e)))?
            .next()
            .ok_or_else(|| Error::AddressResolution(format!("{}: no addresses", address)))?;

        let socket = UdpSocket::bind(resolved).map_err(|source| Error::Bind {
            address: address.to_string(),
            source,
        })?;

        let timeout = (!read_timeout.is_zero()).then_some(read_timeout);
        socket.set_read_timeout(timeout)?;

        log::info!("UDP endpoint bound to {}", socket.local_addr()?);

        Ok(Self { socket })
    }
}

impl DatagramTransport for UdpTransport {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.socket.recv_from(buf)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
