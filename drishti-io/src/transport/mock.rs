//! Mock transport for testing

use super::DatagramTransport;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const EMPTY_RECV_DELAY: Duration = Duration::from_millis(1);

/// Scripted outcome for one `send_to` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendBehavior {
    /// Accept the whole buffer
    Accept,
    /// Accept only the first `n` bytes
    Partial(usize),
    /// Report zero bytes sent without an error
    Zero,
    /// Fail with the given raw OS error code
    Fail(i32),
}

/// Mock transport for unit testing
///
/// Clones share state, so a test can keep a handle while the stream loop
/// owns another.
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

/// One queued `recv_from` result
enum Inbound {
    Datagram(Vec<u8>, SocketAddr),
    Error(io::ErrorKind),
}

struct MockTransportInner {
    local_addr: SocketAddr,
    inbound: VecDeque<Inbound>,
    send_script: VecDeque<SendBehavior>,
    sent: Vec<(Vec<u8>, SocketAddr)>,
    send_calls: usize,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new(local_addr: SocketAddr) -> Self {
        MockTransport {
            inner: Arc::new(Mutex::new(MockTransportInner {
                local_addr,
                inbound: VecDeque::new(),
                send_script: VecDeque::new(),
                sent: Vec::new(),
                send_calls: 0,
            })),
        }
    }

    /// Queue a datagram to be returned by `recv_from`
    pub fn inject_datagram(&self, payload: &[u8], from: SocketAddr) {
        self.inner
            .lock()
            .inbound
            .push_back(Inbound::Datagram(payload.to_vec(), from));
    }

    /// Queue a receive failure, returned in order with injected datagrams
    pub fn inject_recv_error(&self, kind: io::ErrorKind) {
        self.inner.lock().inbound.push_back(Inbound::Error(kind));
    }

    /// Number of queued datagrams and errors not yet received
    pub fn pending_inbound(&self) -> usize {
        self.inner.lock().inbound.len()
    }

    /// Queue outcomes for upcoming `send_to` calls (default is `Accept`)
    pub fn script_sends(&self, behaviors: &[SendBehavior]) {
        self.inner.lock().send_script.extend(behaviors.iter().copied());
    }

    /// Every accepted datagram payload with its destination
    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.inner.lock().sent.clone()
    }

    /// Concatenation of all accepted payload bytes
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.inner
            .lock()
            .sent
            .iter()
            .flat_map(|(payload, _)| payload.iter().copied())
            .collect()
    }

    /// Number of `send_to` calls, including failed ones
    pub fn send_calls(&self) -> usize {
        self.inner.lock().send_calls
    }

    /// Forget recorded sends
    pub fn clear_sent(&self) {
        let mut inner = self.inner.lock();
        inner.sent.clear();
        inner.send_calls = 0;
    }
}

impl DatagramTransport for MockTransport {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.send_calls += 1;

        match inner.send_script.pop_front().unwrap_or(SendBehavior::Accept) {
            SendBehavior::Accept => {
                inner.sent.push((buf.to_vec(), addr));
                Ok(buf.len())
            }
            SendBehavior::Partial(n) => {
                let n = n.min(buf.len());
                inner.sent.push((buf[..n].to_vec(), addr));
                Ok(n)
            }
            SendBehavior::Zero => Ok(0),
            SendBehavior::Fail(code) => Err(io::Error::from_raw_os_error(code)),
        }
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let next = self.inner.lock().inbound.pop_front();
        match next {
            Some(Inbound::Datagram(payload, from)) => {
                // Datagram semantics: excess bytes are truncated
                let n = payload.len().min(buf.len());
                buf[..n].copy_from_slice(&payload[..n]);
                Ok((n, from))
            }
            Some(Inbound::Error(kind)) => Err(io::Error::from(kind)),
            None => {
                // Behave like a socket read timeout, briefly
                thread::sleep(EMPTY_RECV_DELAY);
                Err(io::Error::from(io::ErrorKind::WouldBlock))
            }
        }
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(self.inner.lock().local_addr)
    }
}
