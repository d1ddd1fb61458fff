//! Chunked frame transmitter
//!
//! A frame of `L` bytes leaves as `ceil(L / M)` datagrams of at most `M`
//! payload bytes each, sent in order to the subscriber:
//!
//! ```text
//! frame (150000 bytes, M = 59192)
//! ┌───────────────┬───────────────┬──────────┐
//! │ 0..59192      │ 59192..118384 │ ..150000 │
//! └───────────────┴───────────────┴──────────┘
//!    datagram 1      datagram 2     datagram 3 (31616 bytes)
//! ```
//!
//! Datagrams carry raw payload only: no sequence number, no frame marker.
//! A receiver must know `M` (and the payload format) to find frame
//! boundaries, and any loss or reordering corrupts the frame.
//!
//! # Send failures
//!
//! | Result of `send_to` | Action |
//! |---------------------|--------|
//! | `n` bytes, chunk not finished | resend the rest of the chunk |
//! | 0 bytes | wait `backoff`, retry same offset |
//! | ENOMEM / ENOBUFS | wait `backoff`, retry same offset |
//! | any other error | abandon the rest of this frame |

use crate::transport::{DatagramTransport, is_transient_send_error};
use std::io;
use std::net::SocketAddr;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// How a frame transmission ended
#[derive(Debug)]
pub enum FrameOutcome {
    /// Every byte was accepted by the transport
    Delivered,
    /// A non-transient send error stopped the frame
    Abandoned(io::Error),
    /// Shutdown was requested during a backoff wait
    Cancelled,
}

/// Result of sending one frame
#[derive(Debug)]
pub struct FrameReport {
    pub outcome: FrameOutcome,
    /// Chunks fully handed to the transport
    pub chunks_sent: usize,
    /// Payload bytes accepted by the transport
    pub bytes_sent: usize,
    /// Backoff waits (zero-byte sends and transient errors)
    pub transient_retries: usize,
}

impl FrameReport {
    fn new() -> Self {
        Self {
            outcome: FrameOutcome::Delivered,
            chunks_sent: 0,
            bytes_sent: 0,
            transient_retries: 0,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self.outcome, FrameOutcome::Delivered)
    }
}

/// Byte ranges of each chunk for a frame of `len` bytes
///
/// All chunks are `max_chunk` long except possibly the last. `len == 0`
/// yields no chunks.
pub fn chunk_ranges(len: usize, max_chunk: usize) -> impl Iterator<Item = Range<usize>> {
    debug_assert!(max_chunk > 0);
    (0..len)
        .step_by(max_chunk.max(1))
        .map(move |start| start..(start + max_chunk).min(len))
}

/// Number of datagrams needed for `len` bytes
pub fn chunk_count(len: usize, max_chunk: usize) -> usize {
    len.div_ceil(max_chunk)
}

/// Splits frames into datagrams and pushes them through a transport
#[derive(Debug, Clone)]
pub struct ChunkedTransmitter {
    max_chunk: usize,
    backoff: Duration,
}

impl ChunkedTransmitter {
    /// # Arguments
    /// * `max_chunk` - Payload bytes per datagram (must be > 0)
    /// * `backoff` - Wait before retrying a transient send failure
    ///
    /// # Panics
    /// If `max_chunk` is zero. [`Config::validate`](crate::config::Config::validate)
    /// rejects such a configuration before a stream is started.
    pub fn new(max_chunk: usize, backoff: Duration) -> Self {
        assert!(max_chunk > 0, "chunk size must be non-zero");
        Self { max_chunk, backoff }
    }

    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    /// Send `frame` to `peer` as a sequence of chunks
    ///
    /// Each chunk is flushed completely before the next one starts. Returns
    /// after the last chunk, after a non-transient error, or when `running`
    /// is cleared while backing off.
    pub fn send_frame<T: DatagramTransport + ?Sized>(
        &self,
        transport: &T,
        frame: &[u8],
        peer: SocketAddr,
        running: &AtomicBool,
    ) -> FrameReport {
        let mut report = FrameReport::new();

        for chunk in chunk_ranges(frame.len(), self.max_chunk) {
            let mut offset = chunk.start;

            while offset < chunk.end {
                match transport.send_to(&frame[offset..chunk.end], peer) {
                    Ok(0) => {
                        log::trace!("sendto() accepted 0 bytes at offset {}", offset);
                        report.transient_retries += 1;
                        if !self.back_off(running) {
                            report.outcome = FrameOutcome::Cancelled;
                            return report;
                        }
                    }
                    Ok(n) => {
                        let n = n.min(chunk.end - offset);
                        offset += n;
                        report.bytes_sent += n;
                    }
                    Err(e) if is_transient_send_error(&e) => {
                        log::debug!("sendto() transient failure at offset {}: {}", offset, e);
                        report.transient_retries += 1;
                        if !self.back_off(running) {
                            report.outcome = FrameOutcome::Cancelled;
                            return report;
                        }
                    }
                    Err(e) => {
                        report.outcome = FrameOutcome::Abandoned(e);
                        return report;
                    }
                }
            }

            report.chunks_sent += 1;
        }

        report
    }

    /// Sleep for the backoff interval; false if shutdown was requested
    fn back_off(&self, running: &AtomicBool) -> bool {
        if !running.load(Ordering::Relaxed) {
            return false;
        }
        thread::sleep(self.backoff);
        running.load(Ordering::Relaxed)
    }
}
