//! Bounded pool of reusable frame buffers
//!
//! Mirrors the camera driver's fixed frame-buffer count: once every buffer is
//! on loan, `take` fails until one is given back.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// Fixed-capacity pool of byte buffers
pub struct FramePool {
    free_tx: Sender<Vec<u8>>,
    free_rx: Receiver<Vec<u8>>,
    capacity: usize,
}

impl FramePool {
    /// Create a pool of `count` buffers, each preallocated to `buffer_capacity`
    pub fn new(count: usize, buffer_capacity: usize) -> Self {
        let (free_tx, free_rx) = bounded(count);
        for _ in 0..count {
            // Cannot fail: channel capacity equals buffer count
            let _ = free_tx.try_send(Vec::with_capacity(buffer_capacity));
        }
        Self {
            free_tx,
            free_rx,
            capacity: count,
        }
    }

    /// Borrow a free buffer (cleared), `None` if all are on loan
    pub fn take(&self) -> Option<Vec<u8>> {
        self.free_rx.try_recv().ok().map(|mut buf| {
            buf.clear();
            buf
        })
    }

    /// Return a buffer to the pool
    pub fn give_back(&self, buf: Vec<u8>) {
        match self.free_tx.try_send(buf) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("Frame pool already full, dropping returned buffer");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Total number of buffers
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffers currently available
    pub fn available(&self) -> usize {
        self.free_rx.len()
    }
}
