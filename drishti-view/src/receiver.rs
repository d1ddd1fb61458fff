//! UDP receiver for the Drishti IO frame stream.
//!
//! Requests the stream by sending an empty datagram to the camera, then
//! reassembles frames and hands them to the consumer via a bounded
//! crossbeam channel.
//!
//! The camera only accepts a subscriber while it is waiting for one, so
//! the request is repeated every `trigger_interval` while nothing arrives.
//! This covers a lost request and a camera that restarts.
//!
//! # Example
//!
//! ```ignore
//! use drishti_view::receiver::{ReceiverConfig, StreamReceiver};
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//!
//! let config = ReceiverConfig::default();
//! let running = Arc::new(AtomicBool::new(true));
//! let (receiver, frame_rx) = StreamReceiver::new(config, running)?;
//!
//! std::thread::spawn(move || receiver.run());
//!
//! while let Ok(frame) = frame_rx.recv() {
//!     println!("frame: {} bytes", frame.data.len());
//! }
//! ```

use crate::assembler::{AssembledFrame, AssemblerStats, FrameAssembler};
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

/// Channel capacity for frames (small to avoid buffering old frames)
const FRAME_CHANNEL_CAPACITY: usize = 4;

/// Receive buffer, large enough for any UDP datagram
const MAX_DATAGRAM_SIZE: usize = 65536;

/// Configuration for the stream receiver.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Camera stream endpoint
    pub camera_addr: SocketAddr,
    /// Local address to bind (e.g., "0.0.0.0:0")
    pub bind_addr: String,
    /// Chunk size the camera sends with
    pub chunk_size: usize,
    /// Frames larger than this are discarded
    pub max_frame_bytes: usize,
    /// Silence after which the stream request is repeated
    pub trigger_interval: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            camera_addr: SocketAddr::from(([192, 168, 4, 1], 9000)),
            bind_addr: "0.0.0.0:0".to_string(),
            chunk_size: 59192,
            max_frame_bytes: 4 * 1024 * 1024,
            trigger_interval: Duration::from_millis(1000),
        }
    }
}

/// Counters reported when the receiver stops
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiverStats {
    pub datagrams: u64,
    pub bytes: u64,
    /// Datagrams from any address other than the camera
    pub foreign_datagrams: u64,
    pub triggers_sent: u64,
    /// Frames dropped because the consumer was behind
    pub frames_lagged: u64,
    pub assembler: AssemblerStats,
}

/// Receives the chunked frame stream from one camera.
pub struct StreamReceiver {
    socket: UdpSocket,
    config: ReceiverConfig,
    running: Arc<AtomicBool>,
    frame_tx: Sender<AssembledFrame>,
    dropped: Arc<AtomicU64>,
}

impl StreamReceiver {
    /// Bind the local socket.
    ///
    /// Returns the receiver and the channel frames are delivered on.
    pub fn new(
        config: ReceiverConfig,
        running: Arc<AtomicBool>,
    ) -> Result<(Self, Receiver<AssembledFrame>)> {
        let socket = UdpSocket::bind(&config.bind_addr).map_err(|source| Error::Bind {
            address: config.bind_addr.clone(),
            source,
        })?;

        // Timeout doubles as the trigger interval and the shutdown check
        socket.set_read_timeout(Some(config.trigger_interval.max(Duration::from_millis(1))))?;

        let (frame_tx, frame_rx) = bounded(FRAME_CHANNEL_CAPACITY);

        log::info!(
            "Stream receiver bound to {}, camera {}",
            socket.local_addr()?,
            config.camera_addr
        );

        Ok((
            Self {
                socket,
                config,
                running,
                frame_tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            frame_rx,
        ))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Running total of dropped frames (invalid, oversize or lagged),
    /// readable while the receiver runs
    pub fn drop_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }

    /// Run the receiver loop (blocking) until shutdown or the consumer
    /// hangs up.
    pub fn run(self) -> ReceiverStats {
        log::info!("Stream receiver started");

        let mut assembler = FrameAssembler::new(self.config.chunk_size, self.config.max_frame_bytes);
        let mut stats = ReceiverStats::default();
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];

        self.send_trigger(&mut stats);

        'receive: while self.running.load(Ordering::Relaxed) {
            let (len, src) = match self.socket.recv_from(&mut buffer) {
                Ok(result) => result,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    self.send_trigger(&mut stats);
                    continue;
                }
                Err(e) => {
                    log::error!("UDP recv error: {}", e);
                    continue;
                }
            };

            if src != self.config.camera_addr {
                log::trace!("Ignoring {} bytes from {}", len, src);
                stats.foreign_datagrams += 1;
                continue;
            }

            stats.datagrams += 1;
            stats.bytes += len as u64;

            for frame in assembler.push(&buffer[..len]) {
                match self.frame_tx.try_send(frame) {
                    Ok(()) => {}
                    // Consumer is behind: drop this frame, keep the stream live
                    Err(TrySendError::Full(_)) => stats.frames_lagged += 1,
                    Err(TrySendError::Disconnected(_)) => {
                        log::info!("Frame consumer disconnected");
                        break 'receive;
                    }
                }
            }

            let assembled = assembler.stats();
            self.dropped.store(
                assembled.dropped_invalid + assembled.dropped_oversize + stats.frames_lagged,
                Ordering::Relaxed,
            );
        }

        stats.assembler = assembler.stats();
        log::info!(
            "Stream receiver stopped: {} frames, {} invalid, {} lagged",
            stats.assembler.frames,
            stats.assembler.dropped_invalid,
            stats.frames_lagged
        );
        stats
    }

    fn send_trigger(&self, stats: &mut ReceiverStats) {
        if !self.running.load(Ordering::Relaxed) {
            return;
        }
        match self.socket.send_to(&[], self.config.camera_addr) {
            Ok(_) => {
                stats.triggers_sent += 1;
                log::debug!("Requested stream from {}", self.config.camera_addr);
            }
            Err(e) => log::warn!("Stream request to {} failed: {}", self.config.camera_addr, e),
        }
    }
}
