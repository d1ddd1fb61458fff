//! Stream loop: rendezvous once, then send frames forever
//!
//! ```text
//! AWAITING_SUBSCRIBER ──(empty datagram)──▶ STREAMING
//!                                              │
//!        ┌─────────────────────────────────────┘
//!        ▼
//!   acquire ──none──▶ log, retry immediately
//!        │
//!        ▼
//!   send chunks ──▶ release (always) ──▶ yield ──▶ acquire ...
//! ```
//!
//! The loop runs on one dedicated thread that owns the transport and the
//! frame source. Exactly one frame is on loan at any time, and it goes back
//! to the source whether the send completed, was abandoned, or was
//! cancelled. There is no re-rendezvous: once a subscriber is known it is
//! streamed to until shutdown.

use super::chunked::{ChunkedTransmitter, FrameOutcome, FrameReport};
use super::rendezvous::{SubscriberAddress, await_subscriber};
use super::stats::{StatsReporter, StreamStats};
use crate::config::StreamingConfig;
use crate::core::source::FrameSource;
use crate::error::Result;
use crate::transport::DatagramTransport;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Where the loop is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    AwaitingSubscriber,
    Streaming(SubscriberAddress),
}

/// Single-subscriber frame streamer
pub struct StreamLoop<T, S> {
    transport: T,
    source: S,
    transmitter: ChunkedTransmitter,
    frame_yield: Duration,
    stats_interval: Option<Duration>,
    running: Arc<AtomicBool>,
    state: StreamState,
    stats: StreamStats,
}

impl<T: DatagramTransport, S: FrameSource> StreamLoop<T, S> {
    /// Create a stream loop that owns `transport` and `source`
    ///
    /// # Panics
    /// If `config.max_chunk_size` is zero. Validate the configuration first
    /// (as [`spawn_stream`](crate::app::spawn_stream) does).
    pub fn new(
        transport: T,
        source: S,
        config: &StreamingConfig,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            transport,
            source,
            transmitter: ChunkedTransmitter::new(config.max_chunk_size, config.send_backoff()),
            frame_yield: config.frame_yield(),
            stats_interval: config.stats_interval(),
            running,
            state: StreamState::AwaitingSubscriber,
            stats: StreamStats::default(),
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run until the running flag is cleared
    pub fn run(&mut self) -> Result<()> {
        log::info!(
            "Stream loop started on {} (chunk size {} bytes)",
            self.transport.local_addr()?,
            self.transmitter.max_chunk()
        );

        let Some(peer) = self.rendezvous() else {
            log::info!("Stream loop stopped before a subscriber arrived");
            return Ok(());
        };

        let mut reporter = StatsReporter::new();

        while self.running.load(Ordering::Relaxed) {
            if self.stream_once(peer).is_none() {
                // No frame: retry acquisition right away
                continue;
            }

            if let Some(interval) = self.stats_interval {
                reporter.maybe_log(&self.stats, interval);
            }

            thread::sleep(self.frame_yield);
        }

        log::info!(
            "Stream loop stopped: {} frames delivered, {} abandoned, {} bytes",
            self.stats.frames_delivered,
            self.stats.frames_abandoned,
            self.stats.bytes_sent
        );
        Ok(())
    }

    /// AWAITING_SUBSCRIBER: wait for the empty request datagram
    ///
    /// Skipped if a subscriber is already known.
    pub fn rendezvous(&mut self) -> Option<SubscriberAddress> {
        if let StreamState::Streaming(peer) = self.state {
            return Some(peer);
        }

        log::info!("Waiting for subscriber (send an empty datagram to start)");
        let peer = await_subscriber(&self.transport, &self.running)?;
        self.state = StreamState::Streaming(peer);
        log::info!("Streaming to {}", peer);
        Some(peer)
    }

    /// One STREAMING iteration: acquire, send, release
    ///
    /// Returns `None` if no frame could be acquired.
    pub fn stream_once(&mut self, peer: SubscriberAddress) -> Option<FrameReport> {
        let Some(frame) = self.source.acquire() else {
            log::warn!("Frame acquisition failed, no frame available");
            self.stats.record_acquire_failure();
            return None;
        };

        let report = self
            .transmitter
            .send_frame(&self.transport, frame.as_bytes(), peer, &self.running);

        match &report.outcome {
            FrameOutcome::Delivered => log::trace!(
                "Frame {} sent: {} bytes in {} chunks",
                frame.sequence(),
                report.bytes_sent,
                report.chunks_sent
            ),
            FrameOutcome::Abandoned(e) => log::warn!(
                "sendto() failed, dropping rest of frame {} after {}/{} bytes: {}",
                frame.sequence(),
                report.bytes_sent,
                frame.len(),
                e
            ),
            FrameOutcome::Cancelled => log::debug!(
                "Frame {} cancelled by shutdown after {}/{} bytes",
                frame.sequence(),
                report.bytes_sent,
                frame.len()
            ),
        }

        self.source.release(frame);
        self.stats.record(&report);
        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::FrameBuffer;
    use crate::transport::{MockTransport, SendBehavior};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::net::SocketAddr;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Acquire(u64),
        AcquireFailed,
        Release(u64),
    }

    /// Frame source that serves scripted frames and records every call
    #[derive(Clone)]
    struct ScriptedSource {
        frames: Arc<Mutex<VecDeque<Option<Vec<u8>>>>>,
        events: Arc<Mutex<Vec<Event>>>,
        next_seq: u64,
    }

    impl ScriptedSource {
        fn new(frames: Vec<Option<Vec<u8>>>) -> Self {
            Self {
                frames: Arc::new(Mutex::new(frames.into())),
                events: Arc::new(Mutex::new(Vec::new())),
                next_seq: 0,
            }
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }
    }

    impl FrameSource for ScriptedSource {
        fn acquire(&mut self) -> Option<FrameBuffer> {
            let next = self.frames.lock().pop_front();
            match next {
                Some(Some(data)) => {
                    self.next_seq += 1;
                    self.events.lock().push(Event::Acquire(self.next_seq));
                    Some(FrameBuffer::new(self.next_seq, data))
                }
                Some(None) => {
                    self.events.lock().push(Event::AcquireFailed);
                    None
                }
                None => {
                    // Script exhausted: behave like a camera waiting on the sensor
                    thread::sleep(Duration::from_millis(1));
                    None
                }
            }
        }

        fn release(&mut self, frame: FrameBuffer) {
            self.events.lock().push(Event::Release(frame.sequence()));
        }
    }

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    fn config(max_chunk_size: usize) -> StreamingConfig {
        StreamingConfig {
            max_chunk_size,
            send_backoff_ms: 1,
            frame_yield_ms: 0,
            stats_interval_secs: 0,
        }
    }

    fn stream_loop(
        transport: &MockTransport,
        source: &ScriptedSource,
        max_chunk_size: usize,
    ) -> StreamLoop<MockTransport, ScriptedSource> {
        StreamLoop::new(
            transport.clone(),
            source.clone(),
            &config(max_chunk_size),
            Arc::new(AtomicBool::new(true)),
        )
    }

    #[test]
    fn test_rendezvous_transitions_to_streaming() {
        let transport = MockTransport::new(addr("0.0.0.0:9000"));
        transport.inject_datagram(b"ping", addr("10.0.0.9:1234"));
        transport.inject_datagram(&[], addr("192.168.4.2:31416"));
        let source = ScriptedSource::new(vec![]);

        let mut stream = stream_loop(&transport, &source, 1000);
        assert_eq!(stream.state(), StreamState::AwaitingSubscriber);

        let peer = stream.rendezvous();
        assert_eq!(peer, Some(addr("192.168.4.2:31416")));
        assert_eq!(
            stream.state(),
            StreamState::Streaming(addr("192.168.4.2:31416"))
        );

        // A later empty datagram does not replace the subscriber
        transport.inject_datagram(&[], addr("10.0.0.9:1234"));
        assert_eq!(stream.rendezvous(), Some(addr("192.168.4.2:31416")));
    }

    #[test]
    fn test_every_acquire_is_released_before_next() {
        let transport = MockTransport::new(addr("0.0.0.0:9000"));
        transport.script_sends(&[
            SendBehavior::Accept,
            SendBehavior::Fail(libc::ENETUNREACH),
        ]);
        let source = ScriptedSource::new(vec![
            Some(vec![1u8; 2500]),
            None,
            Some(vec![2u8; 10]),
            Some(Vec::new()),
        ]);
        let mut stream = stream_loop(&transport, &source, 1000);
        let peer = addr("192.168.4.2:31416");

        let first = stream.stream_once(peer).unwrap();
        assert!(matches!(first.outcome, FrameOutcome::Abandoned(_)));
        assert!(stream.stream_once(peer).is_none());
        assert!(stream.stream_once(peer).unwrap().is_delivered());
        let empty = stream.stream_once(peer).unwrap();
        assert!(empty.is_delivered());
        assert_eq!(empty.chunks_sent, 0);

        assert_eq!(
            source.events(),
            vec![
                Event::Acquire(1),
                Event::Release(1),
                Event::AcquireFailed,
                Event::Acquire(2),
                Event::Release(2),
                Event::Acquire(3),
                Event::Release(3),
            ]
        );
    }

    #[test]
    fn test_abandoned_frame_does_not_stop_next_frame() {
        let transport = MockTransport::new(addr("0.0.0.0:9000"));
        // Frame 1: chunk 0 ok, chunk 1 fails hard; chunk 2 must never be sent
        transport.script_sends(&[SendBehavior::Accept, SendBehavior::Fail(libc::EPERM)]);
        let source = ScriptedSource::new(vec![Some(vec![1u8; 300]), Some(vec![2u8; 250])]);
        let mut stream = stream_loop(&transport, &source, 100);
        let peer = addr("192.168.4.2:31416");

        stream.stream_once(peer).unwrap();
        assert_eq!(transport.send_calls(), 2);
        assert_eq!(transport.sent_bytes(), vec![1u8; 100]);

        transport.clear_sent();
        let report = stream.stream_once(peer).unwrap();
        assert!(report.is_delivered());
        assert_eq!(transport.sent_bytes(), vec![2u8; 250]);

        let stats = stream.stats();
        assert_eq!(stats.frames_abandoned, 1);
        assert_eq!(stats.frames_delivered, 1);
        assert_eq!(stats.bytes_sent, 350);
    }

    #[test]
    fn test_run_streams_until_shutdown() {
        let transport = MockTransport::new(addr("0.0.0.0:9000"));
        transport.inject_datagram(&[], addr("192.168.4.2:31416"));

        let frames = (0..5).map(|i| Some(vec![i as u8; 150])).collect();
        let source = ScriptedSource::new(frames);
        let running = Arc::new(AtomicBool::new(true));
        let mut stream =
            StreamLoop::new(transport.clone(), source.clone(), &config(100), Arc::clone(&running));

        let stopper = Arc::clone(&running);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            stopper.store(false, Ordering::Relaxed);
        });

        stream.run().unwrap();
        handle.join().unwrap();

        assert_eq!(stream.stats().frames_delivered, 5);
        assert_eq!(stream.stats().chunks_sent, 10);
        assert!(stream.stats().acquire_failures > 0);
        assert!(
            transport
                .sent()
                .iter()
                .all(|(_, to)| *to == addr("192.168.4.2:31416"))
        );

        let events = source.events();
        let acquired = events
            .iter()
            .filter(|e| matches!(e, Event::Acquire(_)))
            .count();
        let released = events
            .iter()
            .filter(|e| matches!(e, Event::Release(_)))
            .count();
        assert_eq!(acquired, 5);
        assert_eq!(released, 5);
    }

    #[test]
    fn test_run_without_subscriber_exits_on_shutdown() {
        let transport = MockTransport::new(addr("0.0.0.0:9000"));
        let source = ScriptedSource::new(vec![Some(vec![0u8; 10])]);
        let running = Arc::new(AtomicBool::new(false));
        let mut stream = StreamLoop::new(transport.clone(), source.clone(), &config(100), running);

        stream.run().unwrap();

        assert_eq!(stream.state(), StreamState::AwaitingSubscriber);
        assert!(source.events().is_empty());
        assert_eq!(transport.send_calls(), 0);
    }

    #[test]
    fn test_cancelled_frame_is_still_released() {
        let transport = MockTransport::new(addr("0.0.0.0:9000"));
        transport.script_sends(&[SendBehavior::Fail(libc::ENOBUFS)]);
        let source = ScriptedSource::new(vec![Some(vec![0u8; 10])]);
        let running = Arc::new(AtomicBool::new(false));
        let mut stream = StreamLoop::new(transport.clone(), source.clone(), &config(100), running);

        let report = stream.stream_once(addr("192.168.4.2:31416")).unwrap();

        assert!(matches!(report.outcome, FrameOutcome::Cancelled));
        assert_eq!(source.events(), vec![Event::Acquire(1), Event::Release(1)]);
        assert_eq!(stream.stats().frames_cancelled, 1);
    }
}
