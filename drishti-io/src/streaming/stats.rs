//! Running counters for the stream loop

use super::chunked::{FrameOutcome, FrameReport};
use std::time::Instant;

/// Cumulative stream statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub frames_delivered: u64,
    pub frames_abandoned: u64,
    pub frames_cancelled: u64,
    pub chunks_sent: u64,
    pub bytes_sent: u64,
    pub transient_retries: u64,
    pub acquire_failures: u64,
}

impl StreamStats {
    pub fn record(&mut self, report: &FrameReport) {
        match report.outcome {
            FrameOutcome::Delivered => self.frames_delivered += 1,
            FrameOutcome::Abandoned(_) => self.frames_abandoned += 1,
            FrameOutcome::Cancelled => self.frames_cancelled += 1,
        }
        self.chunks_sent += report.chunks_sent as u64;
        self.bytes_sent += report.bytes_sent as u64;
        self.transient_retries += report.transient_retries as u64;
    }

    pub fn record_acquire_failure(&mut self) {
        self.acquire_failures += 1;
    }

    /// Frames that reached the send stage
    pub fn frames_attempted(&self) -> u64 {
        self.frames_delivered + self.frames_abandoned + self.frames_cancelled
    }
}

/// Logs throughput since the previous report
pub(crate) struct StatsReporter {
    last_report: Instant,
    last: StreamStats,
}

impl StatsReporter {
    pub(crate) fn new() -> Self {
        Self {
            last_report: Instant::now(),
            last: StreamStats::default(),
        }
    }

    pub(crate) fn maybe_log(&mut self, stats: &StreamStats, interval: std::time::Duration) {
        let elapsed = self.last_report.elapsed();
        if elapsed < interval {
            return;
        }

        let secs = elapsed.as_secs_f64();
        let frames = stats.frames_delivered - self.last.frames_delivered;
        let bytes = stats.bytes_sent - self.last.bytes_sent;
        let attempted = stats.frames_attempted();
        let loss = if attempted > 0 {
            (stats.frames_abandoned as f64 / attempted as f64) * 100.0
        } else {
            0.0
        };

        log::info!(
            "Stream: {:.1} fps, {:.1} KB/s | frames={} abandoned={} ({:.1}%) retries={} acquire_failures={}",
            frames as f64 / secs,
            bytes as f64 / secs / 1024.0,
            stats.frames_delivered,
            stats.frames_abandoned,
            loss,
            stats.transient_retries,
            stats.acquire_failures
        );

        self.last = stats.clone();
        self.last_report = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_record_outcomes() {
        let mut stats = StreamStats::default();
        stats.record(&FrameReport {
            outcome: FrameOutcome::Delivered,
            chunks_sent: 3,
            bytes_sent: 150_000,
            transient_retries: 1,
        });
        stats.record(&FrameReport {
            outcome: FrameOutcome::Abandoned(io::Error::from(io::ErrorKind::PermissionDenied)),
            chunks_sent: 1,
            bytes_sent: 59192,
            transient_retries: 0,
        });
        stats.record_acquire_failure();

        assert_eq!(stats.frames_delivered, 1);
        assert_eq!(stats.frames_abandoned, 1);
        assert_eq!(stats.frames_attempted(), 2);
        assert_eq!(stats.chunks_sent, 4);
        assert_eq!(stats.bytes_sent, 209_192);
        assert_eq!(stats.transient_retries, 1);
        assert_eq!(stats.acquire_failures, 1);
    }
}
