//! Frame rate pacing shared by the frame sources

use std::thread;
use std::time::{Duration, Instant};

/// Sleeps until the next frame slot
pub(crate) struct FramePacer {
    interval: Duration,
    next_due: Instant,
}

impl FramePacer {
    /// `fps <= 0` disables pacing, as does a rate whose interval is not a
    /// representable `Duration` (config validation rejects those first)
    pub(crate) fn new(fps: f32) -> Self {
        let interval = if fps > 0.0 {
            Duration::try_from_secs_f32(1.0 / fps).unwrap_or_else(|e| {
                log::warn!("Frame rate {} not usable ({}), pacing disabled", fps, e);
                Duration::ZERO
            })
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            next_due: Instant::now(),
        }
    }

    /// Block until the next slot, then schedule the one after it
    ///
    /// Missed slots are not made up: a slow consumer gets the next frame
    /// immediately, not a burst.
    pub(crate) fn wait(&mut self) {
        let now = Instant::now();
        if self.next_due > now {
            thread::sleep(self.next_due - now);
        }
        self.next_due = self.next_due.max(Instant::now()) + self.interval;
    }
}
