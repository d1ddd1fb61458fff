//! Synthetic camera for hardware-free streaming
//!
//! Produces JPEG-shaped payloads at a fixed frame rate so the stream and a
//! viewer can be exercised without a sensor:
//!
//! ```text
//! ┌──────────────┬──────────────────────────┬──────────┐
//! │ FF D8 FF     │ random body (no 0xFF)    │ FF D9    │
//! │ SOI marker   │                          │ EOI      │
//! └──────────────┴──────────────────────────┴──────────┘
//! ```
//!
//! The body never contains `0xFF`, so marker scanning on the receiving side
//! cannot be fooled by payload bytes. Frame sizes are drawn uniformly from
//! `[min_frame_bytes, max_frame_bytes]`; when unset they are estimated from
//! the configured resolution and JPEG quality.

use super::FramePacer;
use crate::config::{CameraConfig, MAX_FRAME_BYTES, MockConfig};
use crate::core::pool::FramePool;
use crate::core::source::{FrameBuffer, FrameSource};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// JPEG start-of-image marker (plus first byte of the next segment)
pub const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];
/// JPEG end-of-image marker
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

const MIN_FRAME_BYTES: usize = JPEG_SOI.len() + JPEG_EOI.len();

/// Mock camera with a bounded frame-buffer pool
pub struct MockCamera {
    pool: FramePool,
    pacer: FramePacer,
    rng: StdRng,
    min_bytes: usize,
    max_bytes: usize,
    sequence: u64,
}

impl MockCamera {
    pub fn new(camera: &CameraConfig, mock: &MockConfig) -> Self {
        let nominal = nominal_frame_bytes(camera);
        let min_bytes = mock
            .min_frame_bytes
            .unwrap_or(nominal / 2)
            .clamp(MIN_FRAME_BYTES, MAX_FRAME_BYTES);
        let max_bytes = mock
            .max_frame_bytes
            .unwrap_or(nominal * 3 / 2)
            .clamp(min_bytes, MAX_FRAME_BYTES);

        let rng = if mock.random_seed == 0 {
            StdRng::from_entropy()
        } else {
            StdRng::seed_from_u64(mock.random_seed)
        };

        log::info!(
            "Mock camera: {:?} q{} @ {} fps, {}-{} bytes/frame, {} buffers",
            camera.frame_size,
            camera.jpeg_quality,
            mock.fps,
            min_bytes,
            max_bytes,
            camera.fb_count
        );

        Self {
            pool: FramePool::new(camera.fb_count, max_bytes),
            pacer: FramePacer::new(mock.fps),
            rng,
            min_bytes,
            max_bytes,
            sequence: 0,
        }
    }

    /// Buffers not currently on loan
    pub fn free_buffers(&self) -> usize {
        self.pool.available()
    }

    fn fill(&mut self, buf: &mut Vec<u8>) {
        let len = self.rng.gen_range(self.min_bytes..=self.max_bytes);
        let body_len = len - MIN_FRAME_BYTES;

        buf.extend_from_slice(&JPEG_SOI);
        buf.extend((0..body_len).map(|_| self.rng.gen_range(0..0xFFu8)));
        buf.extend_from_slice(&JPEG_EOI);
    }
}

/// Rough JPEG size for a resolution and quality setting
///
/// Lower quality numbers compress less, so the divisor grows with the value.
fn nominal_frame_bytes(camera: &CameraConfig) -> usize {
    let (width, height) = camera.frame_size.dimensions();
    let raw_bytes = (width as usize * height as usize * 3) / 2;
    raw_bytes / (10 + camera.jpeg_quality as usize)
}

impl FrameSource for MockCamera {
    fn acquire(&mut self) -> Option<FrameBuffer> {
        self.pacer.wait();

        let mut buf = self.pool.take()?;
        self.fill(&mut buf);
        self.sequence += 1;

        log::trace!("Mock frame {}: {} bytes", self.sequence, buf.len());
        Some(FrameBuffer::new(self.sequence, buf))
    }

    fn release(&mut self, frame: FrameBuffer) {
        self.pool.give_back(frame.into_inner());
    }
}
