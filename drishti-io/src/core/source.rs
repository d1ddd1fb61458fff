//! FrameSource trait and FrameBuffer type

/// One captured frame on loan from a [`FrameSource`]
///
/// Must be handed back through [`FrameSource::release`] once the send
/// attempt is over, or the source's buffer pool runs dry.
#[derive(Debug)]
pub struct FrameBuffer {
    sequence: u64,
    timestamp_us: u64,
    data: Vec<u8>,
}

impl FrameBuffer {
    /// Wrap captured bytes
    pub fn new(sequence: u64, data: Vec<u8>) -> Self {
        let timestamp_us = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        Self {
            sequence,
            timestamp_us,
            data,
        }
    }

    /// Capture counter assigned by the source
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Capture time, microseconds since the Unix epoch
    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take back the underlying storage for reuse
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// Producer of opaque frame payloads
///
/// Sources own a finite set of buffers. Every buffer returned by
/// `acquire` must be passed to `release` exactly once before it can be
/// handed out again.
pub trait FrameSource: Send {
    /// Get the next frame, `None` if no frame is available right now
    fn acquire(&mut self) -> Option<FrameBuffer>;

    /// Return a frame obtained from `acquire`
    fn release(&mut self, frame: FrameBuffer);
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn acquire(&mut self) -> Option<FrameBuffer> {
        (**self).acquire()
    }

    fn release(&mut self, frame: FrameBuffer) {
        (**self).release(frame)
    }
}
