//! Frame reassembly from raw stream chunks
//!
//! The stream carries no header, so frame boundaries are inferred from the
//! payload itself:
//!
//! - A datagram starting with the JPEG SOI marker (`FF D8 FF`) begins a new
//!   frame. Any partial frame still buffered is flushed first.
//! - A datagram shorter than the chunk size is the last chunk of a frame.
//! - A frame is accepted only if it starts with SOI and ends with EOI
//!   (`FF D9`).
//!
//! A frame whose length is an exact multiple of the chunk size has no short
//! tail; it is completed when the next frame's first chunk arrives.
//! Reordered or lost datagrams produce frames that fail the marker check and
//! are counted as dropped.

/// JPEG start-of-image marker as sent at the start of every frame
pub const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// JPEG end-of-image marker
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// A reassembled frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFrame {
    /// Frame bytes, SOI through EOI
    pub data: Vec<u8>,
    /// Number of datagrams the frame arrived in
    pub datagrams: usize,
}

/// Reassembly counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub frames: u64,
    /// Frames that failed the SOI/EOI check
    pub dropped_invalid: u64,
    /// Frames discarded for exceeding `max_frame_bytes`
    pub dropped_oversize: u64,
    /// Continuation datagrams received with no frame in progress
    pub orphan_datagrams: u64,
}

/// Recovers JPEG frames from a sequence of stream datagrams
#[derive(Debug)]
pub struct FrameAssembler {
    chunk_size: usize,
    max_frame_bytes: usize,
    current: Vec<u8>,
    datagrams: usize,
    /// Set after an oversize discard; remaining chunks of that frame are skipped
    skipping: bool,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub fn new(chunk_size: usize, max_frame_bytes: usize) -> Self {
        Self {
            chunk_size,
            max_frame_bytes,
            current: Vec::new(),
            datagrams: 0,
            skipping: false,
            stats: AssemblerStats::default(),
        }
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }

    /// Bytes buffered for the frame in progress
    pub fn pending_bytes(&self) -> usize {
        self.current.len()
    }

    /// Feed one datagram, returning any frames it completed
    ///
    /// At most two frames come out of one datagram: the flushed previous
    /// frame and a single-chunk frame carried entirely by this datagram.
    pub fn push(&mut self, datagram: &[u8]) -> Vec<AssembledFrame> {
        let mut completed = Vec::new();
        if datagram.is_empty() {
            return completed;
        }

        let is_start = datagram.starts_with(&JPEG_SOI);
        let is_last = datagram.len() < self.chunk_size;

        if is_start {
            self.skipping = false;
            if !self.current.is_empty() {
                completed.extend(self.finish());
            }
        } else if self.skipping {
            if is_last {
                self.skipping = false;
            }
            return completed;
        } else if self.current.is_empty() {
            self.stats.orphan_datagrams += 1;
            log::trace!("Orphan datagram of {} bytes", datagram.len());
            return completed;
        }

        self.current.extend_from_slice(datagram);
        self.datagrams += 1;

        if self.current.len() > self.max_frame_bytes {
            log::debug!(
                "Discarding frame over {} bytes after {} datagrams",
                self.max_frame_bytes,
                self.datagrams
            );
            self.stats.dropped_oversize += 1;
            self.reset();
            self.skipping = !is_last;
            return completed;
        }

        if is_last {
            completed.extend(self.finish());
        }
        completed
    }

    fn finish(&mut self) -> Option<AssembledFrame> {
        let data = std::mem::take(&mut self.current);
        let datagrams = std::mem::replace(&mut self.datagrams, 0);

        if data.starts_with(&JPEG_SOI) && data.ends_with(&JPEG_EOI) {
            self.stats.frames += 1;
            Some(AssembledFrame { data, datagrams })
        } else {
            log::debug!(
                "Dropping {} byte frame without JPEG markers ({} datagrams)",
                data.len(),
                datagrams
            );
            self.stats.dropped_invalid += 1;
            None
        }
    }

    fn reset(&mut self) {
        self.current.clear();
        self.datagrams = 0;
    }
}
