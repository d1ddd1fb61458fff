//! Frame streaming: rendezvous, chunked transmission and the stream loop

pub mod chunked;
pub mod rendezvous;
pub mod stats;
pub mod stream_loop;

pub use chunked::{ChunkedTransmitter, FrameOutcome, FrameReport, chunk_count, chunk_ranges};
pub use rendezvous::{SubscriberAddress, await_subscriber};
pub use stats::StreamStats;
pub use stream_loop::{StreamLoop, StreamState};
