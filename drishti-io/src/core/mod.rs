//! Core abstractions for frame sources.
//!
//! - [`source::FrameSource`]: Trait to implement for new cameras
//! - [`source::FrameBuffer`]: One captured frame, borrowed from the source
//! - [`pool::FramePool`]: Fixed set of reusable frame buffers

pub mod pool;
pub mod source;
