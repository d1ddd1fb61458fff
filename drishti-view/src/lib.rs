//! Drishti View - subscriber side of the Drishti IO stream
//!
//! - [`receiver::StreamReceiver`]: requests the stream and receives chunks
//! - [`assembler::FrameAssembler`]: recovers JPEG frames from raw chunks

pub mod assembler;
pub mod error;
pub mod receiver;

pub use assembler::{AssembledFrame, AssemblerStats, FrameAssembler};
pub use error::{Error, Result};
pub use receiver::{ReceiverConfig, ReceiverStats, StreamReceiver};
