//! Application orchestration for the Drishti IO daemon
//!
//! Binds the stream endpoint, creates the frame source and hands both, by
//! value, to a dedicated stream thread.

use crate::config::Config;
use crate::core::source::FrameSource;
use crate::devices::create_frame_source;
use crate::error::{Error, Result};
use crate::streaming::StreamLoop;
use crate::transport::{DatagramTransport, UdpTransport};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread::{self, JoinHandle};

/// Handle to a running stream thread
pub struct StreamHandle {
    local_addr: SocketAddr,
    handle: JoinHandle<Result<()>>,
}

impl StreamHandle {
    /// Address the stream socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the stream thread to finish
    pub fn join(self) -> Result<()> {
        self.handle
            .join()
            .map_err(|_| Error::Other("stream thread panicked".to_string()))?
    }
}

/// Bind the endpoint, build the frame source and start streaming
///
/// Setup failures (invalid config, address resolution, bind, frame source)
/// are returned before any thread is started.
pub fn start(config: &Config, running: Arc<AtomicBool>) -> Result<StreamHandle> {
    config.validate()?;

    log::info!(
        "Device: {} ({})",
        config.device.name,
        config.device.device_type
    );

    let transport = UdpTransport::bind(
        &config.network.bind_address,
        config.network.rendezvous_poll(),
    )?;
    let source = create_frame_source(&config.device)?;

    spawn_stream(transport, source, config, running)
}

/// Start the stream loop on its own thread with owned transport and source
pub fn spawn_stream<T, S>(
    transport: T,
    source: S,
    config: &Config,
    running: Arc<AtomicBool>,
) -> Result<StreamHandle>
where
    T: DatagramTransport + 'static,
    S: FrameSource + 'static,
{
    config.validate()?;
    let local_addr = transport.local_addr()?;
    let streaming = config.streaming.clone();

    let handle = thread::Builder::new()
        .name("camera-stream".to_string())
        .spawn(move || {
            let mut stream = StreamLoop::new(transport, source, &streaming, running);
            let result = stream.run();
            if let Err(ref e) = result {
                log::error!("Stream loop error: {}", e);
            }
            result
        })
        .map_err(|e| Error::Other(format!("Failed to spawn stream thread: {}", e)))?;

    Ok(StreamHandle { local_addr, handle })
}
