//! Drishti View - receive and save frames from a Drishti IO camera
//!
//! # Usage
//!
//! ```bash
//! # Stream from the default camera address, log fps only
//! drishti-view
//!
//! # Save the first 100 frames from a local daemon
//! drishti-view --camera 127.0.0.1:9000 --output frames --max-frames 100
//! ```

use clap::Parser;
use drishti_view::error::{Error, Result};
use drishti_view::receiver::{ReceiverConfig, StreamReceiver};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "drishti-view")]
#[command(about = "Receive JPEG frames from a Drishti IO camera")]
struct Args {
    /// Camera stream endpoint
    #[arg(long, default_value = "192.168.4.1:9000")]
    camera: SocketAddr,

    /// Local address to bind
    #[arg(long, default_value = "0.0.0.0:0")]
    bind: String,

    /// Chunk size the camera sends with
    #[arg(long, default_value_t = 59192)]
    chunk_size: usize,

    /// Directory to write frames to (frame_NNNNNN.jpg)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(short = 'n', long)]
    max_frames: Option<u64>,

    /// Resend the stream request after this much silence
    #[arg(long, default_value_t = 1000)]
    trigger_interval_ms: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.chunk_size == 0 {
        return Err(Error::Other("--chunk-size must be positive".to_string()));
    }

    if let Some(dir) = &args.output {
        fs::create_dir_all(dir)?;
        log::info!("Writing frames to {}", dir.display());
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    let config = ReceiverConfig {
        camera_addr: args.camera,
        bind_addr: args.bind.clone(),
        chunk_size: args.chunk_size,
        trigger_interval: Duration::from_millis(args.trigger_interval_ms),
        ..ReceiverConfig::default()
    };

    let (receiver, frame_rx) = StreamReceiver::new(config, Arc::clone(&running))?;
    let dropped = receiver.drop_counter();
    let receiver_thread = thread::Builder::new()
        .name("stream-receiver".to_string())
        .spawn(move || receiver.run())
        .map_err(|e| Error::Other(format!("Failed to spawn receiver thread: {}", e)))?;

    let mut saved: u64 = 0;
    let mut window_frames: u64 = 0;
    let mut window_bytes: usize = 0;
    let mut window_start = Instant::now();

    while running.load(Ordering::Relaxed) {
        if let Ok(frame) = frame_rx.recv_timeout(Duration::from_millis(100)) {
            if let Some(dir) = &args.output {
                let path = dir.join(format!("frame_{:06}.jpg", saved));
                fs::write(&path, &frame.data)?;
                log::debug!("Saved {} ({} bytes)", path.display(), frame.data.len());
            }
            saved += 1;
            window_frames += 1;
            window_bytes += frame.data.len();

            if args.max_frames.is_some_and(|max| saved >= max) {
                log::info!("Received {} frames, stopping", saved);
                running.store(false, Ordering::Relaxed);
            }
        }

        let elapsed = window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let secs = elapsed.as_secs_f64();
            log::info!(
                "{:.1} fps, {:.1} KB/s, {} frames total, {} dropped",
                window_frames as f64 / secs,
                window_bytes as f64 / 1024.0 / secs,
                saved,
                dropped.load(Ordering::Relaxed)
            );
            window_frames = 0;
            window_bytes = 0;
            window_start = Instant::now();
        }
    }

    // Hang up so the receiver stops even if it is mid-frame
    drop(frame_rx);
    let stats = receiver_thread
        .join()
        .map_err(|_| Error::Other("receiver thread panicked".to_string()))?;

    log::info!(
        "Done: {} frames received, {} invalid, {} oversize, {} lagged, {} datagrams",
        stats.assembler.frames,
        stats.assembler.dropped_invalid,
        stats.assembler.dropped_oversize,
        stats.frames_lagged,
        stats.datagrams
    );
    Ok(())
}
