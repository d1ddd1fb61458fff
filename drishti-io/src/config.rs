//! Configuration for Drishti IO
//!
//! Loads configuration from a TOML file. Every section has defaults, so an
//! empty file (or no file at all) yields a working mock-camera setup that
//! listens on `0.0.0.0:9000`.
//!
//! ```toml
//! [device]
//! name = "ESP32-CAM"
//! type = "mock"
//!
//! [device.camera]
//! frame_size = "vga"
//! jpeg_quality = 10
//! fb_count = 2
//!
//! [network]
//! bind_address = "0.0.0.0:9000"
//!
//! [streaming]
//! max_chunk_size = 59192
//! send_backoff_ms = 10
//! frame_yield_ms = 1
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_UDP_PAYLOAD: usize = 65507;

/// Default chunk size: stays under the transport's safe datagram size
/// while leaving room for headers
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 59192;

/// Highest (worst) JPEG quality value accepted by the sensor
pub const MAX_JPEG_QUALITY: u8 = 63;

/// Accepted frame rates for paced sources; 0 means unpaced
pub const MIN_FPS: f32 = 0.01;
pub const MAX_FPS: f32 = 1000.0;

/// Upper bound on a synthetic frame; the pool preallocates `fb_count` of these
pub const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub streaming: StreamingConfig,
}

/// Frame source selection and settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Human readable device name (logged at startup)
    pub name: String,
    /// Frame source type: "mock" or "replay"
    #[serde(rename = "type")]
    pub device_type: String,
    pub camera: CameraConfig,
    pub mock: MockConfig,
    pub replay: ReplayConfig,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "ESP32-CAM".to_string(),
            device_type: "mock".to_string(),
            camera: CameraConfig::default(),
            mock: MockConfig::default(),
            replay: ReplayConfig::default(),
        }
    }
}

/// Image sensor settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    pub frame_size: FrameSize,
    pub pixel_format: PixelFormat,
    /// 0-63, lower number means higher quality
    pub jpeg_quality: u8,
    /// Number of frame buffers in the pool
    pub fb_count: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            frame_size: FrameSize::Vga,
            pixel_format: PixelFormat::Jpeg,
            jpeg_quality: 10,
            fb_count: 2,
        }
    }
}

/// Sensor output resolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSize {
    Qqvga,
    Qvga,
    Cif,
    Vga,
    Svga,
    Xga,
    Sxga,
    Uxga,
}

impl FrameSize {
    /// Width and height in pixels
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            FrameSize::Qqvga => (160, 120),
            FrameSize::Qvga => (320, 240),
            FrameSize::Cif => (400, 296),
            FrameSize::Vga => (640, 480),
            FrameSize::Svga => (800, 600),
            FrameSize::Xga => (1024, 768),
            FrameSize::Sxga => (1280, 1024),
            FrameSize::Uxga => (1600, 1200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Jpeg,
    Rgb565,
    Yuv422,
    Grayscale,
}

/// Synthetic frame source settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MockConfig {
    /// Frame rate, 0 = unpaced
    pub fps: f32,
    /// Smallest generated frame (derived from frame size and quality if unset)
    pub min_frame_bytes: Option<usize>,
    /// Largest generated frame (derived from frame size and quality if unset)
    pub max_frame_bytes: Option<usize>,
    /// 0 = seed from the clock
    pub random_seed: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fps: 25.0,
            min_frame_bytes: None,
            max_frame_bytes: None,
            random_seed: 0,
        }
    }
}

/// File replay source settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Directory containing `*.jpg` frames
    pub directory: PathBuf,
    /// Frame rate, 0 = unpaced
    pub fps: f32,
    pub loop_playback: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("frames"),
            fps: 10.0,
            loop_playback: true,
        }
    }
}

/// Transport endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Local address the stream socket binds to
    pub bind_address: String,
    /// Receive timeout while waiting for a subscriber; bounds shutdown latency
    pub rendezvous_poll_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
            rendezvous_poll_ms: 500,
        }
    }
}

impl NetworkConfig {
    pub fn rendezvous_poll(&self) -> Duration {
        Duration::from_millis(self.rendezvous_poll_ms)
    }
}

/// Chunked transmission settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Payload bytes per datagram
    pub max_chunk_size: usize,
    /// Wait before retrying a transiently failed send
    pub send_backoff_ms: u64,
    /// Pause between frames
    pub frame_yield_ms: u64,
    /// Statistics log period, 0 disables
    pub stats_interval_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            send_backoff_ms: 10,
            frame_yield_ms: 1,
            stats_interval_secs: 10,
        }
    }
}

impl StreamingConfig {
    pub fn send_backoff(&self) -> Duration {
        Duration::from_millis(self.send_backoff_ms)
    }

    pub fn frame_yield(&self) -> Duration {
        Duration::from_millis(self.frame_yield_ms)
    }

    pub fn stats_interval(&self) -> Option<Duration> {
        (self.stats_interval_secs > 0).then(|| Duration::from_secs(self.stats_interval_secs))
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the stream cannot run with
    pub fn validate(&self) -> Result<()> {
        let camera = &self.device.camera;
        if camera.jpeg_quality > MAX_JPEG_QUALITY {
            return Err(Error::Config(format!(
                "jpeg_quality must be 0-{}, got {}",
                MAX_JPEG_QUALITY, camera.jpeg_quality
            )));
        }
        if camera.fb_count == 0 {
            return Err(Error::Config("fb_count must be at least 1".to_string()));
        }

        let chunk = self.streaming.max_chunk_size;
        if chunk == 0 || chunk > MAX_UDP_PAYLOAD {
            return Err(Error::Config(format!(
                "max_chunk_size must be 1-{}, got {}",
                MAX_UDP_PAYLOAD, chunk
            )));
        }

        validate_fps("device.mock.fps", self.device.mock.fps)?;
        validate_fps("device.replay.fps", self.device.replay.fps)?;

        let mock = &self.device.mock;
        for (key, value) in [
            ("min_frame_bytes", mock.min_frame_bytes),
            ("max_frame_bytes", mock.max_frame_bytes),
        ] {
            if let Some(bytes) = value {
                if bytes > MAX_FRAME_BYTES {
                    return Err(Error::Config(format!(
                        "mock {} must be at most {}, got {}",
                        key, MAX_FRAME_BYTES, bytes
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (mock.min_frame_bytes, mock.max_frame_bytes) {
            if min > max {
                return Err(Error::Config(format!(
                    "mock min_frame_bytes ({}) exceeds max_frame_bytes ({})",
                    min, max
                )));
            }
        }

        Ok(())
    }
}

fn validate_fps(key: &str, fps: f32) -> Result<()> {
    if fps == 0.0 || (MIN_FPS..=MAX_FPS).contains(&fps) {
        return Ok(());
    }
    Err(Error::Config(format!(
        "{} must be 0 or {}-{}, got {}",
        key, MIN_FPS, MAX_FPS, fps
    )))
}
