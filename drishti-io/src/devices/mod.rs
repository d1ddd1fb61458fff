//! Frame source implementations

pub mod mock;
pub mod replay;

mod pacer;

use crate::config::{DeviceConfig, PixelFormat};
use crate::core::source::FrameSource;
use crate::error::{Error, Result};
use mock::MockCamera;
use replay::ReplayCamera;

pub(crate) use pacer::FramePacer;

/// Create a frame source based on configuration
pub fn create_frame_source(config: &DeviceConfig) -> Result<Box<dyn FrameSource>> {
    if config.camera.pixel_format != PixelFormat::Jpeg {
        return Err(Error::FrameSource(format!(
            "{:?} output is not supported, only jpeg",
            config.camera.pixel_format
        )));
    }

    match config.device_type.as_str() {
        "mock" => Ok(Box::new(MockCamera::new(&config.camera, &config.mock))),
        "replay" => Ok(Box::new(ReplayCamera::open(
            &config.camera,
            &config.replay,
        )?)),
        _ => Err(Error::UnknownDevice(config.device_type.clone())),
    }
}
