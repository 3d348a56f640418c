//! Stereo camera capability interface shared by the UVC and simulated backends.

use crate::frame::{Frame, FrameError};
use crate::settings::{Fps, Resolution, SettingValue, VideoSetting};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("no compatible stereo camera detected")]
    NoDevice,
    #[error("device busy")]
    DeviceBusy,
    #[error("mode rejected: {0}")]
    ModeRejected(String),
    #[error("camera not opened")]
    NotOpened,
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("view {0:?} unavailable before a successful grab")]
    NoFrame(View),
    #[error("control {setting} failed: {reason}")]
    ControlFailed {
        setting: VideoSetting,
        reason: String,
    },
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Parameters used to open a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitParameters {
    pub resolution: Resolution,
    pub fps: Fps,
    /// Explicit device path; the first compatible device is used when `None`.
    pub device_path: Option<String>,
}

impl Default for InitParameters {
    fn default() -> Self {
        Self {
            resolution: Resolution::Hd1080,
            fps: Fps::F30,
            device_path: None,
        }
    }
}

/// Per-grab processing options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeParameters {
    /// Compute the depth view for this grab.
    pub enable_depth: bool,
    /// Largest disparity searched, in pixels of the downscaled depth image.
    pub max_disparity: u32,
    /// Frames dequeued and dropped before the one that is kept.
    pub warmup_frames: usize,
}

impl Default for RuntimeParameters {
    fn default() -> Self {
        Self {
            enable_depth: true,
            max_disparity: 48,
            warmup_frames: 4,
        }
    }
}

/// Image product available after a grab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Rectified left image.
    Left,
    /// Rectified right image.
    Right,
    /// Depth visualization (near = bright).
    Depth,
}

/// A discovered stereo camera.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

/// Capabilities the session needs from a stereo camera.
///
/// A value starts closed; `open` moves it to the open state and the other
/// calls fail with [`CameraError::NotOpened`] until then.
pub trait StereoCamera {
    /// Connect to the device in the requested mode.
    fn open(&mut self, params: &InitParameters) -> Result<(), CameraError>;

    /// Write one tuning parameter.
    fn set_video_setting(
        &mut self,
        setting: VideoSetting,
        value: SettingValue,
    ) -> Result<(), CameraError>;

    /// Block until one synchronized frame set has been captured and processed.
    fn grab(&mut self, runtime: &RuntimeParameters) -> Result<(), CameraError>;

    /// Copy a view of the last grab into a fresh buffer.
    fn retrieve_view(&mut self, view: View) -> Result<Frame, CameraError>;
}

macro_rules! forward_stereo_camera {
    ($ty:ty) => {
        impl<C: StereoCamera + ?Sized> StereoCamera for $ty {
            fn open(&mut self, params: &InitParameters) -> Result<(), CameraError> {
                (**self).open(params)
            }

            fn set_video_setting(
                &mut self,
                setting: VideoSetting,
                value: SettingValue,
            ) -> Result<(), CameraError> {
                (**self).set_video_setting(setting, value)
            }

            fn grab(&mut self, runtime: &RuntimeParameters) -> Result<(), CameraError> {
                (**self).grab(runtime)
            }

            fn retrieve_view(&mut self, view: View) -> Result<Frame, CameraError> {
                (**self).retrieve_view(view)
            }
        }
    };
}

forward_stereo_camera!(Box<C>);
forward_stereo_camera!(&mut C);
