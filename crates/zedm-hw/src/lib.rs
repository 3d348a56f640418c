//! zedm-hw — Hardware abstraction for stereo depth cameras.
//!
//! Defines the [`StereoCamera`] capability interface with a V4L2/UVC
//! backend for real devices and a simulated backend for bench checks and
//! tests, plus the frame buffers and pixel conversions they share.

pub mod camera;
pub mod depth;
pub mod frame;
pub mod profiles;
pub mod settings;
pub mod sim;
pub mod uvc;

pub use camera::{
    CameraError, DeviceInfo, InitParameters, RuntimeParameters, StereoCamera, View,
};
pub use frame::{Frame, FrameError};
pub use settings::{Fps, Resolution, SettingValue, VideoSetting};
pub use sim::SimulatedCamera;
pub use uvc::UvcStereoCamera;
