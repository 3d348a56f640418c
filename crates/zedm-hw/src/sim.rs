//! Simulated stereo camera.
//!
//! Renders a textured scene seen from two viewpoints a fixed number of
//! pixels apart, so the depth view has something to find. Every call is
//! recorded, which makes the same type usable as a test double.

use crate::camera::{CameraError, InitParameters, RuntimeParameters, StereoCamera, View};
use crate::depth;
use crate::frame::{Frame, VIEW_CHANNELS};
use crate::settings::{SettingValue, VideoSetting};

/// Horizontal offset between the two simulated viewpoints, in pixels.
const BASELINE_SHIFT: u32 = 24;

/// A call made against a [`SimulatedCamera`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimCall {
    Open(InitParameters),
    SetVideoSetting(VideoSetting, SettingValue),
    Grab,
    RetrieveView(View),
}

/// Synthetic stereo camera with scriptable failures.
#[derive(Debug, Default)]
pub struct SimulatedCamera {
    absent: bool,
    fail_grabs: bool,
    /// Divides the preset resolution, keeping test frames small.
    downscale: u32,
    opened: Option<InitParameters>,
    sequence: u32,
    last: Option<(Frame, Frame, Frame)>,
    calls: Vec<SimCall>,
}

impl SimulatedCamera {
    /// A present, working device.
    pub fn new() -> Self {
        Self {
            downscale: 1,
            ..Self::default()
        }
    }

    /// A device that cannot be found.
    pub fn absent() -> Self {
        Self {
            absent: true,
            ..Self::new()
        }
    }

    /// Make every grab fail.
    pub fn with_failing_grabs(mut self) -> Self {
        self.fail_grabs = true;
        self
    }

    /// Render frames at `1 / factor` of the preset resolution.
    pub fn with_downscale(mut self, factor: u32) -> Self {
        self.downscale = factor.max(1);
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> &[SimCall] {
        &self.calls
    }

    /// Settings written so far, in order.
    pub fn settings_written(&self) -> Vec<(VideoSetting, SettingValue)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SimCall::SetVideoSetting(s, v) => Some((*s, *v)),
                _ => None,
            })
            .collect()
    }

    /// Parameters of the successful open, if any.
    pub fn opened_with(&self) -> Option<&InitParameters> {
        self.opened.as_ref()
    }

    fn render_eye(&self, width: u32, height: u32, shift: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height) as usize * VIEW_CHANNELS as usize);
        for y in 0..height {
            for x in 0..width {
                let sx = x + shift;
                let v = (sx.wrapping_mul(2_654_435_761) ^ y.wrapping_mul(40_503)) >> 8;
                let checker = if ((sx / 16) + (y / 16)) % 2 == 0 { 64 } else { 0 };
                let r = ((v & 0x7f) + checker) as u8;
                let g = (((v >> 7) & 0x7f) + checker) as u8;
                let b = (((v >> 14) & 0x7f) + checker) as u8;
                data.extend_from_slice(&[r, g, b, 255]);
            }
        }
        Frame {
            data,
            width,
            height,
            channels: VIEW_CHANNELS,
            timestamp: std::time::Instant::now(),
            sequence: self.sequence,
        }
    }
}

impl StereoCamera for SimulatedCamera {
    fn open(&mut self, params: &InitParameters) -> Result<(), CameraError> {
        self.calls.push(SimCall::Open(params.clone()));
        if self.absent {
            return Err(match &params.device_path {
                Some(path) => CameraError::DeviceNotFound(path.clone()),
                None => CameraError::NoDevice,
            });
        }
        tracing::info!(
            resolution = %params.resolution,
            fps = params.fps.value(),
            "opened simulated camera"
        );
        self.opened = Some(params.clone());
        Ok(())
    }

    fn set_video_setting(
        &mut self,
        setting: VideoSetting,
        value: SettingValue,
    ) -> Result<(), CameraError> {
        self.calls.push(SimCall::SetVideoSetting(setting, value));
        if self.opened.is_none() {
            return Err(CameraError::NotOpened);
        }
        Ok(())
    }

    fn grab(&mut self, runtime: &RuntimeParameters) -> Result<(), CameraError> {
        self.calls.push(SimCall::Grab);
        let params = self.opened.as_ref().ok_or(CameraError::NotOpened)?;
        if self.fail_grabs {
            self.last = None;
            return Err(CameraError::CaptureFailed("simulated grab failure".into()));
        }

        let (w, h) = params.resolution.dimensions();
        let factor = self.downscale.max(1);
        let (w, h) = ((w / factor).max(1), (h / factor).max(1));
        // Warmup frames are rendered by nobody but still consume sequence numbers.
        let dropped = u32::try_from(runtime.warmup_frames).unwrap_or(u32::MAX);
        self.sequence = self.sequence.wrapping_add(dropped).wrapping_add(1);

        // A scene point lands further left in the right eye.
        let left = self.render_eye(w, h, 0);
        let right = self.render_eye(w, h, BASELINE_SHIFT);
        let depth_view = if runtime.enable_depth {
            depth::depth_view(&left, &right, runtime.max_disparity)
        } else {
            Frame::blank(w, h, VIEW_CHANNELS)
        };
        self.last = Some((left, right, depth_view));
        Ok(())
    }

    fn retrieve_view(&mut self, view: View) -> Result<Frame, CameraError> {
        self.calls.push(SimCall::RetrieveView(view));
        let (left, right, depth_view) = self.last.as_ref().ok_or(CameraError::NoFrame(view))?;
        Ok(match view {
            View::Left => left.clone(),
            View::Right => right.clone(),
            View::Depth => depth_view.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Fps, Resolution};

    fn params(resolution: Resolution, fps: Fps) -> InitParameters {
        InitParameters {
            resolution,
            fps,
            device_path: None,
        }
    }

    #[test]
    fn test_absent_device_fails_open() {
        let mut cam = SimulatedCamera::absent();
        let err = cam.open(&params(Resolution::Vga, Fps::F15)).unwrap_err();
        assert!(matches!(err, CameraError::NoDevice));
        assert!(cam.opened_with().is_none());
    }

    #[test]
    fn test_absent_explicit_path() {
        let mut cam = SimulatedCamera::absent();
        let mut p = params(Resolution::Vga, Fps::F15);
        p.device_path = Some("/dev/video9".into());
        assert!(matches!(cam.open(&p), Err(CameraError::DeviceNotFound(path)) if path == "/dev/video9"));
    }

    #[test]
    fn test_grab_before_open() {
        let mut cam = SimulatedCamera::new();
        assert!(matches!(
            cam.grab(&RuntimeParameters::default()),
            Err(CameraError::NotOpened)
        ));
    }

    #[test]
    fn test_retrieve_before_grab() {
        let mut cam = SimulatedCamera::new();
        cam.open(&params(Resolution::Vga, Fps::F30)).unwrap();
        assert!(matches!(
            cam.retrieve_view(View::Left),
            Err(CameraError::NoFrame(View::Left))
        ));
    }

    #[test]
    fn test_views_match_resolution() {
        let mut cam = SimulatedCamera::new().with_downscale(4);
        cam.open(&params(Resolution::Vga, Fps::F100)).unwrap();
        cam.grab(&RuntimeParameters::default()).unwrap();
        for view in [View::Left, View::Right, View::Depth] {
            let frame = cam.retrieve_view(view).unwrap();
            assert_eq!((frame.width, frame.height), (168, 94));
            assert_eq!(frame.channels, VIEW_CHANNELS);
        }
    }

    #[test]
    fn test_failing_grab_clears_views() {
        let mut cam = SimulatedCamera::new().with_failing_grabs();
        cam.open(&params(Resolution::Hd720, Fps::F60)).unwrap();
        assert!(cam.grab(&RuntimeParameters::default()).is_err());
        assert!(cam.retrieve_view(View::Right).is_err());
    }

    #[test]
    fn test_warmup_frames_skip_sequence_numbers() {
        let mut cam = SimulatedCamera::new().with_downscale(8);
        cam.open(&params(Resolution::Vga, Fps::F30)).unwrap();

        cam.grab(&RuntimeParameters::default()).unwrap();
        assert_eq!(cam.retrieve_view(View::Left).unwrap().sequence, 5);

        let no_warmup = RuntimeParameters {
            warmup_frames: 0,
            ..RuntimeParameters::default()
        };
        cam.grab(&no_warmup).unwrap();
        assert_eq!(cam.retrieve_view(View::Left).unwrap().sequence, 6);
    }

    #[test]
    fn test_calls_recorded_in_order() {
        let mut cam = SimulatedCamera::new().with_downscale(8);
        let p = params(Resolution::Vga, Fps::F15);
        cam.open(&p).unwrap();
        cam.set_video_setting(VideoSetting::Hue, SettingValue::Manual(3))
            .unwrap();
        cam.grab(&RuntimeParameters::default()).unwrap();
        assert_eq!(
            cam.calls(),
            &[
                SimCall::Open(p),
                SimCall::SetVideoSetting(VideoSetting::Hue, SettingValue::Manual(3)),
                SimCall::Grab,
            ]
        );
    }
}
