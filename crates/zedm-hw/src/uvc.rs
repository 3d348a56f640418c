//! UVC stereo camera capture via the `v4l` crate.
//!
//! Cameras of this class stream both eyes as one side-by-side YUYV frame
//! (`2 * width` x `height`). Tuning settings map onto the standard V4L2
//! user controls.

use crate::camera::{
    CameraError, DeviceInfo, InitParameters, RuntimeParameters, StereoCamera, View,
};
use crate::depth;
use crate::frame::{self, Frame, VIEW_CHANNELS};
use crate::profiles::{self, CameraProfile};
use crate::settings::{SettingValue, VideoSetting};
use std::path::Path;
use v4l::buffer::Type as BufType;
use v4l::control::{Control, Description, Value};
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::FourCC;

// Control IDs from <linux/v4l2-controls.h>.
const V4L2_CID_BRIGHTNESS: u32 = 0x0098_0900;
const V4L2_CID_CONTRAST: u32 = 0x0098_0901;
const V4L2_CID_SATURATION: u32 = 0x0098_0902;
const V4L2_CID_HUE: u32 = 0x0098_0903;
const V4L2_CID_GAMMA: u32 = 0x0098_0910;
const V4L2_CID_SHARPNESS: u32 = 0x0098_091b;
const V4L2_CID_EXPOSURE_AUTO: u32 = 0x009a_0901;
const V4L2_CID_EXPOSURE_ABSOLUTE: u32 = 0x009a_0902;

const V4L2_EXPOSURE_MANUAL: i64 = 1;
const V4L2_EXPOSURE_APERTURE_PRIORITY: i64 = 3;

/// Number of video nodes scanned during discovery.
const MAX_VIDEO_NODES: u32 = 16;

fn control_id(setting: VideoSetting) -> u32 {
    match setting {
        VideoSetting::Brightness => V4L2_CID_BRIGHTNESS,
        VideoSetting::Contrast => V4L2_CID_CONTRAST,
        VideoSetting::Hue => V4L2_CID_HUE,
        VideoSetting::Saturation => V4L2_CID_SATURATION,
        VideoSetting::Sharpness => V4L2_CID_SHARPNESS,
        VideoSetting::Gamma => V4L2_CID_GAMMA,
        VideoSetting::Exposure => V4L2_CID_EXPOSURE_ABSOLUTE,
    }
}

/// Frame rate described by a V4L2 frame interval (seconds per frame), rounded.
fn interval_fps(numerator: u32, denominator: u32) -> Option<u32> {
    if numerator == 0 {
        return None;
    }
    let (n, d) = (u64::from(numerator), u64::from(denominator));
    u32::try_from((d + n / 2) / n).ok()
}

/// Scale an exposure percentage (0–100) onto a control's range.
fn scale_percent(percent: i32, min: i64, max: i64) -> i64 {
    let p = percent.clamp(0, 100) as i64;
    min + (max - min) * p / 100
}

struct OpenDevice {
    device: Device,
    /// Width of one eye.
    width: u32,
    height: u32,
    controls: Vec<Description>,
}

/// UVC stereo camera handle. Closed until [`StereoCamera::open`] succeeds.
#[derive(Default)]
pub struct UvcStereoCamera {
    open: Option<OpenDevice>,
    last: Option<(Frame, Frame, Frame)>,
}

impl UvcStereoCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// List video capture devices that match a known stereo camera profile.
    pub fn list_devices() -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        for i in 0..MAX_VIDEO_NODES {
            let path = format!("/dev/video{i}");
            if !Path::new(&path).exists() || profile_for(&path).is_none() {
                continue;
            }
            let Ok(dev) = Device::with_path(&path) else {
                continue;
            };
            let Ok(caps) = dev.query_caps() else {
                continue;
            };
            if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
                continue;
            }
            devices.push(DeviceInfo {
                path,
                name: caps.card.clone(),
                driver: caps.driver.clone(),
                bus: caps.bus.clone(),
            });
        }

        devices
    }

    fn opened(&self) -> Result<&OpenDevice, CameraError> {
        self.open.as_ref().ok_or(CameraError::NotOpened)
    }

    fn write_control(&self, id: u32, value: i64) -> Result<(), CameraError> {
        let dev = self.opened()?;
        dev.device
            .set_control(Control {
                id,
                value: Value::Integer(value),
            })
            .map_err(|e| CameraError::CaptureFailed(format!("control {id:#x}: {e}")))
    }

    fn describe(&self, id: u32) -> Option<&Description> {
        self.open
            .as_ref()
            .and_then(|d| d.controls.iter().find(|c| c.id == id))
    }
}

fn profile_for(path: &str) -> Option<&'static CameraProfile> {
    let (vid, pid) = profiles::get_usb_ids(path)?;
    profiles::lookup_profile(vid, pid)
}

impl StereoCamera for UvcStereoCamera {
    fn open(&mut self, params: &InitParameters) -> Result<(), CameraError> {
        let device_path = match &params.device_path {
            Some(path) => path.clone(),
            None => Self::list_devices()
                .into_iter()
                .next()
                .map(|d| d.path)
                .ok_or(CameraError::NoDevice)?,
        };

        if !Path::new(&device_path).exists() {
            return Err(CameraError::DeviceNotFound(device_path));
        }

        let device = Device::with_path(&device_path).map_err(|e| {
            if e.to_string().contains("busy") || e.to_string().contains("EBUSY") {
                CameraError::DeviceBusy
            } else {
                CameraError::DeviceNotFound(format!("{device_path}: {e}"))
            }
        })?;

        let caps = device
            .query_caps()
            .map_err(|e| CameraError::DeviceNotFound(format!("failed to query capabilities: {e}")))?;
        if !caps.capabilities.contains(v4l::capability::Flags::VIDEO_CAPTURE) {
            return Err(CameraError::ModeRejected(format!(
                "{device_path} is not a video capture device"
            )));
        }

        tracing::info!(
            device = %device_path,
            driver = %caps.driver,
            card = %caps.card,
            "opened camera"
        );

        // Use the nearest rate the profile lists for this resolution.
        let mut fps = params.fps.value();
        match profile_for(&device_path) {
            Some(profile) => match profile.closest_fps(params.resolution, params.fps) {
                Some(rate) if rate != fps => {
                    tracing::warn!(
                        requested = fps,
                        using = rate,
                        resolution = %params.resolution,
                        camera = %profile.device.name,
                        "fps not supported at this resolution"
                    );
                    fps = rate;
                }
                Some(_) => {}
                None => {
                    return Err(CameraError::ModeRejected(format!(
                        "{} does not support {}",
                        profile.device.name, params.resolution
                    )))
                }
            },
            None => tracing::warn!(device = %device_path, "no profile for camera, mode unchecked"),
        }

        let (eye_w, eye_h) = params.resolution.dimensions();
        let mut fmt = device
            .format()
            .map_err(|e| CameraError::ModeRejected(format!("failed to get format: {e}")))?;
        fmt.fourcc = FourCC::new(b"YUYV");
        fmt.width = eye_w * 2;
        fmt.height = eye_h;

        let negotiated = device
            .set_format(&fmt)
            .map_err(|e| CameraError::ModeRejected(format!("failed to set format: {e}")))?;

        if negotiated.fourcc != FourCC::new(b"YUYV")
            || negotiated.width != fmt.width
            || negotiated.height != fmt.height
        {
            return Err(CameraError::ModeRejected(format!(
                "requested {}x{} YUYV, driver offered {}x{} {:?}",
                fmt.width, fmt.height, negotiated.width, negotiated.height, negotiated.fourcc
            )));
        }

        let applied = device
            .set_params(&Parameters::with_fps(fps))
            .map_err(|e| CameraError::ModeRejected(format!("failed to set {fps} fps: {e}")))?;
        let interval = applied.interval;
        let actual_fps = interval_fps(interval.numerator, interval.denominator);
        if actual_fps != Some(fps) {
            return Err(CameraError::ModeRejected(format!(
                "requested {fps} fps, driver set interval {}/{}",
                interval.numerator, interval.denominator
            )));
        }

        let controls = device.query_controls().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "control enumeration failed");
            Vec::new()
        });

        tracing::info!(
            width = negotiated.width,
            height = negotiated.height,
            fps,
            controls = controls.len(),
            "negotiated format"
        );

        self.open = Some(OpenDevice {
            device,
            width: eye_w,
            height: eye_h,
            controls,
        });
        self.last = None;
        Ok(())
    }

    fn set_video_setting(
        &mut self,
        setting: VideoSetting,
        value: SettingValue,
    ) -> Result<(), CameraError> {
        self.opened()?;
        let id = control_id(setting);
        let failed = |reason: String| CameraError::ControlFailed { setting, reason };

        if setting == VideoSetting::Exposure {
            return match value {
                SettingValue::Auto => self
                    .write_control(V4L2_CID_EXPOSURE_AUTO, V4L2_EXPOSURE_APERTURE_PRIORITY)
                    .map_err(|e| failed(e.to_string())),
                SettingValue::Manual(percent) => {
                    let desc = self
                        .describe(id)
                        .ok_or_else(|| failed("control not exposed by device".into()))?;
                    let raw = scale_percent(percent, desc.minimum, desc.maximum);
                    self.write_control(V4L2_CID_EXPOSURE_AUTO, V4L2_EXPOSURE_MANUAL)
                        .and_then(|()| self.write_control(id, raw))
                        .map_err(|e| failed(e.to_string()))
                }
            };
        }

        let raw = match value {
            SettingValue::Manual(v) => v as i64,
            SettingValue::Auto => {
                self.describe(id)
                    .ok_or_else(|| failed("control not exposed by device".into()))?
                    .default
            }
        };
        tracing::debug!(%setting, raw, "writing control");
        self.write_control(id, raw).map_err(|e| failed(e.to_string()))
    }

    fn grab(&mut self, runtime: &RuntimeParameters) -> Result<(), CameraError> {
        self.last = None;

        let (left, right) = {
            let dev = self.opened()?;
            let mut stream = MmapStream::with_buffers(&dev.device, BufType::VideoCapture, 4)
                .map_err(|e| {
                    CameraError::CaptureFailed(format!("failed to create mmap stream: {e}"))
                })?;

            // Early buffers come out before auto-exposure settles.
            for _ in 0..runtime.warmup_frames {
                let (_, meta) = stream.next().map_err(|e| {
                    CameraError::CaptureFailed(format!("failed to dequeue warmup buffer: {e}"))
                })?;
                tracing::debug!(seq = meta.sequence, "discarded warmup frame");
            }

            let (buf, meta) = stream.next().map_err(|e| {
                CameraError::CaptureFailed(format!("failed to dequeue buffer: {e}"))
            })?;
            tracing::debug!(seq = meta.sequence, bytes = buf.len(), "grabbed frame");

            let full_width = dev.width * 2;
            let rgba = frame::yuyv_to_rgba(buf, full_width, dev.height)?;
            let combined =
                Frame::from_raw(rgba, full_width, dev.height, VIEW_CHANNELS, meta.sequence)?;
            frame::split_side_by_side(&combined)?
        };

        let depth_view = if runtime.enable_depth {
            depth::depth_view(&left, &right, runtime.max_disparity)
        } else {
            Frame::blank(left.width, left.height, VIEW_CHANNELS)
        };

        self.last = Some((left, right, depth_view));
        Ok(())
    }

    fn retrieve_view(&mut self, view: View) -> Result<Frame, CameraError> {
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

    #[test]
    fn test_scale_percent() {
        assert_eq!(scale_percent(0, 3, 2047), 3);
        assert_eq!(scale_percent(100, 3, 2047), 2047);
        assert_eq!(scale_percent(50, 0, 1000), 500);
        assert_eq!(scale_percent(150, 0, 10), 10);
    }

    #[test]
    fn test_interval_fps() {
        assert_eq!(interval_fps(1, 30), Some(30));
        assert_eq!(interval_fps(1, 100), Some(100));
        // 1001/30000 is the NTSC-style 29.97 fps interval
        assert_eq!(interval_fps(1001, 30000), Some(30));
        assert_eq!(interval_fps(2, 30), Some(15));
        assert_eq!(interval_fps(0, 30), None);
    }

    #[test]
    fn test_control_ids_distinct() {
        let mut ids: Vec<u32> = VideoSetting::ALL.iter().map(|&s| control_id(s)).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), VideoSetting::ALL.len());
    }

    #[test]
    fn test_unopened_camera_rejects_calls() {
        let mut cam = UvcStereoCamera::new();
        assert!(matches!(
            cam.set_video_setting(VideoSetting::Gamma, SettingValue::Auto),
            Err(CameraError::NotOpened)
        ));
        assert!(matches!(
            cam.grab(&RuntimeParameters::default()),
            Err(CameraError::NotOpened)
        ));
    }

    #[test]
    fn test_open_missing_path() {
        let mut cam = UvcStereoCamera::new();
        let params = InitParameters {
            device_path: Some("/dev/video-does-not-exist".into()),
            ..InitParameters::default()
        };
        assert!(matches!(cam.open(&params), Err(CameraError::DeviceNotFound(_))));
    }
}
