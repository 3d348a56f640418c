//! Camera session — open a device, push tuning settings, grab once.

use crate::config::CameraConfig;
use thiserror::Error;
use zedm_hw::{CameraError, Frame, StereoCamera, View};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("camera failed to initialize: {0}")]
    DeviceInit(#[source] CameraError),
}

/// The three views retrieved from one successful grab.
#[derive(Debug)]
pub struct CaptureResult {
    pub left: Frame,
    pub right: Frame,
    pub depth: Frame,
}

/// An open camera. Only constructed once the device has accepted the mode.
pub struct Session<C: StereoCamera> {
    camera: C,
    config: CameraConfig,
}

impl<C: StereoCamera> Session<C> {
    /// Open `camera` in the configured mode and apply the tuning settings.
    pub fn open(mut camera: C, config: CameraConfig) -> Result<Self, SessionError> {
        camera
            .open(&config.init_parameters())
            .map_err(SessionError::DeviceInit)?;

        tracing::info!(
            fps = config.fps.value(),
            resolution = %config.resolution,
            "camera session open"
        );

        let mut session = Self { camera, config };
        session.apply_settings();
        Ok(session)
    }

    /// Write all seven tuning settings. Failures are logged and otherwise ignored.
    pub fn apply_settings(&mut self) {
        for (setting, value) in self.config.settings() {
            match self.camera.set_video_setting(setting, value) {
                Ok(()) => tracing::debug!(%setting, %value, "applied setting"),
                Err(e) => tracing::debug!(%setting, %value, error = %e, "setting not applied"),
            }
        }
    }

    /// Grab one frame set and retrieve its views.
    ///
    /// Returns `None` when the grab fails; the reason is only logged.
    pub fn capture_once(&mut self) -> Option<CaptureResult> {
        if let Err(e) = self.camera.grab(&self.config.runtime_parameters()) {
            tracing::debug!(error = %e, "grab failed");
            return None;
        }

        match self.retrieve_views() {
            Ok(capture) => {
                tracing::info!(
                    seq = capture.left.sequence,
                    width = capture.left.width,
                    height = capture.left.height,
                    left_mean = capture.left.mean_intensity(),
                    right_mean = capture.right.mean_intensity(),
                    "captured stereo pair"
                );
                Some(capture)
            }
            Err(e) => {
                tracing::debug!(error = %e, "view retrieval failed");
                None
            }
        }
    }

    fn retrieve_views(&mut self) -> Result<CaptureResult, CameraError> {
        Ok(CaptureResult {
            left: self.camera.retrieve_view(View::Left)?,
            right: self.camera.retrieve_view(View::Right)?,
            depth: self.camera.retrieve_view(View::Depth)?,
        })
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zedm_hw::sim::SimCall;
    use zedm_hw::{Fps, Resolution, SettingValue, SimulatedCamera, VideoSetting};

    fn small_camera() -> SimulatedCamera {
        SimulatedCamera::new().with_downscale(8)
    }

    #[test]
    fn test_open_all_modes() {
        for resolution in Resolution::ALL {
            for fps in Fps::ALL {
                let config = CameraConfig {
                    fps,
                    resolution,
                    ..CameraConfig::default()
                };
                let session = Session::open(small_camera(), config).unwrap();
                let opened = session.camera().opened_with().unwrap();
                assert_eq!((opened.resolution, opened.fps), (resolution, fps));
            }
        }
    }

    #[test]
    fn test_open_absent_device() {
        for fps in Fps::ALL {
            let config = CameraConfig {
                fps,
                ..CameraConfig::default()
            };
            let err = Session::open(SimulatedCamera::absent(), config).err().unwrap();
            assert!(matches!(err, SessionError::DeviceInit(CameraError::NoDevice)));
        }
    }

    #[test]
    fn test_unset_settings_sent_as_auto() {
        let session = Session::open(small_camera(), CameraConfig::default()).unwrap();
        let written = session.camera().settings_written();
        assert_eq!(written.len(), 7);
        for setting in VideoSetting::ALL {
            assert!(written.contains(&(setting, SettingValue::Auto)), "{setting} not auto");
        }
    }

    #[test]
    fn test_set_values_pass_through() {
        let config = CameraConfig {
            brightness: Some(1),
            contrast: Some(7),
            hue: Some(11),
            gamma: Some(2),
            exposure: Some(99),
            saturation: Some(5),
            sharpness: Some(3),
            ..CameraConfig::default()
        };
        let session = Session::open(small_camera(), config.clone()).unwrap();
        let written = session.camera().settings_written();
        for setting in VideoSetting::ALL {
            let expected = SettingValue::Manual(config.tuning(setting).unwrap());
            assert!(written.contains(&(setting, expected)), "{setting} not passed through");
        }
    }

    #[test]
    fn test_settings_applied_after_open_before_grab() {
        let config = CameraConfig {
            resolution: Resolution::Vga,
            ..CameraConfig::default()
        };
        let mut session = Session::open(small_camera(), config).unwrap();
        session.capture_once().unwrap();
        let calls = session.camera().calls();
        assert!(matches!(calls[0], SimCall::Open(_)));
        assert!(calls[1..8]
            .iter()
            .all(|c| matches!(c, SimCall::SetVideoSetting(..))));
        assert_eq!(calls[8], SimCall::Grab);
    }

    #[test]
    fn test_capture_once_retrieves_three_views() {
        let config = CameraConfig {
            resolution: Resolution::Vga,
            ..CameraConfig::default()
        };
        let mut session = Session::open(small_camera(), config).unwrap();
        let capture = session.capture_once().unwrap();
        assert_eq!((capture.left.width, capture.left.height), (84, 47));
        assert_eq!(capture.right.width, capture.left.width);
        assert_eq!(capture.depth.height, capture.left.height);

        let retrieved: Vec<_> = session
            .camera()
            .calls()
            .iter()
            .filter_map(|c| match c {
                SimCall::RetrieveView(v) => Some(*v),
                _ => None,
            })
            .collect();
        assert_eq!(retrieved, vec![View::Left, View::Right, View::Depth]);
    }

    #[test]
    fn test_capture_once_drops_warmup_frames() {
        let config = CameraConfig {
            resolution: Resolution::Vga,
            warmup_frames: 2,
            ..CameraConfig::default()
        };
        let mut session = Session::open(small_camera(), config).unwrap();
        // Two dropped frames, then the kept one
        assert_eq!(session.capture_once().unwrap().left.sequence, 3);

        let config = CameraConfig {
            resolution: Resolution::Vga,
            warmup_frames: 0,
            ..CameraConfig::default()
        };
        let mut session = Session::open(small_camera(), config).unwrap();
        assert_eq!(session.capture_once().unwrap().left.sequence, 1);
    }

    #[test]
    fn test_capture_once_grab_failure() {
        let camera = small_camera().with_failing_grabs();
        let mut session = Session::open(camera, CameraConfig::default()).unwrap();
        // Grab failure must not take the session down
        assert!(session.capture_once().is_none());
        assert!(session.capture_once().is_none());
        assert!(!session
            .camera()
            .calls()
            .iter()
            .any(|c| matches!(c, SimCall::RetrieveView(_))));
    }
}
