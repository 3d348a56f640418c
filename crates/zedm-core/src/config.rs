use zedm_hw::{Fps, InitParameters, Resolution, RuntimeParameters, SettingValue, VideoSetting};

/// Everything one tester run needs to know about the camera.
///
/// Tuning values left as `None` are sent to the device as
/// [`SettingValue::Auto`]. Values are not range-checked here; the device
/// driver is the authority on what it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    pub fps: Fps,
    pub resolution: Resolution,
    /// Explicit V4L2 device path (first compatible device when `None`).
    pub device_path: Option<String>,
    pub brightness: Option<i32>,
    pub contrast: Option<i32>,
    pub hue: Option<i32>,
    pub gamma: Option<i32>,
    pub exposure: Option<i32>,
    pub saturation: Option<i32>,
    pub sharpness: Option<i32>,
    /// Show the depth view next to the stereo pair.
    pub show_depth: bool,
    /// Frames dropped before the one that is kept, while exposure settles.
    pub warmup_frames: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fps: Fps::F60,
            resolution: Resolution::Hd1080,
            device_path: None,
            brightness: None,
            contrast: None,
            hue: None,
            gamma: None,
            exposure: None,
            saturation: None,
            sharpness: None,
            show_depth: false,
            warmup_frames: RuntimeParameters::default().warmup_frames,
        }
    }
}

impl CameraConfig {
    /// Raw value configured for `setting`.
    pub fn tuning(&self, setting: VideoSetting) -> Option<i32> {
        match setting {
            VideoSetting::Brightness => self.brightness,
            VideoSetting::Contrast => self.contrast,
            VideoSetting::Hue => self.hue,
            VideoSetting::Gamma => self.gamma,
            VideoSetting::Exposure => self.exposure,
            VideoSetting::Saturation => self.saturation,
            VideoSetting::Sharpness => self.sharpness,
        }
    }

    /// All seven settings with the value to write for each.
    pub fn settings(&self) -> [(VideoSetting, SettingValue); 7] {
        VideoSetting::ALL.map(|s| (s, SettingValue::from(self.tuning(s))))
    }

    /// Per-grab options for the single acquisition.
    pub fn runtime_parameters(&self) -> RuntimeParameters {
        RuntimeParameters {
            warmup_frames: self.warmup_frames,
            ..RuntimeParameters::default()
        }
    }

    pub fn init_parameters(&self) -> InitParameters {
        InitParameters {
            resolution: self.resolution,
            fps: self.fps,
            device_path: self.device_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_cli_defaults() {
        let config = CameraConfig::default();
        assert_eq!(config.fps, Fps::F60);
        assert_eq!(config.resolution, Resolution::Hd1080);
        assert!(config.settings().iter().all(|(_, v)| *v == SettingValue::Auto));
        assert_eq!(config.warmup_frames, 4);
    }

    #[test]
    fn test_runtime_parameters_carry_warmup() {
        let config = CameraConfig {
            warmup_frames: 0,
            ..CameraConfig::default()
        };
        let runtime = config.runtime_parameters();
        assert_eq!(runtime.warmup_frames, 0);
        assert!(runtime.enable_depth);
    }

    #[test]
    fn test_settings_pass_values_through() {
        let config = CameraConfig {
            hue: Some(11),
            exposure: Some(99),
            ..CameraConfig::default()
        };
        let settings = config.settings();
        assert!(settings.contains(&(VideoSetting::Hue, SettingValue::Manual(11))));
        assert!(settings.contains(&(VideoSetting::Exposure, SettingValue::Manual(99))));
        assert!(settings.contains(&(VideoSetting::Gamma, SettingValue::Auto)));
    }

    #[test]
    fn test_init_parameters() {
        let config = CameraConfig {
            fps: Fps::F100,
            resolution: Resolution::Vga,
            device_path: Some("/dev/video4".into()),
            ..CameraConfig::default()
        };
        let params = config.init_parameters();
        assert_eq!(params.fps, Fps::F100);
        assert_eq!(params.resolution, Resolution::Vga);
        assert_eq!(params.device_path.as_deref(), Some("/dev/video4"));
    }
}
