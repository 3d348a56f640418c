//! Tuning parameters and capture modes shared by every backend.

use std::fmt;
use std::str::FromStr;

/// Device-level image-quality setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoSetting {
    Brightness,
    Contrast,
    Hue,
    Saturation,
    Sharpness,
    Gamma,
    /// Exposure as a percentage of the frame period.
    Exposure,
}

impl VideoSetting {
    /// Every setting, in the order the session applies them.
    pub const ALL: [VideoSetting; 7] = [
        VideoSetting::Brightness,
        VideoSetting::Contrast,
        VideoSetting::Hue,
        VideoSetting::Gamma,
        VideoSetting::Exposure,
        VideoSetting::Saturation,
        VideoSetting::Sharpness,
    ];

    pub fn name(self) -> &'static str {
        match self {
            VideoSetting::Brightness => "brightness",
            VideoSetting::Contrast => "contrast",
            VideoSetting::Hue => "hue",
            VideoSetting::Saturation => "saturation",
            VideoSetting::Sharpness => "sharpness",
            VideoSetting::Gamma => "gamma",
            VideoSetting::Exposure => "exposure",
        }
    }
}

impl fmt::Display for VideoSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value written for a [`VideoSetting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingValue {
    /// Restore the device default (or automatic mode where one exists).
    Auto,
    /// Exact value, passed to the device unmodified.
    Manual(i32),
}

impl From<Option<i32>> for SettingValue {
    fn from(value: Option<i32>) -> Self {
        match value {
            Some(v) => SettingValue::Manual(v),
            None => SettingValue::Auto,
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Auto => f.write_str("auto"),
            SettingValue::Manual(v) => write!(f, "{v}"),
        }
    }
}

/// Capture resolution preset. Dimensions are per eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Hd2k,
    Hd1080,
    Hd720,
    Vga,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::Hd2k,
        Resolution::Hd1080,
        Resolution::Hd720,
        Resolution::Vga,
    ];

    /// Width and height of a single eye.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::Hd2k => (2208, 1242),
            Resolution::Hd1080 => (1920, 1080),
            Resolution::Hd720 => (1280, 720),
            Resolution::Vga => (672, 376),
        }
    }

    /// Name used in device profiles.
    pub fn key(self) -> &'static str {
        match self {
            Resolution::Hd2k => "hd2k",
            Resolution::Hd1080 => "hd1080",
            Resolution::Hd720 => "hd720",
            Resolution::Vga => "vga",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "{} ({w}x{h})", self.key())
    }
}

/// Capture frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fps {
    F15,
    F30,
    F60,
    F100,
}

impl Fps {
    pub const ALL: [Fps; 4] = [Fps::F15, Fps::F30, Fps::F60, Fps::F100];

    pub fn value(self) -> u32 {
        match self {
            Fps::F15 => 15,
            Fps::F30 => 30,
            Fps::F60 => 60,
            Fps::F100 => 100,
        }
    }

    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.value() == value)
    }
}

impl fmt::Display for Fps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl FromStr for Fps {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .ok()
            .and_then(Fps::from_value)
            .ok_or_else(|| format!("invalid fps '{s}' (expected one of 15, 30, 60, 100)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_parse() {
        assert_eq!("15".parse::<Fps>(), Ok(Fps::F15));
        assert_eq!(" 100 ".parse::<Fps>(), Ok(Fps::F100));
        assert!("25".parse::<Fps>().is_err());
        assert!("sixty".parse::<Fps>().is_err());
    }

    #[test]
    fn test_setting_value_from_option() {
        assert_eq!(SettingValue::from(None), SettingValue::Auto);
        assert_eq!(SettingValue::from(Some(4)), SettingValue::Manual(4));
    }

    #[test]
    fn test_all_settings_distinct() {
        let mut names: Vec<_> = VideoSetting::ALL.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 7);
    }

    #[test]
    fn test_vga_dimensions() {
        assert_eq!(Resolution::Vga.dimensions(), (672, 376));
    }
}
