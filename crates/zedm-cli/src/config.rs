/// Tester settings that come from the environment rather than the command line.
pub struct Config {
    /// Default V4L2 device path, used when `--device` is not given.
    pub camera_device: Option<String>,
    /// Viewer window title.
    pub window_title: String,
    /// Frames dropped before the kept one while auto-exposure settles.
    pub warmup_frames: usize,
}

impl Config {
    /// Load configuration from `ZEDM_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            camera_device: lookup("ZEDM_CAMERA_DEVICE").filter(|v| !v.trim().is_empty()),
            window_title: lookup("ZEDM_WINDOW_TITLE").unwrap_or_else(|| "left | right".to_string()),
            warmup_frames: parsed_or(&lookup, "ZEDM_WARMUP_FRAMES", 4),
        }
    }
}

fn parsed_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
