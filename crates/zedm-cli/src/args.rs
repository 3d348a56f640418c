use clap::{Parser, ValueEnum};
use zedm_core::CameraConfig;
use zedm_hw::{Fps, Resolution};

#[derive(Parser, Debug)]
#[command(
    name = "zedm-tester",
    infer_long_args = true,
    about = "Tool kit for checking out a ZED stereo camera: captures one image on each \
             image sensor and shows them side-by-side. Press any key to close the images."
)]
pub struct Cli {
    /// If set, camera brightness will be set to the specified value
    #[arg(short = 'b', long, value_parser = clap::value_parser!(i32).range(1..=7))]
    pub brightness: Option<i32>,

    /// Contrast control
    #[arg(short = 'c', long, value_parser = clap::value_parser!(i32).range(1..=7))]
    pub contrast: Option<i32>,

    /// Hue of the image
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=11))]
    pub hue: Option<i32>,

    /// Gamma of the image
    #[arg(short = 'g', long, value_parser = clap::value_parser!(i32).range(2..=9))]
    pub gamma: Option<i32>,

    /// Exposure (shutter speed) as a percentage of the frame time
    #[arg(short = 'e', long, value_parser = clap::value_parser!(i32).range(1..=99))]
    pub exposure: Option<i32>,

    /// Digital sharpening amount (also accepted as -sh)
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=7))]
    pub sharpness: Option<i32>,

    /// Saturation control (also accepted as -sa)
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=7))]
    pub saturation: Option<i32>,

    /// Capture frame rate; the higher the frame rate the lower the usable resolution
    #[arg(long, default_value = "60", value_parser = parse_fps)]
    pub fps: Fps,

    /// Capture resolution
    #[arg(short = 'r', long, value_enum, default_value_t = ResolutionArg::Hd1080)]
    pub resolution: ResolutionArg,

    /// V4L2 device path (default: $ZEDM_CAMERA_DEVICE, then the first detected camera)
    #[arg(short = 'd', long)]
    pub device: Option<String>,

    /// Show the depth view as a third panel
    #[arg(long)]
    pub depth: bool,

    /// Use a simulated camera instead of real hardware
    #[arg(long)]
    pub simulate: bool,

    /// List detected stereo cameras and exit
    #[arg(long)]
    pub list_devices: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionArg {
    Hd2k,
    Hd1080,
    Hd720,
    Vga,
}

impl From<ResolutionArg> for Resolution {
    fn from(arg: ResolutionArg) -> Self {
        match arg {
            ResolutionArg::Hd2k => Resolution::Hd2k,
            ResolutionArg::Hd1080 => Resolution::Hd1080,
            ResolutionArg::Hd720 => Resolution::Hd720,
            ResolutionArg::Vga => Resolution::Vga,
        }
    }
}

fn parse_fps(s: &str) -> Result<Fps, String> {
    s.parse()
}

/// Rewrite the single-dash multi-letter options into their long forms.
///
/// `-sh 3` and `-sh=3` both become `--sharpness ...`; likewise `-sa`.
pub fn normalize_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    args.into_iter()
        .map(|arg| {
            for (short, long) in [("-sh", "--sharpness"), ("-sa", "--saturation")] {
                if arg == short {
                    return long.to_string();
                }
                if let Some(value) = arg.strip_prefix(short).and_then(|r| r.strip_prefix('=')) {
                    return format!("{long}={value}");
                }
            }
            arg
        })
        .collect()
}

impl Cli {
    /// Parse the process arguments, accepting `-sh` / `-sa`.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args()))
    }

    /// Build the camera configuration. `default_device` fills in a missing `--device`.
    pub fn camera_config(
        &self,
        default_device: Option<String>,
        warmup_frames: usize,
    ) -> CameraConfig {
        CameraConfig {
            fps: self.fps,
            resolution: self.resolution.into(),
            device_path: self.device.clone().or(default_device),
            brightness: self.brightness,
            contrast: self.contrast,
            hue: self.hue,
            gamma: self.gamma,
            exposure: self.exposure,
            saturation: self.saturation,
            sharpness: self.sharpness,
            show_depth: self.depth,
            warmup_frames,
        }
    }
}
