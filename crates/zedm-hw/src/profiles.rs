//! Stereo camera profile database.
//!
//! Maps camera USB VID:PID to the capture modes the firmware supports.
//! Profile files are embedded at compile time from `contrib/hw/*.toml`.

use crate::settings::{Fps, Resolution};
use serde::Deserialize;
use std::sync::OnceLock;

const PROFILE_2B03_F582: &str = include_str!("../../../contrib/hw/2b03-f582.toml");
const PROFILE_2B03_F682: &str = include_str!("../../../contrib/hw/2b03-f682.toml");

static PROFILE_DB: OnceLock<Vec<CameraProfile>> = OnceLock::new();

/// Top-level profile file structure (one per `contrib/hw/*.toml`).
#[derive(Debug, Clone, Deserialize)]
pub struct CameraProfile {
    pub device: DeviceIds,
    #[serde(rename = "mode")]
    pub modes: Vec<ModeInfo>,
}

/// Camera identification fields from the `[device]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceIds {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: String,
}

/// One `[[mode]]` entry: a resolution and the frame rates it runs at.
#[derive(Debug, Clone, Deserialize)]
pub struct ModeInfo {
    pub resolution: String,
    pub fps: Vec<u32>,
}

impl CameraProfile {
    /// Frame rates supported at `resolution`, ascending.
    pub fn supported_fps(&self, resolution: Resolution) -> Vec<u32> {
        let mut rates: Vec<u32> = self
            .modes
            .iter()
            .filter(|m| m.resolution == resolution.key())
            .flat_map(|m| m.fps.iter().copied())
            .collect();
        rates.sort_unstable();
        rates.dedup();
        rates
    }

    /// The supported frame rate nearest to `fps` at `resolution`.
    ///
    /// Ties resolve to the higher rate. Returns `None` when the resolution
    /// is not listed at all.
    pub fn closest_fps(&self, resolution: Resolution, fps: Fps) -> Option<u32> {
        let wanted = fps.value();
        self.supported_fps(resolution)
            .into_iter()
            .min_by_key(|&rate| (rate.abs_diff(wanted), std::cmp::Reverse(rate)))
    }
}

fn profile_db() -> &'static Vec<CameraProfile> {
    PROFILE_DB.get_or_init(|| {
        let mut db = Vec::new();
        for src in [PROFILE_2B03_F582, PROFILE_2B03_F682] {
            match toml::from_str::<CameraProfile>(src) {
                Ok(p) => db.push(p),
                Err(e) => tracing::error!(error = %e, "bad camera profile TOML"),
            }
        }
        db
    })
}

/// Look up a profile by USB vendor:product ID.
pub fn lookup_profile(vid: u16, pid: u16) -> Option<&'static CameraProfile> {
    profile_db()
        .iter()
        .find(|p| p.device.vendor_id == vid && p.device.product_id == pid)
}

/// All known profiles.
pub fn list_profiles() -> &'static [CameraProfile] {
    profile_db()
}

/// Read USB VID:PID from sysfs for a `/dev/videoN` device.
///
/// Returns `None` if the device is not USB or sysfs is unavailable.
pub fn get_usb_ids(device_path: &str) -> Option<(u16, u16)> {
    // /dev/video2 → "video2"
    let dev_name = std::path::Path::new(device_path).file_name()?.to_str()?;
    // /sys/class/video4linux/video2/device links to the USB interface dir
    let device_link = format!("/sys/class/video4linux/{dev_name}/device");
    let interface_dir = std::fs::canonicalize(&device_link).ok()?;
    let usb_device_dir = interface_dir.parent()?;

    let vid_str = std::fs::read_to_string(usb_device_dir.join("idVendor")).ok()?;
    let pid_str = std::fs::read_to_string(usb_device_dir.join("idProduct")).ok()?;

    let vid = u16::from_str_radix(vid_str.trim(), 16).ok()?;
    let pid = u16::from_str_radix(pid_str.trim(), 16).ok()?;
    Some((vid, pid))
}
