use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use zedm_core::{RunError, RunOutcome};
use zedm_hw::profiles::list_profiles;
use zedm_hw::{SimulatedCamera, StereoCamera, UvcStereoCamera};

mod args;
mod config;
mod viewer;

use args::Cli;
use config::Config;
use viewer::WindowPresenter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse_normalized();
    let env = Config::from_env();

    if cli.list_devices {
        let devices = UvcStereoCamera::list_devices();
        if devices.is_empty() {
            println!("No stereo cameras detected (supported: {})", supported_models());
        }
        for dev in devices {
            println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
        }
        return Ok(());
    }

    let camera_config = cli.camera_config(env.camera_device, env.warmup_frames);
    let camera: Box<dyn StereoCamera> = if cli.simulate {
        Box::new(SimulatedCamera::new())
    } else {
        Box::new(UvcStereoCamera::new())
    };

    let mut presenter = WindowPresenter::new(env.window_title);
    finish(zedm_core::run(camera, camera_config, &mut presenter))
}

/// Map a run result onto the process result. A failed grab is not an error.
fn finish(result: Result<RunOutcome, RunError>) -> Result<()> {
    match result {
        Ok(RunOutcome::Displayed) => tracing::info!("viewer dismissed"),
        Ok(RunOutcome::GrabFailed) => tracing::debug!("grab failed, nothing to show"),
        Err(RunError::Session(e)) => return Err(e.into()),
        Err(RunError::Present(e)) => return Err(e).context("failed to display images"),
    }
    Ok(())
}

/// Model names from the embedded profile database, comma separated.
fn supported_models() -> String {
    list_profiles()
        .iter()
        .map(|p| format!("{} {:04x}:{:04x}", p.device.name, p.device.vendor_id, p.device.product_id))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use zedm_core::{PresentError, SessionError};
    use zedm_hw::CameraError;

    #[test]
    fn test_grab_failure_exits_cleanly() {
        assert!(finish(Ok(RunOutcome::GrabFailed)).is_ok());
        assert!(finish(Ok(RunOutcome::Displayed)).is_ok());
    }

    #[test]
    fn test_device_init_failure_is_error() {
        let err = finish(Err(RunError::Session(SessionError::DeviceInit(
            CameraError::NoDevice,
        ))))
        .unwrap_err();
        assert!(err.to_string().contains("camera failed to initialize"));
    }

    #[test]
    fn test_viewer_failure_is_error() {
        let err = finish(Err(RunError::Present(PresentError::Viewer("no display".into()))))
            .unwrap_err();
        assert_eq!(err.to_string(), "failed to display images");
    }

    #[test]
    fn test_supported_models_lists_profiles() {
        let models = supported_models();
        assert!(models.contains("2b03:f582"));
        assert!(models.contains("2b03:f682"));
    }
}
