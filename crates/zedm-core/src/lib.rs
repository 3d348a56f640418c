//! zedm-core — Single-shot stereo camera check.
//!
//! Opens a camera session, grabs one frame set and hands the stereo pair
//! to a [`Presenter`]. The camera and the viewer are both traits, so the
//! whole flow runs against the simulated device in tests.

pub mod config;
pub mod presenter;
pub mod session;

pub use config::CameraConfig;
pub use presenter::{present, PresentError, Presenter};
pub use session::{CaptureResult, Session, SessionError};

use thiserror::Error;
use zedm_hw::StereoCamera;

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Present(#[from] PresentError),
}

/// How a run ended when nothing fatal happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The pair was shown and the user dismissed it.
    Displayed,
    /// The grab failed; nothing was shown.
    GrabFailed,
}

/// Open the camera, grab once and show the result.
pub fn run<C, P>(camera: C, config: CameraConfig, presenter: &mut P) -> Result<RunOutcome, RunError>
where
    C: StereoCamera,
    P: Presenter + ?Sized,
{
    let mut session = Session::open(camera, config)?;

    let Some(capture) = session.capture_once() else {
        return Ok(RunOutcome::GrabFailed);
    };

    present(presenter, &capture, session.config().show_depth)?;
    Ok(RunOutcome::Displayed)
}
