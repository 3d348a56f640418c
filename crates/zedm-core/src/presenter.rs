//! Frame presentation — side-by-side composition and the viewer seam.

use crate::session::CaptureResult;
use thiserror::Error;
use zedm_hw::frame::{self, FrameError};
use zedm_hw::Frame;

#[derive(Error, Debug)]
pub enum PresentError {
    #[error("cannot compose views: {0}")]
    Compose(#[from] FrameError),
    #[error("viewer error: {0}")]
    Viewer(String),
}

/// A viewer that can display one image and block until the user is done.
pub trait Presenter {
    /// Render `image` in the viewer.
    fn render(&mut self, image: &Frame) -> Result<(), PresentError>;

    /// Block until any key is pressed or the viewer is closed.
    fn wait_for_dismissal(&mut self) -> Result<(), PresentError>;

    /// Concatenate `left` and `right` horizontally and render the result.
    fn show(&mut self, left: &Frame, right: &Frame) -> Result<(), PresentError> {
        let combined = frame::hconcat(&[left, right])?;
        self.render(&combined)
    }
}

/// Display a capture and wait for the user.
///
/// The depth view is only shown, as a third panel, when `show_depth` is set.
pub fn present<P: Presenter + ?Sized>(
    presenter: &mut P,
    capture: &CaptureResult,
    show_depth: bool,
) -> Result<(), PresentError> {
    if show_depth {
        let combined = frame::hconcat(&[&capture.left, &capture.right, &capture.depth])?;
        presenter.render(&combined)?;
    } else {
        presenter.show(&capture.left, &capture.right)?;
    }
    presenter.wait_for_dismissal()
}
