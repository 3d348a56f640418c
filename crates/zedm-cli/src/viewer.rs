//! minifb viewer window.

use minifb::{KeyRepeat, ScaleMode, Window, WindowOptions};
use std::time::Duration;
use zedm_core::{PresentError, Presenter};
use zedm_hw::Frame;

/// Largest initial window size; bigger images are scaled down to fit.
const MAX_WINDOW: (usize, usize) = (1920, 1080);

/// Shows frames in a desktop window. The window opens on the first render.
pub struct WindowPresenter {
    title: String,
    window: Option<Window>,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl WindowPresenter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            window: None,
            buffer: Vec::new(),
            width: 0,
            height: 0,
        }
    }
}

/// Pack a frame into minifb's 0RGB pixel format.
pub fn to_0rgb(frame: &Frame) -> Vec<u32> {
    let c = frame.channels as usize;
    frame
        .data
        .chunks_exact(c)
        .map(|px| {
            let (r, g, b) = if c >= 3 {
                (px[0], px[1], px[2])
            } else {
                (px[0], px[0], px[0])
            };
            (r as u32) << 16 | (g as u32) << 8 | b as u32
        })
        .collect()
}

/// Window size that keeps the aspect ratio and fits inside [`MAX_WINDOW`].
fn fit_window(width: usize, height: usize) -> (usize, usize) {
    let (max_w, max_h) = MAX_WINDOW;
    if width <= max_w && height <= max_h {
        return (width.max(1), height.max(1));
    }
    let scale = (max_w as f64 / width as f64).min(max_h as f64 / height as f64);
    (
        ((width as f64 * scale) as usize).max(1),
        ((height as f64 * scale) as usize).max(1),
    )
}

impl Presenter for WindowPresenter {
    fn render(&mut self, image: &Frame) -> Result<(), PresentError> {
        self.width = image.width as usize;
        self.height = image.height as usize;
        self.buffer = to_0rgb(image);

        if self.window.is_none() {
            let (win_w, win_h) = fit_window(self.width, self.height);
            let mut window = Window::new(
                &self.title,
                win_w,
                win_h,
                WindowOptions {
                    resize: true,
                    scale_mode: ScaleMode::AspectRatioStretch,
                    ..WindowOptions::default()
                },
            )
            .map_err(|e| PresentError::Viewer(e.to_string()))?;
            window.limit_update_rate(Some(Duration::from_micros(16600)));
            tracing::debug!(win_w, win_h, "viewer window created");
            self.window = Some(window);
        }

        if let Some(window) = self.window.as_mut() {
            window
                .update_with_buffer(&self.buffer, self.width, self.height)
                .map_err(|e| PresentError::Viewer(e.to_string()))?;
        }
        Ok(())
    }

    fn wait_for_dismissal(&mut self) -> Result<(), PresentError> {
        let Some(window) = self.window.as_mut() else {
            return Ok(());
        };

        while window.is_open() {
            if !window.get_keys_pressed(KeyRepeat::No).is_empty() {
                break;
            }
            window
                .update_with_buffer(&self.buffer, self.width, self.height)
                .map_err(|e| PresentError::Viewer(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_0rgb_rgba() {
        let frame = Frame::from_raw(vec![0x12, 0x34, 0x56, 0xff], 1, 1, 4, 0).unwrap();
        assert_eq!(to_0rgb(&frame), vec![0x0012_3456]);
    }

    #[test]
    fn test_to_0rgb_gray() {
        let frame = Frame::from_raw(vec![0x80, 0x01], 2, 1, 1, 0).unwrap();
        assert_eq!(to_0rgb(&frame), vec![0x0080_8080, 0x0001_0101]);
    }

    #[test]
    fn test_fit_window() {
        assert_eq!(fit_window(1344, 376), (1344, 376));
        assert_eq!(fit_window(3840, 1080), (1920, 540));
    }

    #[test]
    fn test_wait_without_window_returns() {
        let mut presenter = WindowPresenter::new("test");
        assert!(presenter.wait_for_dismissal().is_ok());
    }
}
