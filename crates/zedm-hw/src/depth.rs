//! Depth visualization from a stereo pair by block matching.
//!
//! Works on a downscaled grayscale copy of each eye. For every pixel of the
//! left image the right image is searched along the same row for the
//! window with the smallest sum of absolute differences; the winning offset
//! is the disparity. Disparities are normalised to 0–255 so that near
//! objects come out bright, then upscaled back to view resolution.

use crate::frame::Frame;
use image::imageops::{self, FilterType};
use image::GrayImage;

/// Width the pair is downscaled to before matching.
const WORK_WIDTH: u32 = 320;

/// Half-size of the square matching window.
const WINDOW_RADIUS: u32 = 3;

/// Disparity map at working resolution, one byte per pixel.
pub fn disparity_map(left: &GrayImage, right: &GrayImage, max_disparity: u32) -> GrayImage {
    let (w, h) = left.dimensions();
    let mut out = GrayImage::new(w, h);
    if right.dimensions() != (w, h) || max_disparity == 0 {
        return out;
    }

    let r = WINDOW_RADIUS;
    if w <= 2 * r || h <= 2 * r {
        return out;
    }

    let mut best_disp = vec![0u32; (w * h) as usize];
    for y in r..h - r {
        for x in r..w - r {
            let mut best_cost = u32::MAX;
            let mut best_d = 0;
            let search = max_disparity.min(x - r);
            for d in 0..=search {
                let mut cost = 0u32;
                for wy in y - r..=y + r {
                    for wx in x - r..=x + r {
                        let a = left.get_pixel(wx, wy)[0] as i32;
                        let b = right.get_pixel(wx - d, wy)[0] as i32;
                        cost += a.abs_diff(b);
                    }
                    if cost >= best_cost {
                        break;
                    }
                }
                if cost < best_cost {
                    best_cost = cost;
                    best_d = d;
                }
            }
            best_disp[(y * w + x) as usize] = best_d;
        }
    }

    for (i, px) in out.pixels_mut().enumerate() {
        px[0] = ((best_disp[i] * 255) / max_disparity).min(255) as u8;
    }
    out
}

/// Build the RGBA depth view for a rectified pair.
///
/// The result has the same geometry as `left`.
pub fn depth_view(left: &Frame, right: &Frame, max_disparity: u32) -> Frame {
    let (w, h) = (left.width, left.height);
    if w == 0 || h == 0 {
        return Frame::blank(w, h, crate::frame::VIEW_CHANNELS);
    }

    let work_w = WORK_WIDTH.min(w);
    let work_h = ((h as u64 * work_w as u64) / w as u64).max(1) as u32;

    let small_left = imageops::resize(&left.to_gray(), work_w, work_h, FilterType::Triangle);
    let small_right = imageops::resize(&right.to_gray(), work_w, work_h, FilterType::Triangle);

    let disp = disparity_map(&small_left, &small_right, max_disparity);
    let full = imageops::resize(&disp, w, h, FilterType::Nearest);

    tracing::debug!(work_w, work_h, max_disparity, "computed depth view");
    Frame::from_gray(&full, left.sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic texture with no horizontal repetition inside the search range.
    fn texture(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)).wrapping_mul(2_654_435_761);
            image::Luma([(v >> 24) as u8])
        })
    }

    fn shifted(src: &GrayImage, shift: u32) -> GrayImage {
        let (w, h) = src.dimensions();
        GrayImage::from_fn(w, h, |x, y| *src.get_pixel((x + shift).min(w - 1), y))
    }

    #[test]
    fn test_disparity_recovers_shift() {
        let left = texture(64, 32);
        let right = shifted(&left, 5);
        let disp = disparity_map(&left, &right, 16);
        // right(x - 5) == left(x) in the interior, so disparity 5 → 5 * 255 / 16
        let expected = (5 * 255 / 16) as u8;
        assert_eq!(disp.get_pixel(40, 16)[0], expected);
    }

    #[test]
    fn test_disparity_identical_images_is_zero() {
        let img = texture(40, 20);
        let disp = disparity_map(&img, &img, 8);
        assert!(disp.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_disparity_mismatched_sizes_is_black() {
        let disp = disparity_map(&texture(10, 10), &texture(12, 10), 4);
        assert!(disp.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_depth_view_matches_geometry() {
        let left = Frame::from_gray(&texture(100, 40), 9);
        let right = Frame::from_gray(&shifted(&texture(100, 40), 2), 9);
        let view = depth_view(&left, &right, 8);
        assert_eq!((view.width, view.height, view.channels), (100, 40, 4));
        assert_eq!(view.sequence, 9);
    }
}
