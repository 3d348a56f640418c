//! Frame buffers and pixel conversions — YUYV decode, side-by-side split, concatenation.

use image::GrayImage;

/// Channel count of every view a backend hands out (RGBA).
pub const VIEW_CHANNELS: u8 = 4;

/// A captured image buffer.
#[derive(Clone)]
pub struct Frame {
    /// Interleaved row-major pixel data (width * height * channels bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// Wrap an existing buffer, checking its length against the geometry.
    pub fn from_raw(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
        sequence: u32,
    ) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
            timestamp: std::time::Instant::now(),
            sequence,
        })
    }

    /// Zero-filled frame.
    pub fn blank(width: u32, height: u32, channels: u8) -> Self {
        Self {
            data: vec![0; width as usize * height as usize * channels as usize],
            width,
            height,
            channels,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        }
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Pixel at (x, y) as a channel slice.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let c = self.channels as usize;
        let start = y as usize * self.stride() + x as usize * c;
        &self.data[start..start + c]
    }

    /// Average intensity over all channels (0.0–255.0).
    pub fn mean_intensity(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&b| b as f32).sum::<f32>() / self.data.len() as f32
    }

    /// Luma plane of this frame (alpha ignored).
    pub fn to_gray(&self) -> GrayImage {
        let c = self.channels as usize;
        let luma: Vec<u8> = self
            .data
            .chunks_exact(c)
            .map(|px| {
                if c >= 3 {
                    rgb_to_luma(px[0], px[1], px[2])
                } else {
                    px[0]
                }
            })
            .collect();
        // Length is width * height by construction.
        GrayImage::from_raw(self.width, self.height, luma)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// Expand a grayscale image to an RGBA frame.
    pub fn from_gray(gray: &GrayImage, sequence: u32) -> Self {
        let mut data = Vec::with_capacity(gray.as_raw().len() * VIEW_CHANNELS as usize);
        for &v in gray.as_raw() {
            data.extend_from_slice(&[v, v, v, 255]);
        }
        Self {
            data,
            width: gray.width(),
            height: gray.height(),
            channels: VIEW_CHANNELS,
            timestamp: std::time::Instant::now(),
            sequence,
        }
    }
}

fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Convert packed YUYV (4:2:2) to RGBA using BT.601 integer coefficients.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V].
pub fn yuyv_to_rgba(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>, FrameError> {
    let pixels = width as usize * height as usize;
    let expected = pixels * 2;
    if yuyv.len() < expected || width % 2 != 0 {
        return Err(FrameError::InvalidLength {
            expected,
            actual: yuyv.len(),
        });
    }

    let mut rgba = Vec::with_capacity(pixels * 4);
    for quad in yuyv[..expected].chunks_exact(4) {
        let u = quad[1] as i32 - 128;
        let v = quad[3] as i32 - 128;
        for y in [quad[0], quad[2]] {
            let c = (y as i32 - 16).max(0) * 298;
            let r = (c + 409 * v + 128) >> 8;
            let g = (c - 100 * u - 208 * v + 128) >> 8;
            let b = (c + 516 * u + 128) >> 8;
            rgba.extend_from_slice(&[clamp_u8(r), clamp_u8(g), clamp_u8(b), 255]);
        }
    }
    Ok(rgba)
}

/// Split a side-by-side stereo frame into its left and right halves.
pub fn split_side_by_side(frame: &Frame) -> Result<(Frame, Frame), FrameError> {
    if frame.width % 2 != 0 {
        return Err(FrameError::OddWidth(frame.width));
    }
    let half = frame.width / 2;
    let row_bytes = half as usize * frame.channels as usize;
    let stride = frame.stride();

    let mut left = Vec::with_capacity(row_bytes * frame.height as usize);
    let mut right = Vec::with_capacity(row_bytes * frame.height as usize);
    for row in frame.data.chunks_exact(stride) {
        left.extend_from_slice(&row[..row_bytes]);
        right.extend_from_slice(&row[row_bytes..]);
    }

    let make = |data| Frame {
        data,
        width: half,
        height: frame.height,
        channels: frame.channels,
        timestamp: frame.timestamp,
        sequence: frame.sequence,
    };
    Ok((make(left), make(right)))
}

/// Concatenate frames along the horizontal axis.
///
/// All frames must share height and channel count. The result has the
/// summed width and the common height.
pub fn hconcat(frames: &[&Frame]) -> Result<Frame, FrameError> {
    let first = frames.first().ok_or(FrameError::Empty)?;
    for f in &frames[1..] {
        if f.height != first.height {
            return Err(FrameError::HeightMismatch {
                expected: first.height,
                actual: f.height,
            });
        }
        if f.channels != first.channels {
            return Err(FrameError::ChannelMismatch {
                expected: first.channels,
                actual: f.channels,
            });
        }
    }

    let width: u32 = frames.iter().map(|f| f.width).sum();
    let mut data = Vec::with_capacity(width as usize * first.height as usize * first.channels as usize);
    for y in 0..first.height as usize {
        for f in frames {
            let stride = f.stride();
            data.extend_from_slice(&f.data[y * stride..(y + 1) * stride]);
        }
    }

    Ok(Frame {
        data,
        width,
        height: first.height,
        channels: first.channels,
        timestamp: first.timestamp,
        sequence: first.sequence,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid buffer length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("height mismatch: expected {expected}, got {actual}")]
    HeightMismatch { expected: u32, actual: u32 },
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: u8, actual: u8 },
    #[error("side-by-side frame has odd width {0}")]
    OddWidth(u32),
    #[error("no frames to concatenate")]
    Empty,
}
