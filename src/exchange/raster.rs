//! Raw RGBA8 raster buffers and the exchange error taxonomy.
//!
//! A [`RasterBuffer`] is nothing more than a width, a height, and a row-major
//! byte vector with four bytes per pixel. It deliberately carries no colour
//! space, no premultiplication flag, and no decoder state: decoding and
//! resizing happen upstream in [`canvas`](crate::canvas).

use image::RgbaImage;
use thiserror::Error;

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Dimension mismatch: image A is {a_width}x{a_height}, image B is {b_width}x{b_height}")]
    DimensionMismatch {
        a_width: u32,
        a_height: u32,
        b_width: u32,
        b_height: u32,
    },
    #[error("Buffer length mismatch for {width}x{height}: expected {expected} bytes, got {actual}")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("Dimensions {width}x{height} overflow the addressable buffer size")]
    DimensionOverflow { width: u32, height: u32 },
    #[error("Exchange worker exited without producing a result")]
    WorkerLost,
    #[error("Exchange result was already taken from this task")]
    ResultTaken,
}

/// Row-major RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RasterBuffer {
    /// Wrap raw bytes. The length is checked by [`validate`](Self::validate),
    /// not here, so callers can build deliberately malformed buffers.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// A zero-filled (fully transparent black) buffer.
    pub fn blank(width: u32, height: u32) -> Result<Self, ExchangeError> {
        let len = byte_len(width, height)?;
        Ok(Self::new(width, height, vec![0; len]))
    }

    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Total pixel count, `width × height`.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// RGBA quadruple at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = y as usize * self.stride() + x as usize * CHANNELS;
        let px = self.data.get(i..i + CHANNELS)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Check that `data` holds exactly `width × height × 4` bytes.
    pub fn validate(&self) -> Result<(), ExchangeError> {
        let expected = byte_len(self.width, self.height)?;
        if self.data.len() != expected {
            return Err(ExchangeError::BufferLength {
                width: self.width,
                height: self.height,
                expected,
                actual: self.data.len(),
            });
        }
        Ok(())
    }

    pub fn into_rgba_image(self) -> Result<RgbaImage, ExchangeError> {
        self.validate()?;
        let (width, height) = (self.width, self.height);
        RgbaImage::from_raw(width, height, self.data)
            .ok_or(ExchangeError::DimensionOverflow { width, height })
    }
}

impl From<RgbaImage> for RasterBuffer {
    fn from(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(width, height, img.into_raw())
    }
}

/// `width × height × 4`, failing instead of wrapping.
fn byte_len(width: u32, height: u32) -> Result<usize, ExchangeError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(ExchangeError::DimensionOverflow { width, height })
}
