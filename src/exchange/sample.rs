//! Pixel extraction: raw RGBA bytes → brightness-tagged samples.

use super::raster::{CHANNELS, RasterBuffer};

/// Pixels with alpha at or below this value are treated as transparent.
pub const OPACITY_THRESHOLD: u8 = 10;

/// One visible pixel plus its cached brightness.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
    pub brightness: f64,
}

impl PixelSample {
    /// Stand-in returned for lookups against an image with no visible pixels.
    pub const SENTINEL: PixelSample = PixelSample {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
        brightness: 0.0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r,
            g,
            b,
            a,
            brightness: brightness(r, g, b),
        }
    }

    pub fn rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Luma approximation `(299r + 587g + 114b) / 1000`.
///
/// The weighted sum is exact in integers; only the final division is
/// floating point, so the result is reproducible across platforms.
#[inline]
pub fn brightness(r: u8, g: u8, b: u8) -> f64 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    weighted as f64 / 1000.0
}

#[inline]
pub fn is_visible(alpha: u8) -> bool {
    alpha > OPACITY_THRESHOLD
}

/// Collect every visible pixel in row-major scan order.
pub fn extract_samples(buffer: &RasterBuffer) -> Vec<PixelSample> {
    buffer
        .data
        .chunks_exact(CHANNELS)
        .filter(|px| is_visible(px[3]))
        .map(|px| PixelSample::new(px[0], px[1], px[2], px[3]))
        .collect()
}

/// Number of visible pixels, without materialising samples.
pub fn visible_count(buffer: &RasterBuffer) -> usize {
    buffer
        .data
        .chunks_exact(CHANNELS)
        .filter(|px| is_visible(px[3]))
        .count()
}
