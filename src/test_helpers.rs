//! Shared test utilities for building raster fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let a = raster(2, 1, &[[0, 0, 0, 255], [255, 255, 255, 255]]);
//! let b = noise_raster(64, 48, 7);
//! assert_eq!(pixels_of(&a).len(), 2);
//! ```

use crate::exchange::RasterBuffer;
use image::{Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Raster builders
// =========================================================================

/// Build a buffer from row-major RGBA quadruples. Panics on a count mismatch.
pub fn raster(width: u32, height: u32, pixels: &[[u8; 4]]) -> RasterBuffer {
    assert_eq!(
        pixels.len(),
        (width * height) as usize,
        "{width}x{height} needs {} pixels, got {}",
        width * height,
        pixels.len()
    );
    RasterBuffer::new(width, height, pixels.concat())
}

/// Deterministic pseudo-random image, roughly one pixel in eight transparent.
///
/// Channel values are drawn from a small range so that equal brightness
/// ties are common.
pub fn noise_raster(width: u32, height: u32, seed: u64) -> RasterBuffer {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    let mut next = move || {
        // xorshift64*
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        (state.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
    };
    let pixels: Vec<[u8; 4]> = (0..width * height)
        .map(|_| {
            let r = (next() % 16 * 17) as u8;
            let g = (next() % 16 * 17) as u8;
            let b = (next() % 16 * 17) as u8;
            let a = if next() % 8 == 0 {
                (next() % 11) as u8
            } else {
                11 + (next() % 245) as u8
            };
            [r, g, b, a]
        })
        .collect();
    raster(width, height, &pixels)
}

/// Split a buffer back into row-major RGBA quadruples.
pub fn pixels_of(buffer: &RasterBuffer) -> Vec<[u8; 4]> {
    buffer
        .data
        .chunks_exact(4)
        .map(|px| [px[0], px[1], px[2], px[3]])
        .collect()
}

// =========================================================================
// Image files
// =========================================================================

/// Write a gradient PNG of the given size.
pub fn write_gradient_png(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 96, 255])
    });
    img.save(path).unwrap();
}

/// Write a PNG filled with a single colour.
pub fn write_solid_png(path: &Path, width: u32, height: u32, color: [u8; 4]) {
    RgbaImage::from_pixel(width, height, Rgba(color))
        .save(path)
        .unwrap();
}
