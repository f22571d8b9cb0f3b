//! The pixel exchange engine: pure and synchronous, with no I/O.
//!
//! Two same-sized RGBA8 buffers go in; two rebuilt buffers come out. Each
//! rebuilt image is made exclusively of the *other* image's pixels, placed
//! so that brightness rank is preserved position by position.
//!
//! ```text
//! A ──extract──► samples ──sort+tile──► index A ─┐
//!                                                ├─► rebuild A from B
//! B ──extract──► samples ──sort+tile──► index B ─┤
//!                                                └─► rebuild B from A
//! ```
//!
//! | Stage | Module |
//! |---|---|
//! | Extraction & filtering | [`sample`] |
//! | Sort + tile, rank lookup | [`index`] |
//! | Reconstruction | [`rebuild`] |
//! | Buffers & errors | [`raster`] |
//! | Off-thread execution | [`background`] |
//!
//! The A and B sides of each stage are independent and run under
//! `rayon::join`; reconstruction additionally splits each buffer by rows.
//!
//! ## Degenerate input
//!
//! An image with no visible pixels (all alpha ≤ 10) produces an empty index.
//! Every lookup against it returns [`PixelSample::SENTINEL`], so the *other*
//! rebuilt image comes out fully transparent. This is reported through
//! [`ExchangeStats::is_degenerate`], never as an error.

pub mod background;
pub mod index;
pub mod raster;
pub mod rebuild;
pub mod sample;

pub use background::{ExchangeTask, spawn_exchange};
pub use index::SortedPixelList;
pub use raster::{ExchangeError, RasterBuffer};
pub use sample::{OPACITY_THRESHOLD, PixelSample, brightness, extract_samples, visible_count};

use serde::Serialize;
use std::time::Instant;

/// Both rebuilt images plus counts gathered along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// Image A rebuilt using pixels from image B.
    pub rebuilt_a: RasterBuffer,
    /// Image B rebuilt using pixels from image A.
    pub rebuilt_b: RasterBuffer,
    pub stats: ExchangeStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExchangeStats {
    pub width: u32,
    pub height: u32,
    /// `width × height`, the length every non-empty index is tiled to.
    pub total_pixels: usize,
    pub visible_a: usize,
    pub visible_b: usize,
}

impl ExchangeStats {
    /// True when either image had no visible pixels at all.
    pub fn is_degenerate(&self) -> bool {
        self.total_pixels > 0 && (self.visible_a == 0 || self.visible_b == 0)
    }
}

/// Exchange pixels between `a` and `b`.
///
/// Both buffers must share width and height and hold exactly
/// `width × height × 4` bytes; otherwise an [`ExchangeError`] is returned
/// before any work is done.
pub fn exchange(a: &RasterBuffer, b: &RasterBuffer) -> Result<Exchange, ExchangeError> {
    check_preconditions(a, b)?;

    let total_pixels = a.pixel_count();
    let started = Instant::now();

    let ((index_a, visible_a), (index_b, visible_b)) = rayon::join(
        || build_index(a, total_pixels),
        || build_index(b, total_pixels),
    );
    tracing::debug!(
        visible_a,
        visible_b,
        total_pixels,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "indexed both images"
    );

    let stats = ExchangeStats {
        width: a.width,
        height: a.height,
        total_pixels,
        visible_a,
        visible_b,
    };
    if stats.is_degenerate() {
        tracing::warn!(
            visible_a,
            visible_b,
            "an image has no visible pixels; its counterpart will be rebuilt fully transparent"
        );
    }

    let started = Instant::now();
    let (rebuilt_a, rebuilt_b) = rayon::join(
        || rebuild::rebuild(a, &index_a, &index_b),
        || rebuild::rebuild(b, &index_b, &index_a),
    );
    tracing::debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rebuilt both images"
    );

    Ok(Exchange {
        rebuilt_a: rebuilt_a?,
        rebuilt_b: rebuilt_b?,
        stats,
    })
}

fn check_preconditions(a: &RasterBuffer, b: &RasterBuffer) -> Result<(), ExchangeError> {
    if (a.width, a.height) != (b.width, b.height) {
        return Err(ExchangeError::DimensionMismatch {
            a_width: a.width,
            a_height: a.height,
            b_width: b.width,
            b_height: b.height,
        });
    }
    a.validate()?;
    b.validate()
}

/// Extract, sort and tile one image. Returns the index and its visible count.
fn build_index(buffer: &RasterBuffer, total_pixels: usize) -> (SortedPixelList, usize) {
    let mut index = SortedPixelList::from_samples(extract_samples(buffer));
    let visible = index.len();
    index.tile_to(total_pixels);
    (index, visible)
}
