//! # Pixel Rebirth
//!
//! True 1:1 pixel exchange between two images. Each image is rebuilt using
//! only the other image's pixels, placed by brightness rank: the darkest
//! visible pixel of A is replaced by the darkest visible pixel of B, the
//! median by the median, and so on. No averaging, no blending, no
//! interpolation. Every visible output pixel is a byte-for-byte copy.
//!
//! # Architecture: Three-Stage Core
//!
//! ```text
//! 1. Extract   raw RGBA   →  visible samples + brightness
//! 2. Index     samples    →  stable-sorted, tiled to width × height
//! 3. Rebuild   raw RGBA   →  rank in own index → pixel from other index
//! ```
//!
//! Each stage is a pure function of the previous stage's output. The core
//! ([`exchange`]) touches no files and holds no state between calls; the
//! surrounding modules decode inputs, fit them onto a shared canvas, and
//! write the results.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`exchange`] | The pixel exchange engine: extraction, indexing, reconstruction |
//! | [`canvas`] | Decoding, letterbox/stretch fitting, lossless encoding |
//! | [`config`] | `pixel-rebirth.toml` loading, merging over defaults, validation |
//! | [`run`] | End-to-end pipeline with progress events and a JSON-ready report |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Brightness, Not Colour
//!
//! Pixels are ranked by the fixed luma approximation
//! `(299r + 587g + 114b) / 1000`. It is not perceptually calibrated; it only
//! needs to be cheap, deterministic, and identical for both images.
//!
//! ## Tiling the Shorter Side
//!
//! Transparent pixels (alpha ≤ 10) are dropped before indexing, so the two
//! indices can differ in length. Both are grown to the full canvas pixel
//! count by appending prefixes of themselves. See [`exchange::index`].
//!
//! ## Shared Canvas
//!
//! The engine requires equal dimensions and refuses anything else rather than
//! cropping. Getting both images onto one resolution is the job of
//! [`canvas`], which by default letterboxes onto a 1366×768 black canvas.

pub mod canvas;
pub mod config;
pub mod exchange;
pub mod output;
pub mod run;

#[cfg(test)]
pub(crate) mod test_helpers;
