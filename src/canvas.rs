//! Decoding and fitting source images onto the working canvas.
//!
//! The exchange engine needs both inputs at one shared resolution. This
//! module gets them there:
//!
//! | Step | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with format sniffing |
//! | Letterbox | [`letterbox_placement`] + `imageops::resize` (Lanczos3) + `imageops::overlay` |
//! | Stretch | `imageops::resize` (Lanczos3) to the exact canvas size |
//! | Encode (PNG, TIFF, WebP lossless) | `RgbaImage::write_to` into memory |
//!
//! ## Fit modes
//!
//! - **Letterbox** (default): the image is scaled to fit entirely inside the
//!   canvas, centred, and composited over an opaque background. Every canvas
//!   pixel ends up opaque, so the padding bars take part in the exchange as
//!   ordinary dark pixels.
//! - **Stretch**: the image is resized to exactly the canvas size, ignoring
//!   aspect ratio. Source transparency survives and is honoured by the
//!   exchange's opacity threshold.

use crate::exchange::{ExchangeError, RasterBuffer};
use image::imageops::{self, FilterType};
use image::{ImageFormat, ImageReader, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Failed to encode {format:?} image: {message}")]
    Encode {
        format: OutputFormat,
        message: String,
    },
    #[error(transparent)]
    Raster(#[from] ExchangeError),
}

/// How a source image is mapped onto the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    #[default]
    Letterbox,
    Stretch,
}

/// Lossless output encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Tiff,
    Webp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Webp => "webp",
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Webp => ImageFormat::WebP,
        }
    }
}

/// Where a letterboxed image lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Calculate the aspect-preserving placement of `source` inside `canvas`.
///
/// A source wider than the canvas aspect spans the full width and is padded
/// top and bottom; anything else spans the full height and is padded left
/// and right. Drawn sizes are rounded and never drop below one pixel.
///
/// ```
/// # use pixel_rebirth::canvas::{letterbox_placement, Placement};
/// // 2:1 panorama on 1366x768 → full width, 683 tall, 42px bars
/// assert_eq!(
///     letterbox_placement((2000, 1000), (1366, 768)),
///     Placement { x: 0, y: 42, width: 1366, height: 683 }
/// );
/// ```
pub fn letterbox_placement(source: (u32, u32), canvas: (u32, u32)) -> Placement {
    let (src_w, src_h) = (source.0.max(1) as f64, source.1.max(1) as f64);
    let (cvs_w, cvs_h) = canvas;

    let src_aspect = src_w / src_h;
    let cvs_aspect = cvs_w as f64 / cvs_h.max(1) as f64;

    let (width, height) = if src_aspect > cvs_aspect {
        let h = (cvs_w as f64 / src_aspect).round() as u32;
        (cvs_w, h.clamp(1, cvs_h.max(1)))
    } else {
        let w = (cvs_h as f64 * src_aspect).round() as u32;
        (w.clamp(1, cvs_w.max(1)), cvs_h)
    };

    Placement {
        x: (cvs_w.saturating_sub(width)) / 2,
        y: (cvs_h.saturating_sub(height)) / 2,
        width,
        height,
    }
}

/// Decode any supported image file into RGBA8.
pub fn load_rgba(path: &Path) -> Result<RgbaImage, CanvasError> {
    let decoded = ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| CanvasError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    Ok(decoded.to_rgba8())
}

/// Map `image` onto a `width × height` canvas.
pub fn fit_to_canvas(
    image: &RgbaImage,
    width: u32,
    height: u32,
    fit: FitMode,
    background: [u8; 3],
) -> RgbaImage {
    match fit {
        FitMode::Stretch => {
            if image.dimensions() == (width, height) {
                image.clone()
            } else {
                imageops::resize(image, width, height, FilterType::Lanczos3)
            }
        }
        FitMode::Letterbox => {
            let [r, g, b] = background;
            let mut canvas = RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255]));
            if width == 0 || height == 0 {
                return canvas;
            }
            let place = letterbox_placement(image.dimensions(), (width, height));
            let scaled = if image.dimensions() == (place.width, place.height) {
                image.clone()
            } else {
                imageops::resize(image, place.width, place.height, FilterType::Lanczos3)
            };
            imageops::overlay(&mut canvas, &scaled, place.x as i64, place.y as i64);
            canvas
        }
    }
}

/// Decode `path` and fit it onto the canvas, ready for the exchange.
pub fn prepare(
    path: &Path,
    width: u32,
    height: u32,
    fit: FitMode,
    background: [u8; 3],
) -> Result<Prepared, CanvasError> {
    let source = load_rgba(path)?;
    let original = source.dimensions();
    let fitted = fit_to_canvas(&source, width, height, fit, background);
    tracing::debug!(
        path = %path.display(),
        original_width = original.0,
        original_height = original.1,
        width,
        height,
        ?fit,
        "prepared canvas"
    );
    Ok(Prepared {
        original,
        raster: RasterBuffer::from(fitted),
    })
}

/// A decoded source image fitted onto the canvas.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Dimensions of the file before fitting.
    pub original: (u32, u32),
    pub raster: RasterBuffer,
}

/// Encode a raster in the given lossless format, in memory.
pub fn encode_raster(raster: RasterBuffer, format: OutputFormat) -> Result<Vec<u8>, CanvasError> {
    let img = raster.into_rgba_image()?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format.image_format())
        .map_err(|e| CanvasError::Encode {
            format,
            message: e.to_string(),
        })?;
    Ok(bytes)
}

/// Encode a raster to `path` in the given lossless format.
pub fn save_raster(
    raster: RasterBuffer,
    path: &Path,
    format: OutputFormat,
) -> Result<(), CanvasError> {
    let bytes = encode_raster(raster, format)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
