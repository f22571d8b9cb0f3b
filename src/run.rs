//! End-to-end run: decode → fit → exchange → encode.
//!
//! This is the only part of the crate that touches the filesystem. The
//! exchange itself runs on the rayon pool via
//! [`spawn_exchange`](crate::exchange::spawn_exchange) while this thread
//! waits on the result.
//!
//! ## Output Structure
//!
//! ```text
//! <out_dir>/
//! ├── pixel-rebirth-image-a-rebuilt-using-pixels-from-image-b.png
//! └── pixel-rebirth-image-b-rebuilt-using-pixels-from-image-a.png
//! ```
//!
//! The prefix and extension come from [`OutputConfig`](crate::config::OutputConfig).
//!
//! ## Progress
//!
//! Callers may pass an `mpsc::Sender<RunEvent>`; one event is sent per
//! loaded input, one when the exchange finishes, and one per written file.
//! A dropped receiver is ignored. `Loaded` carries the visible-pixel count
//! measured by the exchange, so both `Loaded` events arrive together with
//! `Exchanged`.
//!
//! ## Failure
//!
//! Both images are encoded in memory before anything is written. If writing
//! the second file fails, the first is removed again, so a failed run leaves
//! neither output behind.

use crate::canvas::{self, CanvasError, Prepared};
use crate::config::RebirthConfig;
use crate::exchange::{self, ExchangeError, ExchangeStats, RasterBuffer};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Canvas preparation failed: {0}")]
    Canvas(#[from] CanvasError),
    #[error("Pixel exchange failed: {0}")]
    Exchange(#[from] ExchangeError),
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Which of the two inputs an event or output refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }

    /// Human label of the image rebuilt at this side's positions.
    pub fn rebuilt_label(self) -> String {
        format!(
            "Image {} rebuilt using pixels from Image {}",
            self.name(),
            self.other().name()
        )
    }
}

/// Progress events emitted during [`run`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Loaded {
        side: Side,
        path: PathBuf,
        original: (u32, u32),
        visible: usize,
    },
    Exchanged {
        stats: ExchangeStats,
        elapsed: Duration,
    },
    Written {
        side: Side,
        path: PathBuf,
    },
}

/// What to exchange and where to put the results.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub image_a: PathBuf,
    pub image_b: PathBuf,
    pub out_dir: PathBuf,
}

/// Summary of a finished run, serialisable as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub inputs: Vec<InputReport>,
    pub canvas: CanvasReport,
    pub stats: ExchangeStats,
    pub outputs: Vec<OutputReport>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputReport {
    pub side: Side,
    pub path: PathBuf,
    pub original_width: u32,
    pub original_height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanvasReport {
    pub width: u32,
    pub height: u32,
    pub fit: canvas::FitMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputReport {
    pub side: Side,
    pub label: String,
    pub path: PathBuf,
    /// SHA-256 of the raw RGBA bytes, for reproducibility checks.
    pub sha256: String,
}

/// Result of loading both inputs without exchanging them.
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub inputs: Vec<InputReport>,
    pub canvas: CanvasReport,
    pub visible_a: usize,
    pub visible_b: usize,
}

/// Output filename for the image rebuilt at `side`'s positions.
///
/// The label is slugified: lowercase, whitespace runs become `-`.
pub fn output_filename(prefix: &str, side: Side, extension: &str) -> String {
    let slug = side
        .rebuilt_label()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!("{prefix}-{slug}.{extension}")
}

/// SHA-256 of a raster's bytes, returned as a hex string.
pub fn raster_digest(raster: &RasterBuffer) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raster.width.to_le_bytes());
    hasher.update(raster.height.to_le_bytes());
    hasher.update(&raster.data);
    format!("{:x}", hasher.finalize())
}

/// Load and fit both inputs, reporting visible-pixel counts. Writes nothing.
pub fn check(
    image_a: &Path,
    image_b: &Path,
    config: &RebirthConfig,
) -> Result<CheckReport, RunError> {
    let (a, b) = prepare_pair(image_a, image_b, config)?;
    Ok(CheckReport {
        inputs: vec![
            input_report(Side::A, image_a, &a),
            input_report(Side::B, image_b, &b),
        ],
        canvas: canvas_report(config),
        visible_a: exchange::visible_count(&a.raster),
        visible_b: exchange::visible_count(&b.raster),
    })
}

/// Run the full pipeline for one pair of images.
pub fn run(
    request: &RunRequest,
    config: &RebirthConfig,
    events: Option<Sender<RunEvent>>,
) -> Result<RunReport, RunError> {
    let started = Instant::now();
    let emit = |event: RunEvent| {
        if let Some(tx) = &events {
            let _ = tx.send(event);
        }
    };

    let (a, b) = prepare_pair(&request.image_a, &request.image_b, config)?;
    let inputs = vec![
        input_report(Side::A, &request.image_a, &a),
        input_report(Side::B, &request.image_b, &b),
    ];

    let exchange_started = Instant::now();
    let result = exchange::spawn_exchange(a.raster, b.raster).wait()?;
    let elapsed = exchange_started.elapsed();
    for (side, input, visible) in [
        (Side::A, &inputs[0], result.stats.visible_a),
        (Side::B, &inputs[1], result.stats.visible_b),
    ] {
        emit(RunEvent::Loaded {
            side,
            path: input.path.clone(),
            original: (input.original_width, input.original_height),
            visible,
        });
    }
    emit(RunEvent::Exchanged {
        stats: result.stats,
        elapsed,
    });

    // Encode both images before touching the output directory.
    let format = config.output.format;
    let mut staged = Vec::with_capacity(2);
    for (side, raster) in [(Side::A, result.rebuilt_a), (Side::B, result.rebuilt_b)] {
        let filename = output_filename(&config.output.prefix, side, format.extension());
        let sha256 = raster_digest(&raster);
        let bytes = canvas::encode_raster(raster, format)?;
        staged.push((side, request.out_dir.join(filename), sha256, bytes));
    }

    std::fs::create_dir_all(&request.out_dir)?;
    persist_outputs(&staged)?;

    let mut outputs = Vec::with_capacity(staged.len());
    for (side, path, sha256, _) in staged {
        tracing::debug!(path = %path.display(), %sha256, "wrote rebuilt image");
        emit(RunEvent::Written {
            side,
            path: path.clone(),
        });
        outputs.push(OutputReport {
            side,
            label: side.rebuilt_label(),
            path,
            sha256,
        });
    }

    Ok(RunReport {
        inputs,
        canvas: canvas_report(config),
        stats: result.stats,
        outputs,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}

/// Write every encoded output, or none of them.
///
/// If a write fails, files already written by this call are removed again.
fn persist_outputs(staged: &[(Side, PathBuf, String, Vec<u8>)]) -> Result<(), RunError> {
    for (done, (_, path, _, bytes)) in staged.iter().enumerate() {
        if let Err(e) = std::fs::write(path, bytes) {
            for (_, written, _, _) in &staged[..done] {
                let _ = std::fs::remove_file(written);
            }
            return Err(e.into());
        }
    }
    Ok(())
}

/// Decode and fit both inputs concurrently.
fn prepare_pair(
    image_a: &Path,
    image_b: &Path,
    config: &RebirthConfig,
) -> Result<(Prepared, Prepared), RunError> {
    for path in [image_a, image_b] {
        if !path.exists() {
            return Err(RunError::SourceNotFound(path.to_path_buf()));
        }
    }
    let c = &config.canvas;
    let (a, b) = rayon::join(
        || canvas::prepare(image_a, c.width, c.height, c.fit, c.background),
        || canvas::prepare(image_b, c.width, c.height, c.fit, c.background),
    );
    Ok((a?, b?))
}

fn input_report(side: Side, path: &Path, prepared: &Prepared) -> InputReport {
    InputReport {
        side,
        path: path.to_path_buf(),
        original_width: prepared.original.0,
        original_height: prepared.original.1,
    }
}

fn canvas_report(config: &RebirthConfig) -> CanvasReport {
    CanvasReport {
        width: config.canvas.width,
        height: config.canvas.height,
        fit: config.canvas.fit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{FitMode, OutputFormat, load_rgba};
    use crate::test_helpers::{write_gradient_png, write_solid_png};
    use tempfile::TempDir;

    fn small_config() -> RebirthConfig {
        let mut config = RebirthConfig::default();
        config.canvas.width = 48;
        config.canvas.height = 27;
        config
    }

    fn request(tmp: &TempDir) -> RunRequest {
        let image_a = tmp.path().join("a.png");
        let image_b = tmp.path().join("b.png");
        write_gradient_png(&image_a, 120, 60);
        write_solid_png(&image_b, 30, 40, [10, 200, 30, 255]);
        RunRequest {
            image_a,
            image_b,
            out_dir: tmp.path().join("out"),
        }
    }

    // =========================================================================
    // Naming
    // =========================================================================

    #[test]
    fn output_filenames_follow_labels() {
        assert_eq!(
            output_filename("pixel-rebirth", Side::A, "png"),
            "pixel-rebirth-image-a-rebuilt-using-pixels-from-image-b.png"
        );
        assert_eq!(
            output_filename("x", Side::B, "webp"),
            "x-image-b-rebuilt-using-pixels-from-image-a.webp"
        );
    }

    #[test]
    fn side_labels() {
        assert_eq!(
            Side::A.rebuilt_label(),
            "Image A rebuilt using pixels from Image B"
        );
        assert_eq!(Side::B.other(), Side::A);
    }

    #[test]
    fn digest_depends_on_dimensions_and_bytes() {
        let a = RasterBuffer::new(2, 1, vec![0; 8]);
        let b = RasterBuffer::new(1, 2, vec![0; 8]);
        let c = RasterBuffer::new(2, 1, vec![1; 8]);
        assert_eq!(raster_digest(&a).len(), 64);
        assert_ne!(raster_digest(&a), raster_digest(&b));
        assert_ne!(raster_digest(&a), raster_digest(&c));
        assert_eq!(raster_digest(&a), raster_digest(&a.clone()));
    }

    // =========================================================================
    // Pipeline
    // =========================================================================

    #[test]
    fn run_writes_both_rebuilt_images() {
        let tmp = TempDir::new().unwrap();
        let req = request(&tmp);
        let report = run(&req, &small_config(), None).unwrap();

        assert_eq!(report.outputs.len(), 2);
        for output in &report.outputs {
            assert!(output.path.exists(), "{} missing", output.path.display());
            let img = load_rgba(&output.path).unwrap();
            assert_eq!(img.dimensions(), (48, 27));
        }
        assert_eq!(report.stats.total_pixels, 48 * 27);
        // Letterboxing makes every canvas pixel opaque.
        assert_eq!(report.stats.visible_a, 48 * 27);
        assert_eq!(report.stats.visible_b, 48 * 27);
    }

    #[test]
    fn run_is_reproducible() {
        let tmp = TempDir::new().unwrap();
        let req = request(&tmp);
        let first = run(&req, &small_config(), None).unwrap();
        let second = run(&req, &small_config(), None).unwrap();
        let digests = |r: &RunReport| -> Vec<String> {
            r.outputs.iter().map(|o| o.sha256.clone()).collect()
        };
        assert_eq!(digests(&first), digests(&second));
    }

    #[test]
    fn run_emits_events_in_order() {
        let tmp = TempDir::new().unwrap();
        let req = request(&tmp);
        let (tx, rx) = std::sync::mpsc::channel();
        run(&req, &small_config(), Some(tx)).unwrap();
        let events: Vec<RunEvent> = rx.into_iter().collect();

        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], RunEvent::Loaded { side: Side::A, original: (120, 60), .. }));
        assert!(matches!(events[1], RunEvent::Loaded { side: Side::B, original: (30, 40), .. }));
        assert!(matches!(events[2], RunEvent::Exchanged { .. }));
        assert!(matches!(events[3], RunEvent::Written { side: Side::A, .. }));
        assert!(matches!(events[4], RunEvent::Written { side: Side::B, .. }));
    }

    #[test]
    fn run_with_stretch_keeps_transparency() {
        let tmp = TempDir::new().unwrap();
        let image_a = tmp.path().join("a.png");
        let image_b = tmp.path().join("b.png");
        write_solid_png(&image_a, 8, 8, [255, 0, 0, 0]);
        write_gradient_png(&image_b, 8, 8);
        let req = RunRequest {
            image_a,
            image_b,
            out_dir: tmp.path().join("out"),
        };
        let mut config = small_config();
        config.canvas.width = 8;
        config.canvas.height = 8;
        config.canvas.fit = FitMode::Stretch;

        let report = run(&req, &config, None).unwrap();
        assert_eq!(report.stats.visible_a, 0);
        assert!(report.stats.is_degenerate());
        for output in &report.outputs {
            let img = load_rgba(&output.path).unwrap();
            assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 0]));
        }
    }

    #[test]
    fn run_honours_output_config() {
        let tmp = TempDir::new().unwrap();
        let req = request(&tmp);
        let mut config = small_config();
        config.output.prefix = "swap".into();
        config.output.format = OutputFormat::Tiff;

        let report = run(&req, &config, None).unwrap();
        let names: Vec<String> = report
            .outputs
            .iter()
            .map(|o| o.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "swap-image-a-rebuilt-using-pixels-from-image-b.tiff",
                "swap-image-b-rebuilt-using-pixels-from-image-a.tiff",
            ]
        );
    }

    #[test]
    fn run_failed_write_leaves_no_partial_output() {
        let tmp = TempDir::new().unwrap();
        let req = request(&tmp);
        let config = small_config();
        // A directory squatting on B's output name makes the second write fail.
        let blocker = req.out_dir.join(output_filename(
            &config.output.prefix,
            Side::B,
            config.output.format.extension(),
        ));
        std::fs::create_dir_all(&blocker).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        assert!(matches!(
            run(&req, &config, Some(tx)),
            Err(RunError::Io(_))
        ));
        let a_output = req.out_dir.join(output_filename(
            &config.output.prefix,
            Side::A,
            config.output.format.extension(),
        ));
        assert!(!a_output.exists());
        assert!(
            rx.into_iter()
                .all(|e| !matches!(e, RunEvent::Written { .. }))
        );
    }

    #[test]
    fn loaded_events_carry_exchange_visible_counts() {
        let tmp = TempDir::new().unwrap();
        let image_a = tmp.path().join("a.png");
        let image_b = tmp.path().join("b.png");
        write_solid_png(&image_a, 8, 8, [255, 0, 0, 0]);
        write_gradient_png(&image_b, 8, 8);
        let req = RunRequest {
            image_a,
            image_b,
            out_dir: tmp.path().join("out"),
        };
        let mut config = small_config();
        config.canvas.width = 8;
        config.canvas.height = 8;
        config.canvas.fit = FitMode::Stretch;

        let (tx, rx) = std::sync::mpsc::channel();
        let report = run(&req, &config, Some(tx)).unwrap();
        let visible: Vec<usize> = rx
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::Loaded { visible, .. } => Some(visible),
                _ => None,
            })
            .collect();
        assert_eq!(visible, vec![report.stats.visible_a, report.stats.visible_b]);
        assert_eq!(visible[0], 0);
    }

    #[test]
    fn run_missing_source_is_error() {
        let tmp = TempDir::new().unwrap();
        let mut req = request(&tmp);
        req.image_b = tmp.path().join("nope.png");
        assert!(matches!(
            run(&req, &small_config(), None),
            Err(RunError::SourceNotFound(p)) if p.ends_with("nope.png")
        ));
        assert!(!req.out_dir.exists());
    }

    #[test]
    fn check_reports_visible_counts_without_writing() {
        let tmp = TempDir::new().unwrap();
        let req = request(&tmp);
        let report = check(&req.image_a, &req.image_b, &small_config()).unwrap();
        assert_eq!(report.visible_a, 48 * 27);
        assert_eq!(report.inputs[1].original_width, 30);
        assert!(!req.out_dir.exists());
    }
}
