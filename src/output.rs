//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Exchange (streamed while running)
//!
//! ```text
//! Image A: 1920x1080 (1049088 visible pixels)
//!     Source: photos/dawn.jpg
//! Image B: 800x1200 (1049088 visible pixels)
//!     Source: photos/portrait.png
//! Exchanged 1049088 pixels on a 1366x768 canvas in 412ms
//! Image A rebuilt using pixels from Image B
//!     → out/pixel-rebirth-image-a-rebuilt-using-pixels-from-image-b.png
//! Image B rebuilt using pixels from Image A
//!     → out/pixel-rebirth-image-b-rebuilt-using-pixels-from-image-a.png
//! ```
//!
//! ## Check
//!
//! ```text
//! Canvas 1366x768 (letterbox)
//! Image A: 1920x1080 (1049088 visible pixels)
//!     Source: photos/dawn.jpg
//! Image B: 800x1200 (0 visible pixels)
//!     Source: photos/ghost.png
//!     Warning: no visible pixels; Image A will be rebuilt fully transparent
//! ```
//!
//! # Architecture
//!
//! Every `format_*` function returns `Vec<String>` and is pure; `print_*`
//! wrappers write to stdout.

use crate::canvas::FitMode;
use crate::exchange::ExchangeStats;
use crate::run::{CheckReport, RunEvent, Side};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn fit_name(fit: FitMode) -> &'static str {
    match fit {
        FitMode::Letterbox => "letterbox",
        FitMode::Stretch => "stretch",
    }
}

/// Header line for one input image.
///
/// ```text
/// Image A: 1920x1080 (1049088 visible pixels)
/// ```
fn input_header(side: Side, original: (u32, u32), visible: usize) -> String {
    format!(
        "Image {}: {}x{} ({} visible pixels)",
        side.name(),
        original.0,
        original.1,
        visible
    )
}

fn input_lines(side: Side, path: &Path, original: (u32, u32), visible: usize) -> Vec<String> {
    let mut lines = vec![
        input_header(side, original, visible),
        format!("{}Source: {}", indent(1), path.display()),
    ];
    if visible == 0 {
        lines.push(format!(
            "{}Warning: no visible pixels; Image {} will be rebuilt fully transparent",
            indent(1),
            side.other().name()
        ));
    }
    lines
}

/// Summary line after the exchange finished.
pub fn format_exchange_summary(stats: &ExchangeStats, elapsed_ms: u128) -> String {
    format!(
        "Exchanged {} pixels on a {}x{} canvas in {}ms",
        stats.total_pixels, stats.width, stats.height, elapsed_ms
    )
}

/// Format one progress event from [`run`](crate::run::run).
pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::Loaded {
            side,
            path,
            original,
            visible,
        } => input_lines(*side, path, *original, *visible),
        RunEvent::Exchanged { stats, elapsed } => {
            vec![format_exchange_summary(stats, elapsed.as_millis())]
        }
        RunEvent::Written { side, path } => vec![
            side.rebuilt_label(),
            format!("{}→ {}", indent(1), path.display()),
        ],
    }
}

/// Format the result of a `check` run.
pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Canvas {}x{} ({})",
        report.canvas.width,
        report.canvas.height,
        fit_name(report.canvas.fit)
    )];
    for (input, visible) in report
        .inputs
        .iter()
        .zip([report.visible_a, report.visible_b])
    {
        lines.extend(input_lines(
            input.side,
            &input.path,
            (input.original_width, input.original_height),
            visible,
        ));
    }
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}
