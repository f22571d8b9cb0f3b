use clap::{Parser, Subcommand};
use pixel_rebirth::{config, output, run};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

/// The two source images.
#[derive(clap::Args, Clone)]
struct PairArgs {
    /// Image A
    image_a: PathBuf,
    /// Image B
    image_b: PathBuf,
}

#[derive(Parser)]
#[command(name = "pixel-rebirth")]
#[command(about = "True 1:1 pixel exchange between two images")]
#[command(long_about = "\
True 1:1 pixel exchange between two images

Each image is rebuilt using only the other image's pixels. Visible pixels
(alpha > 10) are ranked by brightness, and every position in image A takes
the pixel of image B that holds the same rank, and vice versa. No
compression, no averaging, no interpolation.

Both inputs are first fitted onto a shared canvas (1366x768 letterbox by
default). Output files:

  <out-dir>/pixel-rebirth-image-a-rebuilt-using-pixels-from-image-b.png
  <out-dir>/pixel-rebirth-image-b-rebuilt-using-pixels-from-image-a.png

Run 'pixel-rebirth gen-config' to generate a documented pixel-rebirth.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Exchange pixels between two images and write both rebuilt images
    Exchange {
        #[command(flatten)]
        pair: PairArgs,
        /// Output directory
        #[arg(long, default_value = "pixel-rebirth-out")]
        out_dir: PathBuf,
        /// Also write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Load and fit both images, report visible pixels, write nothing
    Check {
        #[command(flatten)]
        pair: PairArgs,
    },
    /// Print a stock pixel-rebirth.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Exchange {
            pair,
            out_dir,
            report,
        } => {
            let settings = load_settings(&cli.config)?;
            let request = run::RunRequest {
                image_a: pair.image_a,
                image_b: pair.image_b,
                out_dir,
            };
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_run_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            // `tx` is dropped when `run` returns, which ends the printer loop.
            let result = run::run(&request, &settings, Some(tx));
            printer
                .join()
                .map_err(|_| "output printer thread panicked")?;
            let result = result?;
            if let Some(report_path) = report {
                let json = serde_json::to_string_pretty(&result)?;
                std::fs::write(&report_path, json)?;
                println!("Report: {}", report_path.display());
            }
        }
        Command::Check { pair } => {
            let settings = load_settings(&cli.config)?;
            let report = run::check(&pair.image_a, &pair.image_b, &settings)?;
            output::print_check_report(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load config, then set up logging and the thread pool from it.
fn load_settings(path: &Path) -> Result<config::RebirthConfig, config::ConfigError> {
    let settings = config::load_config(path)?;
    init_tracing(&settings.log_level);
    init_thread_pool(&settings.processing);
    tracing::debug!(config = %path.display(), ?settings, "loaded configuration");
    Ok(settings)
}

/// Install the stderr `tracing` subscriber.
///
/// `RUST_LOG` wins over the config's `log_level`.
fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can lower it, never raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
