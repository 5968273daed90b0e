//! CLI binary for pdfjpg.
//!
//! A thin shim over the library crate that maps subcommands and flags to
//! the conversion configs, runs the job through `JobRunner` and prints the
//! outcome.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdfjpg::{
    expand_image_inputs, ConversionProgressCallback, EngineConfig, ImageOrder, Job, JobOutcome,
    JobOutput, JobRunner, JpgToPdfConfig, PdfToJpgConfig, ProgressCallback, DEFAULT_DPI,
    MERGED_PDF_NAME,
};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per page.
///
/// A PDF→JPG batch calls `on_conversion_start` once per document, so the bar
/// is re-armed for every PDF.
struct CliProgressCallback {
    bar: ProgressBar,
    unit: &'static str,
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new(unit: &'static str) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening input…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            unit,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {}  \
             ⏱ {{elapsed_precise}}  ETA {{eta_precise}}",
            self.unit
        );
        let progress_style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_position(0);
        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_ms(&self, page_num: usize) -> u128 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0)
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting conversion of {total_pages} {}…", self.unit))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, path: &Path) {
        let elapsed_ms = self.elapsed_ms(page_num);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            page_num,
            total,
            name,
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed_ms = self.elapsed_ms(page_num);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(error),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Every page of a PDF → report/report_page1.jpg, report_page2.jpg, …
  pdfjpg to-jpg report.pdf

  # Several PDFs at 150 DPI (stops at the first failing document)
  pdfjpg to-jpg --dpi 150 a.pdf b.pdf

  # Merge images in the given order → scans/合并输出.pdf
  pdfjpg to-pdf scans/3.jpg scans/1.jpg scans/2.jpg

  # Merge every image in a folder, sorted by name, and move one
  pdfjpg to-pdf scans/ --move-up 3

  # Check or install the PDF rendering engine
  pdfjpg engine status
  pdfjpg engine fetch

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH          Path to libpdfium (file or containing folder)
  PDFIUM_LOCATE_CACHE_DIR  Override the engine cache directory
  PDFJPG_ENGINE            Same as --engine
  RUST_LOG                 Override the log filter (e.g. pdfjpg=debug)

ENGINE SEARCH ORDER:
  1. --engine / PDFJPG_ENGINE / PDFIUM_LIB_PATH
  2. pdfium/lib, pdfium/bin, pdfium/ next to the executable, then the
     executable's own folder
  3. the cache filled by `pdfjpg engine fetch`
"#;

/// Convert PDF pages to JPEG images and merge images into a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdfjpg",
    version,
    about = "Convert PDF pages to JPEG images and merge images into a PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// PDFium library file, or a folder containing it.
    #[arg(long, global = true, env = "PDFJPG_ENGINE")]
    engine: Option<PathBuf>,

    /// Print the result as JSON on stdout.
    #[arg(long, global = true, env = "PDFJPG_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDFJPG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFJPG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFJPG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render every page of each PDF to `<dir>/<stem>/<stem>_page<N>.jpg`.
    ToJpg {
        /// PDF files, converted in the given order.
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Rendering DPI (36–1200).
        #[arg(long, env = "PDFJPG_DPI", default_value_t = DEFAULT_DPI,
              value_parser = clap::value_parser!(u32).range(36..=1200))]
        dpi: u32,

        /// JPEG quality for rendered pages (1–100).
        #[arg(long, env = "PDFJPG_QUALITY", default_value_t = 75,
              value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,
    },

    /// Merge images, in order, into one PDF next to the first image.
    ToPdf {
        /// Image files or folders; a folder contributes its images by name.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Resolution used to size pages from pixel dimensions.
        #[arg(long, env = "PDFJPG_PAGE_DPI", default_value_t = 72,
              value_parser = clap::value_parser!(u32).range(1..=1200))]
        page_dpi: u32,

        /// JPEG quality for images that must be re-encoded (1–100).
        #[arg(long, env = "PDFJPG_PDF_QUALITY", default_value_t = 95,
              value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: u8,

        /// Output file name.
        #[arg(long, default_value = MERGED_PDF_NAME)]
        output_name: String,

        /// Move the image at this 1-based position one place earlier.
        /// Repeatable; applied in order.
        #[arg(long, value_name = "POS")]
        move_up: Vec<usize>,

        /// Move the image at this 1-based position one place later.
        /// Repeatable; applied after all --move-up.
        #[arg(long, value_name = "POS")]
        move_down: Vec<usize>,
    },

    /// Inspect or install the PDF rendering engine.
    Engine {
        #[command(subcommand)]
        action: EngineAction,
    },
}

#[derive(Subcommand, Debug)]
enum EngineAction {
    /// Show which library would be used.
    Status,
    /// Download PDFium into the cache directory.
    Fetch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the per-page feedback, so library INFO logs
    // are only shown when it is off.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let engine = match cli.engine {
        Some(ref path) => EngineConfig::from_library_path(path),
        None => EngineConfig::discover(),
    };

    match cli.command {
        Command::ToJpg {
            ref pdfs,
            dpi,
            quality,
        } => {
            let cb = show_progress.then(|| CliProgressCallback::new("pages"));
            let mut builder = PdfToJpgConfig::builder().dpi(dpi).jpeg_quality(quality);
            if let Some(ref cb) = cb {
                builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
            }
            let config = builder.build().context("Invalid configuration")?;

            let job = Job::PdfToJpg {
                inputs: pdfs.clone(),
                config,
            };
            run_job(&cli, engine, job, cb.as_deref()).await
        }

        Command::ToPdf {
            ref inputs,
            page_dpi,
            quality,
            ref output_name,
            ref move_up,
            ref move_down,
        } => {
            let images = expand_image_inputs(inputs).context("Failed to collect images")?;
            let images = apply_moves(images, move_up, move_down)?;

            let cb = show_progress.then(|| CliProgressCallback::new("images"));
            let mut builder = JpgToPdfConfig::builder()
                .page_dpi(page_dpi)
                .jpeg_quality(quality)
                .output_name(output_name.clone());
            if let Some(ref cb) = cb {
                builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
            }
            let config = builder.build().context("Invalid configuration")?;

            let job = Job::JpgToPdf { images, config };
            run_job(&cli, engine, job, cb.as_deref()).await
        }

        Command::Engine { ref action } => match action {
            EngineAction::Status => engine_status(&cli, &engine),
            EngineAction::Fetch => engine_fetch(&cli),
        },
    }
}

/// Apply `--move-up` then `--move-down` (1-based) to the image list.
fn apply_moves(images: Vec<PathBuf>, up: &[usize], down: &[usize]) -> Result<Vec<PathBuf>> {
    let mut order = ImageOrder::new(images);
    for &pos in up {
        let idx = to_index(pos, order.len())?;
        order.move_up(idx);
    }
    for &pos in down {
        let idx = to_index(pos, order.len())?;
        order.move_down(idx);
    }
    Ok(order.into_vec())
}

fn to_index(pos: usize, len: usize) -> Result<usize> {
    if pos < 1 || pos > len {
        anyhow::bail!("Position {} is out of range (1–{})", pos, len);
    }
    Ok(pos - 1)
}

async fn run_job(
    cli: &Cli,
    engine: EngineConfig,
    job: Job,
    progress: Option<&CliProgressCallback>,
) -> Result<()> {
    let runner = JobRunner::new(engine);
    let result = runner
        .submit(job)
        .context("Failed to start conversion")?
        .wait()
        .await;

    if let Some(cb) = progress {
        cb.finish();
    }

    let outcome = JobOutcome::from_result(&result);
    let output = result.context("Conversion failed")?;

    if cli.json {
        let json = match output {
            JobOutput::Images(ref outputs) => serde_json::to_string_pretty(outputs),
            JobOutput::Pdf(ref output) => serde_json::to_string_pretty(output),
        }
        .context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!("{} {}", green("✔"), outcome.message);
        if let Some(ref location) = outcome.location {
            eprintln!("   {}", bold(&location.display().to_string()));
        }
        if let JobOutput::Pdf(ref pdf) = output {
            if pdf.reencoded_pages > 0 {
                eprintln!(
                    "   {}",
                    dim(&format!("{} image(s) re-encoded", pdf.reencoded_pages))
                );
            }
        }
    }

    Ok(())
}

fn engine_status(cli: &Cli, engine: &EngineConfig) -> Result<()> {
    let resolved = engine.require();

    if cli.json {
        let status = serde_json::json!({
            "available": resolved.is_ok(),
            "library_path": engine.library_path(),
            "version": pdfium_locate::PDFIUM_VERSION,
            "cache_dir": pdfium_locate::cache_dir(),
            "error": resolved.as_ref().err().map(|e| e.to_string()),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("Failed to serialise status")?
        );
        return Ok(());
    }

    match resolved {
        Ok(path) => println!("{} Engine:  {}", green("✔"), path.display()),
        Err(e) => println!("{} {}", red("✘"), e),
    }
    println!("Cache:     {}", pdfium_locate::cache_dir().display());
    println!("Searched:");
    for dir in pdfium_locate::search_dirs(pdfium_locate::executable_dir().as_deref()) {
        println!("  {}", dim(&dir.display().to_string()));
    }
    Ok(())
}

fn engine_fetch(cli: &Cli) -> Result<()> {
    let result = if cli.quiet || cli.json {
        tokio::task::block_in_place(|| pdfium_locate::fetch(None))
    } else {
        let dl_bar = ProgressBar::new(0);
        dl_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS),
        );
        dl_bar.set_prefix("PDF engine");
        dl_bar.enable_steady_tick(Duration::from_millis(80));

        let bar = dl_bar.clone();
        // block_in_place keeps the borrowed callback valid while the blocking
        // HTTP client runs off the async executor.
        let result = tokio::task::block_in_place(|| {
            pdfium_locate::fetch(Some(&|downloaded, total| {
                if let Some(t) = total {
                    if bar.length().unwrap_or(0) != t {
                        bar.set_length(t);
                    }
                }
                bar.set_position(downloaded);
            }))
        });
        dl_bar.finish_and_clear();
        result
    };
    let path = result.context("Failed to download PDFium engine")?;

    if cli.json {
        println!("{}", serde_json::json!({ "library_path": path }));
    } else if !cli.quiet {
        eprintln!("{} PDF engine ready: {}", green("✔"), bold(&path.display().to_string()));
    }
    Ok(())
}
