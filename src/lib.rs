//! # pdfjpg
//!
//! Convert PDF documents to per-page JPEG images, and merge JPEG (or other
//! raster) images into a single multi-page PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF → JPG
//!  ├─ 1. Engine  resolve the PDFium library (fails fast if absent)
//!  ├─ 2. Input   validate the file, count pages with lopdf
//!  ├─ 3. Render  rasterise one page at a time at `dpi`
//!  └─ 4. Save    <dir>/<stem>/<stem>_page<N>.jpg
//!
//! JPG → PDF
//!  ├─ 1. Order   caller-ordered list of images
//!  ├─ 2. Embed   original JPEG bytes, or normalise + re-encode
//!  └─ 3. Write   <dir of first image>/合并输出.pdf, atomically
//! ```
//!
//! Both directions are blocking and all-or-nothing. [`JobRunner`] runs them
//! on tokio's blocking pool, one job at a time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfjpg::{jpg_to_pdf, pdf_to_jpg, EngineConfig, JpgToPdfConfig, PdfToJpgConfig};
//! use std::path::PathBuf;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = EngineConfig::discover();
//!     let out = pdf_to_jpg("report.pdf", &engine, &PdfToJpgConfig::default())?;
//!     eprintln!("{} pages → {}", out.files.len(), out.output_dir.display());
//!
//!     let images = vec![PathBuf::from("scan1.jpg"), PathBuf::from("scan2.jpg")];
//!     let merged = jpg_to_pdf(&images, &JpgToPdfConfig::default())?;
//!     eprintln!("wrote {}", merged.output_file.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfjpg` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdfjpg = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod job;
pub mod order;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    EngineConfig, JpgToPdfConfig, JpgToPdfConfigBuilder, PdfToJpgConfig, PdfToJpgConfigBuilder,
    DEFAULT_DPI, MERGED_PDF_NAME,
};
pub use convert::{jpg_to_pdf, pdf_to_jpg, pdfs_to_jpg};
pub use error::ConvertError;
pub use job::{Job, JobHandle, JobOutcome, JobOutput, JobRunner};
pub use order::ImageOrder;
pub use output::{JpgToPdfOutput, PdfToJpgOutput};
pub use pipeline::input::expand_image_inputs;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
