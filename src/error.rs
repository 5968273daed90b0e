//! Error type for the pdfjpg library.
//!
//! Every job is all-or-nothing, so there is a single fatal error type,
//! [`ConvertError`]. The first failure aborts the job and is returned as
//! `Err(ConvertError)`; there is no per-page partial-success channel.
//!
//! Callers that only need the "did it work, and what do I tell the user"
//! view can reduce a result to [`crate::job::JobOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdfjpg library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Engine errors ─────────────────────────────────────────────────────
    /// The PDFium library could not be located. Fails every PDF→JPG job.
    #[error(
        "PDF rendering engine not found: {detail}\n\n\
Place the PDFium library in a `pdfium/` folder next to the executable,\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium, or run `pdfjpg engine fetch`."
    )]
    EngineNotFound { detail: String },

    /// The PDFium library exists but could not be loaded.
    #[error("Failed to bind to PDFium library '{path}': {reason}")]
    EngineBindFailed { path: PathBuf, reason: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF structure could not be parsed or loaded.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// No images were supplied to the JPG→PDF assembler.
    #[error("No images selected")]
    EmptyInput,

    /// An input image could not be opened or decoded.
    #[error("Failed to open image '{path}': {detail}")]
    ImageOpenFailed { path: PathBuf, detail: String },

    // ── Processing errors ─────────────────────────────────────────────────
    /// pdfium failed on a specific page (1-indexed).
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be encoded or written as JPEG.
    #[error("Failed to save image '{path}': {detail}")]
    ImageSaveFailed { path: PathBuf, detail: String },

    /// Could not create the output directory or write the output file.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One document of a multi-document batch failed; the batch stopped there.
    #[error("{} failed: {source}", file_label(.path))]
    BatchItemFailed {
        path: PathBuf,
        #[source]
        source: Box<ConvertError>,
    },

    // ── Config / runtime errors ───────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A job was submitted while another one is still running.
    #[error("A conversion is already running; wait for it to finish")]
    JobInFlight,

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn file_label(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl From<pdfium_locate::LocateError> for ConvertError {
    fn from(e: pdfium_locate::LocateError) -> Self {
        match e {
            pdfium_locate::LocateError::Bind { path, reason } => {
                ConvertError::EngineBindFailed { path, reason }
            }
            other => ConvertError::EngineNotFound {
                detail: other.to_string(),
            },
        }
    }
}
