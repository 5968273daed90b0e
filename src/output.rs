//! Result records returned by successful jobs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of rasterising one PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfToJpgOutput {
    /// The source PDF.
    pub input: PathBuf,
    /// `<input-dir>/<input-stem>/`.
    pub output_dir: PathBuf,
    /// Written pages in page order: `<stem>_page1.jpg`, `<stem>_page2.jpg`, …
    pub files: Vec<PathBuf>,
    /// Page count from the PDF structure.
    pub page_count: usize,
    /// Resolution the pages were rendered at.
    pub dpi: u32,
    /// Wall-clock time for the whole job.
    pub duration_ms: u64,
}

/// Result of assembling images into one PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JpgToPdfOutput {
    /// The written PDF.
    pub output_file: PathBuf,
    /// Directory of the first input image.
    pub output_dir: PathBuf,
    /// One page per input image.
    pub page_count: usize,
    /// Pages whose image had to be normalised and re-encoded.
    pub reencoded_pages: usize,
    pub duration_ms: u64,
}
