//! Progress-callback trait for per-page conversion events.
//!
//! Attach an [`Arc<dyn ConversionProgressCallback>`] through either config
//! builder to receive events as a job works through its pages. For PDF→JPG a
//! "page" is a rendered PDF page; for JPG→PDF it is an input image being
//! placed on its page.
//!
//! # Example
//!
//! ```rust
//! use pdfjpg::{ConversionProgressCallback, PdfToJpgConfig};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, path: &Path) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} → {}", page_num, total_pages, path.display());
//!     }
//! }
//!
//! let config = PdfToJpgConfig::builder()
//!     .progress_callback(Arc::new(CountingCallback { written: AtomicUsize::new(0) }))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by a conversion job as it processes each page.
///
/// Jobs run on a worker thread, so implementations must be `Send + Sync`.
/// All methods default to no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first page, when the page count is known.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page (1-indexed) is processed.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page is done.
    ///
    /// `path` is the written JPEG for PDF→JPG and the source image for
    /// JPG→PDF.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, path: &Path) {
        let _ = (page_num, total_pages, path);
    }

    /// Called when a page fails. The job aborts right after this.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the last page succeeded.
    fn on_conversion_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// The type stored in the config structs.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
