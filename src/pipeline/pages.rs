//! Page-count query from the PDF structure.
//!
//! Reading the page tree with lopdf keeps the count independent of the
//! rendering engine: the number of output files is decided before pdfium
//! renders anything.

use crate::error::ConvertError;
use lopdf::Document;
use std::path::Path;
use tracing::debug;

/// Number of pages in the PDF's page tree.
pub fn page_count(pdf: &Path) -> Result<usize, ConvertError> {
    let document = Document::load(pdf).map_err(|e| ConvertError::CorruptPdf {
        path: pdf.to_path_buf(),
        detail: e.to_string(),
    })?;

    let count = document.get_pages().len();
    debug!("{}: {} pages in page tree", pdf.display(), count);
    Ok(count)
}
