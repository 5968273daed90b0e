//! The two conversion jobs.
//!
//! Both functions are blocking, single-pass and all-or-nothing: the first
//! failure is returned and nothing is retried. Run them through
//! [`crate::job::JobRunner`] to keep a caller's thread responsive.

use crate::config::{EngineConfig, JpgToPdfConfig, PdfToJpgConfig};
use crate::error::ConvertError;
use crate::output::{JpgToPdfOutput, PdfToJpgOutput};
use crate::pipeline::{assemble, input, pages, render};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Rasterise every page of `pdf_path` into `<dir>/<stem>/<stem>_page<N>.jpg`.
///
/// # Errors
/// - [`ConvertError::EngineNotFound`] before anything else is touched when
///   `engine` does not resolve to a library file
/// - input errors (`FileNotFound`, `NotAPdf`, `CorruptPdf`, …)
/// - the first page that fails to render or save; earlier pages remain on
///   disk
pub fn pdf_to_jpg(
    pdf_path: impl AsRef<Path>,
    engine: &EngineConfig,
    config: &PdfToJpgConfig,
) -> Result<PdfToJpgOutput, ConvertError> {
    let start = Instant::now();
    let pdf_path = pdf_path.as_ref();
    info!("Starting PDF→JPG: {}", pdf_path.display());

    // ── Step 1: Engine ───────────────────────────────────────────────────
    let library = engine.require()?;

    // ── Step 2: Validate input, count pages ──────────────────────────────
    input::validate_pdf(pdf_path)?;
    let page_count = pages::page_count(pdf_path)?;
    info!("PDF has {} pages", page_count);

    // ── Step 3: Output directory ─────────────────────────────────────────
    let output_dir = input::output_dir_for(pdf_path);
    std::fs::create_dir_all(&output_dir).map_err(|e| ConvertError::OutputWriteFailed {
        path: output_dir.clone(),
        source: e,
    })?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(page_count);
    }

    // ── Step 4: Render page by page ──────────────────────────────────────
    let files = if page_count == 0 {
        warn!("{} has no pages; nothing to render", pdf_path.display());
        Vec::new()
    } else {
        render::render_pages_to_jpeg(library, pdf_path, page_count, &output_dir, config)?
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(page_count);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Wrote {} pages to {} in {}ms",
        files.len(),
        output_dir.display(),
        duration_ms
    );

    Ok(PdfToJpgOutput {
        input: pdf_path.to_path_buf(),
        output_dir,
        files,
        page_count,
        dpi: config.dpi,
        duration_ms,
    })
}

/// Convert several PDFs in order, stopping at the first failing document.
///
/// The failure is wrapped in [`ConvertError::BatchItemFailed`] naming the
/// document; documents converted before it keep their output.
pub fn pdfs_to_jpg(
    pdf_paths: &[PathBuf],
    engine: &EngineConfig,
    config: &PdfToJpgConfig,
) -> Result<Vec<PdfToJpgOutput>, ConvertError> {
    let mut outputs = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let output = pdf_to_jpg(path, engine, config).map_err(|e| ConvertError::BatchItemFailed {
            path: path.clone(),
            source: Box::new(e),
        })?;
        outputs.push(output);
    }
    Ok(outputs)
}

/// Combine `images`, in order, into `<dir of first image>/<output_name>`.
///
/// An existing file of that name is replaced. On failure no output file is
/// written.
///
/// # Errors
/// - [`ConvertError::EmptyInput`] for an empty list, before any filesystem
///   access
/// - [`ConvertError::ImageOpenFailed`] for the first unreadable image
pub fn jpg_to_pdf(
    images: &[PathBuf],
    config: &JpgToPdfConfig,
) -> Result<JpgToPdfOutput, ConvertError> {
    let start = Instant::now();
    let first = images.first().ok_or(ConvertError::EmptyInput)?;
    info!("Starting JPG→PDF: {} images", images.len());

    let output_dir = input::parent_dir(first);
    let output_file = output_dir.join(&config.output_name);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(images.len());
    }

    let mut assembled = assemble::assemble(images, config)?;
    assemble::write_atomic(&mut assembled.document, &output_file)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(assembled.page_count);
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Wrote {} ({} pages) in {}ms",
        output_file.display(),
        assembled.page_count,
        duration_ms
    );

    Ok(JpgToPdfOutput {
        output_file,
        output_dir,
        page_count: assembled.page_count,
        reencoded_pages: assembled.reencoded_pages,
        duration_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_engine_fails_before_touching_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc.pdf");
        std::fs::write(&pdf, b"%PDF-1.5\n").unwrap();

        let engine = EngineConfig::missing("no engine here");
        let err = pdf_to_jpg(&pdf, &engine, &PdfToJpgConfig::default()).unwrap_err();
        assert!(matches!(err, ConvertError::EngineNotFound { .. }));
        assert!(!dir.path().join("doc").exists());
    }

    #[test]
    fn missing_engine_diagnostic_is_stable() {
        let engine = EngineConfig::from_library_path("/nope/libpdfium.so");
        let config = PdfToJpgConfig::default();
        let a = pdf_to_jpg("/tmp/a.pdf", &engine, &config).unwrap_err().to_string();
        let b = pdf_to_jpg("/tmp/b.pdf", &engine, &config).unwrap_err().to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_stops_at_first_failure() {
        let engine = EngineConfig::missing("absent");
        let inputs = vec![PathBuf::from("/x/first.pdf"), PathBuf::from("/x/second.pdf")];
        match pdfs_to_jpg(&inputs, &engine, &PdfToJpgConfig::default()) {
            Err(ConvertError::BatchItemFailed { path, .. }) => {
                assert_eq!(path, PathBuf::from("/x/first.pdf"))
            }
            other => panic!("expected BatchItemFailed, got {other:?}"),
        }
    }

    #[test]
    fn empty_image_list_is_rejected() {
        let err = jpg_to_pdf(&[], &JpgToPdfConfig::default()).unwrap_err();
        assert!(matches!(err, ConvertError::EmptyInput));
    }
}
