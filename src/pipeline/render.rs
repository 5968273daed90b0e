//! PDF rasterisation: render pages one at a time to JPEG files via pdfium.
//!
//! Only one page bitmap is alive at any moment. Each page is rendered, written
//! and dropped before the next is touched, so a document with thousands of
//! pages converts in the memory of its largest page.
//!
//! pdfium is blocking and not async-safe; callers run this on a blocking
//! worker (see [`crate::job`]).

use crate::config::PdfToJpgConfig;
use crate::error::ConvertError;
use crate::pipeline::{input, jpeg};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PDF user space is 1/72 inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Render pages `1..=page_count` of `pdf_path` into `out_dir`.
///
/// Returns the written files in page order. The first failing page aborts the
/// loop; files already written stay on disk.
pub fn render_pages_to_jpeg(
    engine_library: &Path,
    pdf_path: &Path,
    page_count: usize,
    out_dir: &Path,
    config: &PdfToJpgConfig,
) -> Result<Vec<PathBuf>, ConvertError> {
    let pdfium = pdfium_locate::bind(engine_library)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| ConvertError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;
    let pages = document.pages();
    info!(
        "Rendering {} pages of {} at {} DPI",
        page_count,
        pdf_path.display(),
        config.dpi
    );

    let render_config =
        PdfRenderConfig::new().scale_page_by_factor(config.dpi as f32 / POINTS_PER_INCH);
    let stem = input::pdf_stem(pdf_path);
    let cb = config.progress_callback.as_ref();
    let mut written = Vec::with_capacity(page_count);

    for page_num in 1..=page_count {
        if let Some(cb) = cb {
            cb.on_page_start(page_num, page_count);
        }

        let out_path = out_dir.join(input::page_file_name(&stem, page_num));
        let result = render_page(pages, page_num, &render_config)
            .and_then(|image| jpeg::save(image, &out_path, config.jpeg_quality));

        if let Err(e) = result {
            if let Some(cb) = cb {
                cb.on_page_error(page_num, page_count, &e.to_string());
            }
            return Err(e);
        }

        if let Some(cb) = cb {
            cb.on_page_complete(page_num, page_count, &out_path);
        }
        written.push(out_path);
    }

    Ok(written)
}

/// pdfium's zero-based index for 1-indexed `page_num`.
///
/// pdfium addresses pages with a `u16`, while the page count comes from the
/// page tree and can be larger.
fn page_index(page_num: usize) -> Result<u16, ConvertError> {
    page_num
        .checked_sub(1)
        .and_then(|i| u16::try_from(i).ok())
        .ok_or_else(|| ConvertError::RasterisationFailed {
            page: page_num,
            detail: format!(
                "page is beyond the rendering engine's limit of {} pages",
                u16::MAX as usize + 1
            ),
        })
}

/// Render a single page (1-indexed) to an owned image.
fn render_page(
    pages: &PdfPages<'_>,
    page_num: usize,
    render_config: &PdfRenderConfig,
) -> Result<DynamicImage, ConvertError> {
    let failed = |e: PdfiumError| ConvertError::RasterisationFailed {
        page: page_num,
        detail: format!("{:?}", e),
    };

    let page = pages.get(page_index(page_num)?).map_err(failed)?;
    let bitmap = page.render_with_config(render_config).map_err(failed)?;
    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_is_zero_based() {
        assert_eq!(page_index(1).unwrap(), 0);
        assert_eq!(page_index(65_536).unwrap(), u16::MAX);
    }

    #[test]
    fn page_index_beyond_engine_range_fails() {
        match page_index(65_537) {
            Err(ConvertError::RasterisationFailed { page, .. }) => assert_eq!(page, 65_537),
            other => panic!("expected RasterisationFailed, got {other:?}"),
        }
        assert!(page_index(0).is_err());
    }
}
