//! Input validation and output-path derivation.
//!
//! We check the `%PDF` magic bytes before handing a file to lopdf or pdfium
//! so callers get a meaningful error rather than an opaque parser failure.

use crate::error::ConvertError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate that `path` exists, is readable and starts with `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<(), ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(f) => {
            let mut head = Vec::with_capacity(4);
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|e| ConvertError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                })?;
            // Short files are zero-padded and never match.
            let mut magic = [0u8; 4];
            magic[..head.len()].copy_from_slice(&head);
            if &magic != b"%PDF" {
                return Err(ConvertError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated PDF: {}", path.display());
    Ok(())
}

/// File stem used for the output folder and page names.
pub fn pdf_stem(pdf: &Path) -> String {
    pdf.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// `<input-dir>/<input-stem>/`.
pub fn output_dir_for(pdf: &Path) -> PathBuf {
    parent_dir(pdf).join(pdf_stem(pdf))
}

/// `<stem>_page<N>.jpg`, N 1-indexed.
pub fn page_file_name(stem: &str, page_num: usize) -> String {
    format!("{stem}_page{page_num}.jpg")
}

/// Parent directory, treating a bare file name as relative to `.`.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `true` for `.jpg` / `.jpeg` in any case.
pub fn is_jpeg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

/// JPEG files directly inside `dir`, sorted by file name.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: dir.to_path_buf(),
        },
        _ => ConvertError::FileNotFound {
            path: dir.to_path_buf(),
        },
    })?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_jpeg_path(p))
        .collect();
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    debug!("Collected {} images from {}", images.len(), dir.display());
    Ok(images)
}

/// Expand directories among `inputs` into their images; files pass through
/// in place.
pub fn expand_image_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ConvertError> {
    let mut out = Vec::with_capacity(inputs.len());
    for input in inputs {
        if input.is_dir() {
            out.extend(collect_images(input)?);
        } else {
            out.push(input.clone());
        }
    }
    Ok(out)
}
