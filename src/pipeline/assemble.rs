//! Multi-page PDF assembly from images, written with lopdf.
//!
//! Every page is a single `DCTDecode` image XObject stretched over a
//! MediaBox of the image's size at `page_dpi`. JPEG inputs that are already
//! grayscale or RGB are embedded byte-for-byte; anything else is normalised
//! and re-encoded (see [`super::jpeg`]).
//!
//! Images are decoded one at a time and only their compressed bytes are kept
//! in the document. The file is written to a temporary sibling and renamed
//! into place, so a failed job never leaves a partial PDF behind.

use crate::config::JpgToPdfConfig;
use crate::error::ConvertError;
use crate::pipeline::jpeg;
use image::{DynamicImage, ImageFormat, ImageReader};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// An image ready to be placed on a page.
struct PageImage {
    width: u32,
    height: u32,
    color_space: &'static str,
    jpeg: Vec<u8>,
    reencoded: bool,
}

/// An assembled, not yet written, document.
pub struct AssembledPdf {
    pub document: Document,
    pub page_count: usize,
    pub reencoded_pages: usize,
}

/// Build a PDF with one page per image, in the given order.
pub fn assemble(images: &[PathBuf], config: &JpgToPdfConfig) -> Result<AssembledPdf, ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    let total = images.len();
    let cb = config.progress_callback.as_ref();
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(total);
    let mut reencoded_pages = 0;

    for (i, path) in images.iter().enumerate() {
        let page_num = i + 1;
        if let Some(cb) = cb {
            cb.on_page_start(page_num, total);
        }

        let page = match load_page_image(path, config.jpeg_quality) {
            Ok(p) => p,
            Err(e) => {
                if let Some(cb) = cb {
                    cb.on_page_error(page_num, total, &e.to_string());
                }
                return Err(e);
            }
        };
        if page.reencoded {
            reencoded_pages += 1;
        }

        let page_id = add_page(&mut doc, pages_id, page, config.page_dpi)?;
        kids.push(page_id.into());

        if let Some(cb) = cb {
            cb.on_page_complete(page_num, total, path);
        }
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => total as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    info!(
        "Assembled {} pages ({} re-encoded)",
        total, reencoded_pages
    );

    Ok(AssembledPdf {
        document: doc,
        page_count: total,
        reencoded_pages,
    })
}

/// Serialise `doc` to `path`, replacing any existing file.
pub fn write_atomic(doc: &mut Document, path: &Path) -> Result<(), ConvertError> {
    let write_failed = |source: std::io::Error| ConvertError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut buf = Vec::new();
    doc.save_to(&mut buf)
        .map_err(|e| ConvertError::Internal(format!("PDF serialisation failed: {e}")))?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let written =
        std::fs::write(&tmp_path, &buf).and_then(|()| std::fs::rename(&tmp_path, path));
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_failed(e));
    }

    debug!("Wrote {} bytes to {}", buf.len(), path.display());
    Ok(())
}

fn load_page_image(path: &Path, quality: u8) -> Result<PageImage, ConvertError> {
    let open_failed = |detail: String| ConvertError::ImageOpenFailed {
        path: path.to_path_buf(),
        detail,
    };

    let bytes = std::fs::read(path).map_err(|e| open_failed(e.to_string()))?;
    let mut reader = ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .map_err(|e| open_failed(e.to_string()))?;
    reader.no_limits();
    let format = reader.format();
    let img = reader.decode().map_err(|e| open_failed(e.to_string()))?;
    let (width, height) = (img.width(), img.height());

    let declared = match &img {
        DynamicImage::ImageLuma8(_) => Some((1, "DeviceGray")),
        DynamicImage::ImageRgb8(_) => Some((3, "DeviceRGB")),
        _ => None,
    };
    if let Some((components, color_space)) = declared {
        if format == Some(ImageFormat::Jpeg) && jpeg::frame_components(&bytes) == Some(components) {
            debug!("{}: embedding original JPEG", path.display());
            return Ok(PageImage {
                width,
                height,
                color_space,
                jpeg: bytes,
                reencoded: false,
            });
        }
    }

    let (img, _) = jpeg::normalize(img);
    let color_space = match img {
        DynamicImage::ImageLuma8(_) => "DeviceGray",
        _ => "DeviceRGB",
    };
    let data = jpeg::encode(&img, quality).map_err(|e| open_failed(e.to_string()))?;
    debug!("{}: re-encoded as {}", path.display(), color_space);

    Ok(PageImage {
        width,
        height,
        color_space,
        jpeg: data,
        reencoded: true,
    })
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    image: PageImage,
    page_dpi: u32,
) -> Result<ObjectId, ConvertError> {
    let dpi = page_dpi.max(1) as f32;
    let page_w = image.width as f32 * 72.0 / dpi;
    let page_h = image.height as f32 * 72.0 / dpi;

    let image_stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space,
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        image.jpeg,
    )
    .with_compression(false);
    let image_id = doc.add_object(image_stream);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(page_w),
                    0.into(),
                    0.into(),
                    Object::Real(page_h),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_bytes = content
        .encode()
        .map_err(|e| ConvertError::Internal(format!("content stream: {e}")))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content_bytes));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), Object::Real(page_w), Object::Real(page_h)],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_jpeg(path: &Path, w: u32, h: u32) {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([90, 140, 200])));
        jpeg::save(img, path, 90).unwrap();
    }

    fn page_widths(doc: &Document) -> Vec<f32> {
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_object(*id).unwrap().as_dict().unwrap();
                let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
                media_box[2].as_float().unwrap()
            })
            .collect()
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = assemble(&[], &JpgToPdfConfig::default()).err().unwrap();
        assert!(matches!(err, ConvertError::EmptyInput));
    }

    #[test]
    fn pages_follow_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = [30, 10, 20]
            .iter()
            .map(|&w| {
                let p = dir.path().join(format!("w{w}.jpg"));
                write_jpeg(&p, w, 15);
                p
            })
            .collect();

        let assembled = assemble(&paths, &JpgToPdfConfig::default()).unwrap();
        assert_eq!(assembled.page_count, 3);
        assert_eq!(assembled.reencoded_pages, 0);
        assert_eq!(page_widths(&assembled.document), vec![30.0, 10.0, 20.0]);
    }

    #[test]
    fn page_dpi_scales_media_box() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.jpg");
        write_jpeg(&p, 300, 150);

        let config = JpgToPdfConfig::builder().page_dpi(300).build().unwrap();
        let assembled = assemble(&[p], &config).unwrap();
        assert_eq!(page_widths(&assembled.document), vec![72.0]);
    }

    #[test]
    fn unreadable_image_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.jpg");
        write_jpeg(&good, 4, 4);
        let bad = dir.path().join("bad.jpg");
        std::fs::write(&bad, b"not an image at all").unwrap();

        let err = assemble(&[good, bad.clone()], &JpgToPdfConfig::default())
            .err()
            .unwrap();
        match err {
            ConvertError::ImageOpenFailed { path, .. } => assert_eq!(path, bad),
            other => panic!("expected ImageOpenFailed, got {other:?}"),
        }
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.jpg");
        write_jpeg(&img, 8, 8);
        let out = dir.path().join("out.pdf");
        std::fs::write(&out, b"old contents").unwrap();

        let mut assembled = assemble(&[img], &JpgToPdfConfig::default()).unwrap();
        write_atomic(&mut assembled.document, &out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(!dir.path().join("out.pdf.tmp").exists());
        assert_eq!(Document::load(&out).unwrap().get_pages().len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_write_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.jpg");
        write_jpeg(&img, 8, 8);
        let out = dir.path().join("out.pdf");
        let tmp = dir.path().join("out.pdf.tmp");
        // Writes through the link hit ENOSPC, like a full disk.
        std::os::unix::fs::symlink("/dev/full", &tmp).unwrap();

        let mut assembled = assemble(&[img], &JpgToPdfConfig::default()).unwrap();
        let err = write_atomic(&mut assembled.document, &out).unwrap_err();

        assert!(matches!(err, ConvertError::OutputWriteFailed { .. }));
        assert!(std::fs::symlink_metadata(&tmp).is_err());
        assert!(!out.exists());
    }
}
