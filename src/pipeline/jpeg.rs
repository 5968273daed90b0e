//! JPEG encoding and colour normalisation.
//!
//! A PDF `DCTDecode` stream can hold a grayscale or RGB JPEG directly, and the
//! baseline JPEG encoder only accepts those two layouts as well. Everything
//! else (alpha, palette, 16-bit) is flattened to 8-bit RGB first; alpha is
//! dropped, not composited.

use crate::error::ConvertError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Return an image in a JPEG/PDF-embeddable layout and whether it changed.
pub fn normalize(img: DynamicImage) -> (DynamicImage, bool) {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => (img, false),
        other => {
            debug!("Normalising {:?} to Rgb8", other.color());
            (DynamicImage::ImageRgb8(other.to_rgb8()), true)
        }
    }
}

/// Encode `img` as an in-memory JPEG. `img` must already be normalised.
pub fn encode(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}

/// Normalise and write `img` to `path` as JPEG, replacing any existing file.
pub fn save(img: DynamicImage, path: &Path, quality: u8) -> Result<(), ConvertError> {
    let save_failed = |detail: String| ConvertError::ImageSaveFailed {
        path: path.to_path_buf(),
        detail,
    };

    let (img, _) = normalize(img);
    let file = File::create(path).map_err(|e| save_failed(e.to_string()))?;
    img.write_with_encoder(JpegEncoder::new_with_quality(BufWriter::new(file), quality))
        .map_err(|e| save_failed(e.to_string()))
}

/// Number of colour components declared in a JPEG frame header, or `None`
/// if `bytes` is not a parseable JPEG.
///
/// CMYK (4-component) JPEGs decode to RGB but their raw stream is not
/// DeviceRGB, so callers use this to decide whether the original bytes can be
/// embedded untouched.
pub fn frame_components(bytes: &[u8]) -> Option<u8> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    let mut i = 2;
    while i + 1 < bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        match marker {
            // fill byte
            0xFF => {
                i += 1;
                continue;
            }
            // standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                i += 2;
                continue;
            }
            // start of scan or end of image before any frame header
            0xDA | 0xD9 => return None,
            _ => {}
        }

        let len = u16::from_be_bytes([*bytes.get(i + 2)?, *bytes.get(i + 3)?]) as usize;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            // FF Cn Lh Ll P Yh Yl Xh Xl Nf
            return bytes.get(i + 9).copied();
        }
        i += 2 + len;
    }
    None
}
