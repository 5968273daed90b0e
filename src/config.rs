//! Configuration types for both conversion directions.
//!
//! * [`EngineConfig`]: where the PDFium library lives. Constructed once by
//!   the caller and passed into every PDF→JPG job.
//! * [`PdfToJpgConfig`]: rasterisation settings, built via
//!   [`PdfToJpgConfig::builder()`].
//! * [`JpgToPdfConfig`]: assembly settings, built via
//!   [`JpgToPdfConfig::builder()`].

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default rasterisation resolution.
pub const DEFAULT_DPI: u32 = 300;

/// File name of the merged PDF written by the JPG→PDF assembler.
pub const MERGED_PDF_NAME: &str = "合并输出.pdf";

// ── Engine ───────────────────────────────────────────────────────────────

/// Location of the PDFium library used for rasterisation.
///
/// Discovery happens once, when this value is constructed. A missing engine
/// is not an error here; every PDF→JPG job given this config fails with the
/// same [`ConvertError::EngineNotFound`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    library_path: Option<PathBuf>,
    missing_reason: String,
}

impl EngineConfig {
    /// Search the standard locations (see `pdfium_locate::locate`).
    pub fn discover() -> Self {
        match pdfium_locate::locate() {
            Ok(path) => Self::found(path),
            Err(e) => Self::missing(e.to_string()),
        }
    }

    /// Use an explicit library file, or a directory expected to contain the
    /// platform library.
    pub fn from_library_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.is_dir() {
            return Self::found(path.to_path_buf());
        }
        match pdfium_locate::library_file_name() {
            Ok(name) => Self::found(path.join(name)),
            Err(e) => Self::missing(e.to_string()),
        }
    }

    /// A config that never resolves; every render job fails with `reason`.
    pub fn missing(reason: impl Into<String>) -> Self {
        Self {
            library_path: None,
            missing_reason: reason.into(),
        }
    }

    fn found(path: PathBuf) -> Self {
        Self {
            library_path: Some(path),
            missing_reason: String::new(),
        }
    }

    /// The configured library path, whether or not it exists.
    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }

    /// The library path if it points at an existing file.
    pub fn require(&self) -> Result<&Path, ConvertError> {
        match self.library_path.as_deref() {
            Some(p) if p.is_file() => Ok(p),
            Some(p) => Err(ConvertError::EngineNotFound {
                detail: format!("no library file at '{}'", p.display()),
            }),
            None => Err(ConvertError::EngineNotFound {
                detail: self.missing_reason.clone(),
            }),
        }
    }
}

// ── PDF → JPG ────────────────────────────────────────────────────────────

/// Settings for rasterising a PDF into per-page JPEG files.
///
/// # Example
/// ```rust
/// use pdfjpg::PdfToJpgConfig;
///
/// let config = PdfToJpgConfig::builder()
///     .dpi(150)
///     .jpeg_quality(85)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct PdfToJpgConfig {
    /// Render resolution in dots per inch. Range: 36–1200. Default: 300.
    ///
    /// Each page is scaled by `dpi / 72`, so an A4 page at 300 DPI is about
    /// 2480 × 3508 px.
    pub dpi: u32,

    /// JPEG quality for written pages. Range: 1–100. Default: 75.
    pub jpeg_quality: u8,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PdfToJpgConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            jpeg_quality: 75,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PdfToJpgConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfToJpgConfig")
            .field("dpi", &self.dpi)
            .field("jpeg_quality", &self.jpeg_quality)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl PdfToJpgConfig {
    /// Create a new builder for `PdfToJpgConfig`.
    pub fn builder() -> PdfToJpgConfigBuilder {
        PdfToJpgConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PdfToJpgConfig`].
#[derive(Debug)]
pub struct PdfToJpgConfigBuilder {
    config: PdfToJpgConfig,
}

impl PdfToJpgConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        let clamped = dpi.clamp(36, 1200);
        if clamped != dpi {
            warn!("DPI {} is outside 36–1200; using {}", dpi, clamped);
        }
        self.config.dpi = clamped;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PdfToJpgConfig, ConvertError> {
        let c = &self.config;
        if !(36..=1200).contains(&c.dpi) {
            return Err(ConvertError::InvalidConfig(format!(
                "DPI must be 36–1200, got {}",
                c.dpi
            )));
        }
        if !(1..=100).contains(&c.jpeg_quality) {
            return Err(ConvertError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        Ok(self.config)
    }
}

// ── JPG → PDF ────────────────────────────────────────────────────────────

/// Settings for assembling images into one multi-page PDF.
#[derive(Clone)]
pub struct JpgToPdfConfig {
    /// Resolution used to turn pixel size into page size. Default: 72,
    /// which makes one image pixel one PDF point.
    pub page_dpi: u32,

    /// Quality used when an image has to be re-encoded (alpha, palette,
    /// non-JPEG input). Untouched JPEGs are embedded as-is. Default: 95.
    pub jpeg_quality: u8,

    /// Output file name, written next to the first input. Default:
    /// [`MERGED_PDF_NAME`].
    pub output_name: String,

    /// Optional per-page progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for JpgToPdfConfig {
    fn default() -> Self {
        Self {
            page_dpi: 72,
            jpeg_quality: 95,
            output_name: MERGED_PDF_NAME.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for JpgToPdfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JpgToPdfConfig")
            .field("page_dpi", &self.page_dpi)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("output_name", &self.output_name)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl JpgToPdfConfig {
    /// Create a new builder for `JpgToPdfConfig`.
    pub fn builder() -> JpgToPdfConfigBuilder {
        JpgToPdfConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`JpgToPdfConfig`].
#[derive(Debug)]
pub struct JpgToPdfConfigBuilder {
    config: JpgToPdfConfig,
}

impl JpgToPdfConfigBuilder {
    pub fn page_dpi(mut self, dpi: u32) -> Self {
        let clamped = dpi.clamp(1, 1200);
        if clamped != dpi {
            warn!("Page DPI {} is outside 1–1200; using {}", dpi, clamped);
        }
        self.config.page_dpi = clamped;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_name = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<JpgToPdfConfig, ConvertError> {
        let name = self.config.output_name.trim();
        if name.is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Output name must not be empty".into(),
            ));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(ConvertError::InvalidConfig(format!(
                "Output name must be a bare file name, got '{name}'"
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_to_jpg_defaults() {
        let c = PdfToJpgConfig::default();
        assert_eq!(c.dpi, 300);
        assert_eq!(c.jpeg_quality, 75);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn dpi_is_clamped() {
        assert_eq!(PdfToJpgConfig::builder().dpi(5).build().unwrap().dpi, 36);
        assert_eq!(PdfToJpgConfig::builder().dpi(9000).build().unwrap().dpi, 1200);
    }

    #[test]
    fn in_range_dpi_is_kept_and_page_dpi_clamped() {
        assert_eq!(PdfToJpgConfig::builder().dpi(600).build().unwrap().dpi, 600);
        assert_eq!(JpgToPdfConfig::builder().page_dpi(0).build().unwrap().page_dpi, 1);
        assert_eq!(JpgToPdfConfig::builder().page_dpi(5000).build().unwrap().page_dpi, 1200);
    }

    #[test]
    fn quality_is_clamped() {
        let c = PdfToJpgConfig::builder().jpeg_quality(0).build().unwrap();
        assert_eq!(c.jpeg_quality, 1);
        let c = JpgToPdfConfig::builder().jpeg_quality(200).build().unwrap();
        assert_eq!(c.jpeg_quality, 100);
    }

    #[test]
    fn direct_field_edits_are_validated() {
        let mut builder = PdfToJpgConfig::builder();
        builder.config.dpi = 0;
        assert!(matches!(builder.build(), Err(ConvertError::InvalidConfig(_))));
    }

    #[test]
    fn merged_name_is_default() {
        assert_eq!(JpgToPdfConfig::default().output_name, MERGED_PDF_NAME);
    }

    #[test]
    fn output_name_must_be_bare() {
        assert!(JpgToPdfConfig::builder().output_name("a/b.pdf").build().is_err());
        assert!(JpgToPdfConfig::builder().output_name("  ").build().is_err());
        assert!(JpgToPdfConfig::builder().output_name("book.pdf").build().is_ok());
    }

    #[test]
    fn missing_engine_reports_reason() {
        let engine = EngineConfig::missing("not installed");
        assert!(engine.library_path().is_none());
        let err = engine.require().unwrap_err();
        assert!(err.to_string().contains("not installed"));
    }

    #[test]
    fn nonexistent_library_file_is_not_found() {
        let engine = EngineConfig::from_library_path("/definitely/not/here/libpdfium.so");
        assert!(engine.library_path().is_some());
        assert!(matches!(
            engine.require(),
            Err(ConvertError::EngineNotFound { .. })
        ));
    }

    #[test]
    fn directory_resolves_to_platform_library() {
        let dir = tempfile::tempdir().unwrap();
        let engine = EngineConfig::from_library_path(dir.path());
        let name = pdfium_locate::library_file_name().unwrap();
        assert_eq!(engine.library_path(), Some(dir.path().join(name).as_path()));
    }
}
