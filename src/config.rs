//! Configuration types for PDF-to-image conversion.
//!
//! Two structs split the knobs by lifetime:
//!
//! * [`ConversionRequest`] holds what one caller asked for (source name,
//!   output format, DPI, forced ZIP, optional password). Built and validated
//!   per request; nothing here outlives the request.
//! * [`ConversionConfig`] holds how this service renders (pixel cap, JPEG
//!   quality, download timeout, progress callback). Built once at start-up
//!   and shared by reference.

use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest accepted rendering DPI.
pub const MIN_DPI: u32 = 36;
/// Highest accepted rendering DPI.
pub const MAX_DPI: u32 = 600;
/// DPI used when the caller does not specify one.
pub const DEFAULT_DPI: u32 = 200;

// ── Output format ────────────────────────────────────────────────────────

/// Image format produced for every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless raster. (default)
    #[default]
    Png,
    /// Lossy raster without alpha channel.
    Jpg,
    /// SVG document wrapping the page raster.
    Svg,
}

impl OutputFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpg => "jpg",
            OutputFormat::Svg => "svg",
        }
    }

    /// Media type sent in `Content-Type`.
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpg => "image/jpeg",
            OutputFormat::Svg => "image/svg+xml",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Pdf2ImgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpg),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(Pdf2ImgError::InvalidConfig(format!(
                "Unsupported format '{other}' (expected png, jpg or svg)"
            ))),
        }
    }
}

// ── Per-request parameters ───────────────────────────────────────────────

/// One caller's conversion request.
///
/// # Example
/// ```rust
/// use pdf2img::{ConversionRequest, OutputFormat};
///
/// let request = ConversionRequest::builder("report.pdf")
///     .format(OutputFormat::Jpg)
///     .dpi(150)
///     .force_zip(true)
///     .build()
///     .unwrap();
/// assert_eq!(request.base_name(), "report");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Name of the uploaded or local file, e.g. `report.pdf`.
    pub source_name: String,
    /// Output image format.
    pub format: OutputFormat,
    /// Rendering resolution. Range: [`MIN_DPI`]–[`MAX_DPI`].
    pub dpi: u32,
    /// Return a ZIP even for a single-page document.
    pub force_zip: bool,
    /// PDF user password for encrypted documents.
    pub password: Option<String>,
}

impl fmt::Debug for ConversionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRequest")
            .field("source_name", &self.source_name)
            .field("format", &self.format)
            .field("dpi", &self.dpi)
            .field("force_zip", &self.force_zip)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ConversionRequest {
    /// Start building a request for `source_name`.
    pub fn builder(source_name: impl Into<String>) -> ConversionRequestBuilder {
        ConversionRequestBuilder {
            request: ConversionRequest {
                source_name: source_name.into(),
                format: OutputFormat::default(),
                dpi: DEFAULT_DPI,
                force_zip: false,
                password: None,
            },
        }
    }

    /// Check the request is renderable.
    pub fn validate(&self) -> Result<(), Pdf2ImgError> {
        if self.source_name.trim().is_empty() {
            return Err(Pdf2ImgError::InvalidConfig(
                "Source name must not be empty".into(),
            ));
        }
        if !(MIN_DPI..=MAX_DPI).contains(&self.dpi) {
            return Err(Pdf2ImgError::InvalidConfig(format!(
                "DPI must be {MIN_DPI}–{MAX_DPI}, got {}",
                self.dpi
            )));
        }
        Ok(())
    }

    /// Stem used for every artifact name, see [`crate::pipeline::input::base_name`].
    pub fn base_name(&self) -> String {
        crate::pipeline::input::base_name(&self.source_name)
    }
}

/// Builder for [`ConversionRequest`].
#[derive(Debug)]
pub struct ConversionRequestBuilder {
    request: ConversionRequest,
}

impl ConversionRequestBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.request.format = format;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.request.dpi = dpi;
        self
    }

    pub fn force_zip(mut self, v: bool) -> Self {
        self.request.force_zip = v;
        self
    }

    /// Set the PDF password. Empty or whitespace-only values mean no password.
    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        let pwd = pwd.into();
        self.request.password = if pwd.trim().is_empty() {
            None
        } else {
            Some(pwd)
        };
        self
    }

    /// Build the request, validating constraints.
    pub fn build(self) -> Result<ConversionRequest, Pdf2ImgError> {
        self.request.validate()?;
        Ok(self.request)
    }
}

// ── Service-level configuration ──────────────────────────────────────────

/// Rendering settings shared by every request this process handles.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
#[derive(Clone)]
pub struct ConversionConfig {
    /// Maximum rendered image dimension (width or height) in pixels. Default: 10 000.
    ///
    /// A 600-DPI render of an A0 poster would be roughly 20 000 × 28 000 px.
    /// The cap scales both edges down proportionally so a single upload
    /// cannot exhaust memory.
    pub max_rendered_pixels: u32,

    /// JPEG quality, 1–100. Default: 90.
    pub jpeg_quality: u8,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 10_000,
            jpeg_quality: 90,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImgError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(Pdf2ImgError::InvalidConfig(
                "Download timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_accepts_aliases() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("JPEG".parse::<OutputFormat>().unwrap(), OutputFormat::Jpg);
        assert_eq!(" jpg ".parse::<OutputFormat>().unwrap(), OutputFormat::Jpg);
        assert_eq!("Svg".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
        assert!("tiff".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn format_metadata() {
        assert_eq!(OutputFormat::Png.mime(), "image/png");
        assert_eq!(OutputFormat::Jpg.extension(), "jpg");
        assert_eq!(OutputFormat::Jpg.mime(), "image/jpeg");
        assert_eq!(OutputFormat::Svg.mime(), "image/svg+xml");
        assert_eq!(OutputFormat::Svg.to_string(), "svg");
    }

    #[test]
    fn format_serde_is_lowercase() {
        let json = serde_json::to_string(&OutputFormat::Jpg).unwrap();
        assert_eq!(json, "\"jpg\"");
        let back: OutputFormat = serde_json::from_str("\"svg\"").unwrap();
        assert_eq!(back, OutputFormat::Svg);
    }

    #[test]
    fn request_defaults() {
        let r = ConversionRequest::builder("doc.pdf").build().unwrap();
        assert_eq!(r.format, OutputFormat::Png);
        assert_eq!(r.dpi, DEFAULT_DPI);
        assert!(!r.force_zip);
        assert!(r.password.is_none());
    }

    #[test]
    fn request_rejects_out_of_range_dpi() {
        assert!(ConversionRequest::builder("a.pdf").dpi(0).build().is_err());
        assert!(ConversionRequest::builder("a.pdf").dpi(MIN_DPI - 1).build().is_err());
        assert!(ConversionRequest::builder("a.pdf").dpi(MAX_DPI + 1).build().is_err());
        assert!(ConversionRequest::builder("a.pdf").dpi(MIN_DPI).build().is_ok());
        assert!(ConversionRequest::builder("a.pdf").dpi(MAX_DPI).build().is_ok());
    }

    #[test]
    fn request_rejects_blank_name() {
        assert!(ConversionRequest::builder("  ").build().is_err());
    }

    #[test]
    fn empty_password_is_none() {
        let r = ConversionRequest::builder("a.pdf").password("").build().unwrap();
        assert!(r.password.is_none());

        let r = ConversionRequest::builder("a.pdf").password(" \t ").build().unwrap();
        assert!(r.password.is_none());

        let r = ConversionRequest::builder("a.pdf").password(" pw ").build().unwrap();
        assert_eq!(r.password.as_deref(), Some(" pw "));
    }

    #[test]
    fn request_debug_redacts_password() {
        let r = ConversionRequest::builder("a.pdf")
            .password("hunter2")
            .build()
            .unwrap();
        let dbg = format!("{r:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn config_builder_clamps() {
        let c = ConversionConfig::builder()
            .jpeg_quality(0)
            .max_rendered_pixels(5)
            .build()
            .unwrap();
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.max_rendered_pixels, 100);
    }

    #[test]
    fn config_rejects_zero_timeout() {
        assert!(ConversionConfig::builder()
            .download_timeout_secs(0)
            .build()
            .is_err());
    }
}
