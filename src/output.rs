//! Result types produced by a conversion.

use crate::config::OutputFormat;
use serde::{Deserialize, Serialize};

/// MIME type of every archive artifact.
pub const ZIP_MIME: &str = "application/zip";

/// One rendered page, encoded in its final format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 1-indexed page number.
    pub index: usize,
    /// Encoded payload (PNG / JPEG bytes, or UTF-8 SVG text).
    pub bytes: Vec<u8>,
    /// Format of `bytes`.
    pub format: OutputFormat,
    /// Rendered width in pixels.
    pub width: u32,
    /// Rendered height in pixels.
    pub height: u32,
}

impl PageImage {
    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }

    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }
}

/// The single file or archive handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    /// Download file name, e.g. `report.png` or `report_images.zip`.
    pub name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl OutputArtifact {
    /// True when the artifact is a ZIP of page images.
    pub fn is_archive(&self) -> bool {
        self.mime == ZIP_MIME
    }
}

/// Per-page summary kept after the payload has been moved into the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSummary {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
}

impl From<&PageImage> for PageSummary {
    fn from(p: &PageImage) -> Self {
        Self {
            index: p.index,
            width: p.width,
            height: p.height,
            bytes: p.bytes.len(),
        }
    }
}

/// Timing and size statistics for one conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages in the document (and in the artifact).
    pub page_count: usize,
    pub render_duration_ms: u64,
    pub package_duration_ms: u64,
    pub total_duration_ms: u64,
    /// Size of the artifact in bytes.
    pub artifact_bytes: usize,
}

/// Everything a conversion returns.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub artifact: OutputArtifact,
    pub pages: Vec<PageSummary>,
    pub stats: ConversionStats,
}

/// PDF document metadata, read without rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
