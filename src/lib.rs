//! # pdf2img
//!
//! Render PDF documents to PNG, JPEG or SVG page images and package them as
//! a single downloadable artifact.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate an upload, read a local file or download a URL
//!  ├─ 2. Render   rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode   PNG / JPEG / SVG-wrapped PNG per page
//!  └─ 4. Package  one page → the image itself, otherwise a ZIP archive
//! ```
//!
//! Every successful conversion yields exactly one [`OutputArtifact`]:
//!
//! | Pages | `force_zip` | Artifact |
//! |-------|-------------|----------|
//! | 1     | false       | `{base}.{ext}` |
//! | 1     | true        | `{base}_images.zip` |
//! | n > 1 | any         | `{base}_images.zip` with `{base}_page_001.{ext}` … |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2img::{convert, ConversionConfig, ConversionRequest, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ConversionRequest::builder("report.pdf")
//!         .format(OutputFormat::Jpg)
//!         .dpi(150)
//!         .build()?;
//!     let output = convert("report.pdf", &request, &ConversionConfig::default()).await?;
//!     std::fs::write(&output.artifact.name, &output.artifact.bytes)?;
//!     eprintln!("{} pages in {}ms", output.stats.page_count, output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP front end ([`server`]) |
//! | `cli`    | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable both when using only the library:
//! ```toml
//! pdf2img = { version = "0.1", default-features = false }
//! ```
//!
//! ## PDFium
//!
//! Rendering needs a pdfium shared library at runtime. It is located via
//! `PDFIUM_LIB_PATH`, then the working directory, then the system loader.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionConfig, ConversionConfigBuilder, ConversionRequest, ConversionRequestBuilder,
    OutputFormat,
};
pub use convert::{
    convert, convert_bytes, convert_source, convert_sync, convert_to_dir, inspect, inspect_bytes,
};
pub use error::Pdf2ImgError;
pub use output::{
    ConversionOutput, ConversionStats, DocumentMetadata, OutputArtifact, PageImage, PageSummary,
};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
