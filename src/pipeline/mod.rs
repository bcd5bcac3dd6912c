//! Pipeline stages for PDF-to-image conversion.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ package
//! (bytes)   (pdfium)   (png/jpg/svg) (file | zip)
//! ```
//!
//! 1. [`input`]   : validate an upload, read a local file or download a URL
//! 2. [`render`]  : bind pdfium and rasterise each page at the requested DPI
//! 3. [`encode`]  : encode each raster in the requested output format
//! 4. [`package`] : pick single file vs. archive, name it, set the MIME type

pub mod encode;
pub mod input;
pub mod package;
pub mod render;
