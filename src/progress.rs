//! Progress-callback trait for per-page rendering events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events while a document is rendered. The CLI drives an `indicatif` bar
//! from these; the server leaves the callback unset.
//!
//! Rendering runs on a `spawn_blocking` thread, so every method is invoked
//! from that thread, never from the async executor.
//!
//! # Example
//!
//! ```rust
//! use pdf2img::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     rendered: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_rendered(&self, page_num: usize, total_pages: usize, bytes: usize) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} rendered ({} bytes)", page_num, total_pages, bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { rendered: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the document is loaded, before the first page renders.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page has been rendered and encoded.
    ///
    /// # Arguments
    /// * `page_num`    : 1-indexed page number
    /// * `total_pages` : pages in the document
    /// * `bytes`       : size of the encoded page payload
    fn on_page_rendered(&self, page_num: usize, total_pages: usize, bytes: usize) {
        let _ = (page_num, total_pages, bytes);
    }

    /// Called once the artifact has been packaged.
    fn on_conversion_complete(&self, artifact_name: &str, artifact_bytes: usize) {
        let _ = (artifact_name, artifact_bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
