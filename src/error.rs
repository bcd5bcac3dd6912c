//! Error types for the pdf2img library.
//!
//! Every failure that stops a conversion is a [`Pdf2ImgError`]. There is no
//! partial-success mode: a document either produces exactly one artifact or
//! the request fails. The HTTP layer maps these variants onto status codes in
//! [`crate::server`]; the CLI wraps them with `anyhow` context.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2img library.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The upload or input string was rejected before any PDF work began.
    #[error("{reason}")]
    InvalidInput { reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The payload was read, but it does not start with `%PDF`.
    #[error("'{name}' is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{name}' is encrypted and requires a password.")]
    PasswordRequired { name: String },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{name}'")]
    WrongPassword { name: String },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be encoded into the requested format.
    #[error("Encoding page {page} as {format} failed: {detail}")]
    EncodeFailed {
        page: usize,
        format: String,
        detail: String,
    },

    // ── Packaging errors ──────────────────────────────────────────────────
    /// There were no pages to package.
    ///
    /// Cannot happen for a document that loaded successfully; pdfium never
    /// reports a zero-page document as valid input to the packager.
    #[error("No pages to package")]
    EmptyInput,

    /// The ZIP writer failed while building the archive.
    #[error("Failed to build archive '{name}': {detail}")]
    ArchiveFailed { name: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or request validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory), place the library\n\
next to the binary, or install it system-wide.\n\
Pre-built libraries: https://github.com/bblanchon/pdfium-binaries/releases\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2ImgError {
    /// Shorthand for [`Pdf2ImgError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Pdf2ImgError::InvalidInput {
            reason: reason.into(),
        }
    }

    /// True when the caller sent something unusable, as opposed to a failure
    /// on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Pdf2ImgError::FileNotFound { .. }
                | Pdf2ImgError::PermissionDenied { .. }
                | Pdf2ImgError::InvalidInput { .. }
                | Pdf2ImgError::NotAPdf { .. }
                | Pdf2ImgError::CorruptPdf { .. }
                | Pdf2ImgError::PasswordRequired { .. }
                | Pdf2ImgError::WrongPassword { .. }
                | Pdf2ImgError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_display() {
        assert_eq!(Pdf2ImgError::EmptyInput.to_string(), "No pages to package");
    }

    #[test]
    fn invalid_input_displays_reason_verbatim() {
        let e = Pdf2ImgError::invalid_input("File must be a PDF");
        assert_eq!(e.to_string(), "File must be a PDF");
        assert!(e.is_client_error());
    }

    #[test]
    fn rasterisation_display() {
        let e = Pdf2ImgError::RasterisationFailed {
            page: 3,
            detail: "bitmap alloc".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("page 3"), "got: {msg}");
        assert!(msg.contains("bitmap alloc"));
        assert!(!e.is_client_error());
    }

    #[test]
    fn not_a_pdf_shows_magic() {
        let e = Pdf2ImgError::NotAPdf {
            name: "notes.pdf".into(),
            magic: b"PK\x03\x04".to_vec(),
        };
        assert!(e.to_string().contains("notes.pdf"));
        assert!(e.is_client_error());
    }

    #[test]
    fn binding_failure_mentions_env_override() {
        let e = Pdf2ImgError::PdfiumBindingFailed("dlopen failed".into());
        assert!(e.to_string().contains("PDFIUM_LIB_PATH"));
    }
}
