//! Input resolution: turn an upload, a local path or a URL into PDF bytes.
//!
//! pdfium can load straight from a byte slice, so every input ends up as an
//! in-memory [`PdfSource`]. Validation happens here, before any native code
//! runs: uploads must carry a `.pdf` name and every payload must start with
//! the `%PDF` magic.

use crate::error::Pdf2ImgError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Characters that are unsafe in file names or in a `Content-Disposition` value.
static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f\x7f]"#).expect("valid regex"));

/// A PDF held in memory together with the name it arrived under.
#[derive(Clone)]
pub struct PdfSource {
    /// Original file name (upload name, path file name, or URL segment).
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PdfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSource")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Validate an uploaded file and wrap it as a [`PdfSource`].
///
/// Rejections carry the exact messages the upload form shows users.
pub fn validate_upload(filename: &str, bytes: Vec<u8>) -> Result<PdfSource, Pdf2ImgError> {
    if filename.is_empty() {
        return Err(Pdf2ImgError::invalid_input("No selected file"));
    }
    if !filename.to_ascii_lowercase().ends_with(".pdf") {
        warn!("Rejected upload with non-PDF name: {}", filename);
        return Err(Pdf2ImgError::invalid_input("File must be a PDF"));
    }
    check_magic(filename, &bytes)?;
    Ok(PdfSource {
        name: filename.to_string(),
        bytes,
    })
}

/// Verify the `%PDF` magic bytes.
pub fn check_magic(name: &str, bytes: &[u8]) -> Result<(), Pdf2ImgError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(Pdf2ImgError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Resolve a local path or HTTP(S) URL to PDF bytes.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<PdfSource, Pdf2ImgError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input).await
    }
}

/// Read a local file, validating existence, permissions and PDF magic.
async fn resolve_local(path_str: &str) -> Result<PdfSource, Pdf2ImgError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2ImgError::PermissionDenied { path });
        }
        Err(_) => return Err(Pdf2ImgError::FileNotFound { path }),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    check_magic(&name, &bytes)?;

    debug!("Resolved local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(PdfSource { name, bytes })
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<PdfSource, Pdf2ImgError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Pdf2ImgError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pdf2ImgError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Pdf2ImgError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Pdf2ImgError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Pdf2ImgError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .to_vec();

    let name = filename_from_url(url);
    check_magic(&name, &bytes)?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    Ok(PdfSource { name, bytes })
}

/// Last path segment of a URL when it looks like a file name.
pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

/// Source name for a path-or-URL input, before it is resolved.
pub fn source_name_for(input: &str) -> String {
    if is_url(input) {
        return filename_from_url(input);
    }
    std::path::Path::new(input)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.to_string())
}

/// Derive the artifact stem from a source file name.
///
/// Takes the last component of either `/` or `\` separated paths (some
/// browsers send the client-side path), drops the final extension, and
/// replaces characters unsafe in file names or headers with `_`. Falls back
/// to `document` when nothing but dots is left.
pub fn base_name(source_name: &str) -> String {
    let file = source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name);

    let stem = match file.rfind('.') {
        Some(0) | None => file,
        Some(dot) => &file[..dot],
    };

    let cleaned = UNSAFE_NAME_CHARS.replace_all(stem.trim(), "_");
    // A stem of only dots would yield hidden or relative names like `..png`.
    if cleaned.chars().all(|c| c == '.') {
        "document".to_string()
    } else {
        cleaned.into_owned()
    }
}
