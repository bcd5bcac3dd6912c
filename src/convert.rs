//! Conversion entry points.
//!
//! Every entry point funnels into [`convert_source`]: resolve the input to
//! bytes, then run render → encode → package on a single `spawn_blocking`
//! thread. One request never fans out across threads; concurrency comes
//! only from the server handling several requests at once.

use crate::config::{ConversionConfig, ConversionRequest};
use crate::error::Pdf2ImgError;
use crate::output::{
    ConversionOutput, ConversionStats, DocumentMetadata, OutputArtifact, PageImage, PageSummary,
};
use crate::pipeline::input::{self, PdfSource};
use crate::pipeline::{package, render};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// Convert a local PDF file or HTTP/HTTPS URL.
///
/// Artifact names derive from `request.source_name`, not from `input_str`.
///
/// # Example
/// ```rust,no_run
/// use pdf2img::{convert, pipeline::input::source_name_for, ConversionConfig, ConversionRequest};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let input = "slides.pdf";
/// let request = ConversionRequest::builder(source_name_for(input)).dpi(150).build()?;
/// let output = convert(input, &request, &ConversionConfig::default()).await?;
/// std::fs::write(&output.artifact.name, &output.artifact.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    input_str: impl AsRef<str>,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);
    request.validate()?;

    let source = input::resolve_input(input_str, config.download_timeout_secs).await?;
    convert_source(source, request, config).await
}

/// Convert PDF bytes held in memory.
pub async fn convert_bytes(
    bytes: Vec<u8>,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    request.validate()?;
    input::check_magic(&request.source_name, &bytes)?;
    let source = PdfSource {
        name: request.source_name.clone(),
        bytes,
    };
    convert_source(source, request, config).await
}

/// Render, encode and package an already-validated source.
pub async fn convert_source(
    source: PdfSource,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let request = request.clone();
    let config = config.clone();

    tokio::task::spawn_blocking(move || convert_blocking(&source, &request, &config))
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Conversion task panicked: {}", e)))?
}

fn convert_blocking(
    source: &PdfSource,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    let total_start = Instant::now();

    let render_start = Instant::now();
    let pages = render::render_document_blocking(source, request, config)?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let package_start = Instant::now();
    let (artifact, summaries) = package_pages(pages, request, config)?;
    let package_duration_ms = package_start.elapsed().as_millis() as u64;
    let page_count = summaries.len();

    let stats = ConversionStats {
        page_count,
        render_duration_ms,
        package_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        artifact_bytes: artifact.bytes.len(),
    };

    info!(
        "Conversion complete: '{}' → '{}' ({} pages, {} bytes, {}ms)",
        source.name, artifact.name, page_count, stats.artifact_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        artifact,
        pages: summaries,
        stats,
    })
}

/// Package rendered pages and report the artifact to the progress callback.
fn package_pages(
    pages: Vec<PageImage>,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<(OutputArtifact, Vec<PageSummary>), Pdf2ImgError> {
    let summaries: Vec<PageSummary> = pages.iter().map(PageSummary::from).collect();
    let artifact = package::package(pages, &request.base_name(), request.force_zip)?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(&artifact.name, artifact.bytes.len());
    }

    Ok((artifact, summaries))
}

/// Convert a PDF and write the artifact into `out_dir`.
///
/// Uses atomic write (temp file in `out_dir` + rename) to prevent partial files.
/// Returns the written path and the conversion stats.
pub async fn convert_to_dir(
    input_str: impl AsRef<str>,
    out_dir: impl AsRef<Path>,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<(PathBuf, ConversionStats), Pdf2ImgError> {
    let output = convert(input_str, request, config).await?;
    let dir = out_dir.as_ref().to_path_buf();
    let path = dir.join(&output.artifact.name);

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| Pdf2ImgError::OutputWriteFailed {
            path: dir.clone(),
            source: e,
        })?;

    let target = path.clone();
    let bytes = output.artifact.bytes;
    tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &bytes))
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Write task panicked: {}", e)))??;

    Ok((path, output.stats))
}

fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), Pdf2ImgError> {
    let write_err = |source: std::io::Error| Pdf2ImgError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(input_str, request, config))
}

/// Extract PDF metadata from a path or URL without rendering.
///
/// URL downloads honour `config.download_timeout_secs`.
pub async fn inspect(
    input_str: impl AsRef<str>,
    password: Option<&str>,
    config: &ConversionConfig,
) -> Result<DocumentMetadata, Pdf2ImgError> {
    let source = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    inspect_source(source, password).await
}

/// Extract metadata from PDF bytes held in memory.
pub async fn inspect_bytes(
    bytes: Vec<u8>,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2ImgError> {
    let name = "document.pdf".to_string();
    input::check_magic(&name, &bytes)?;
    inspect_source(PdfSource { name, bytes }, password).await
}

/// Extract metadata from an already-validated source.
pub async fn inspect_source(
    source: PdfSource,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2ImgError> {
    let pwd = password.map(|s| s.to_string());
    tokio::task::spawn_blocking(move || render::extract_metadata_blocking(&source, pwd.as_deref()))
        .await
        .map_err(|e| Pdf2ImgError::Internal(format!("Metadata task panicked: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::progress::ConversionProgressCallback;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct ArtifactRecorder {
        completed: Mutex<Vec<(String, usize)>>,
    }

    impl ConversionProgressCallback for ArtifactRecorder {
        fn on_conversion_complete(&self, artifact_name: &str, artifact_bytes: usize) {
            self.completed
                .lock()
                .unwrap()
                .push((artifact_name.to_string(), artifact_bytes));
        }
    }

    fn page(index: usize) -> PageImage {
        PageImage {
            index,
            bytes: vec![index as u8; 16],
            format: OutputFormat::Png,
            width: 20,
            height: 30,
        }
    }

    #[tokio::test]
    async fn convert_bytes_rejects_non_pdf_before_rendering() {
        let request = ConversionRequest::builder("a.pdf").build().unwrap();
        let err = convert_bytes(b"GIF89a".to_vec(), &request, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::NotAPdf { .. }));
    }

    #[tokio::test]
    async fn convert_revalidates_hand_built_request() {
        let mut request = ConversionRequest::builder("a.pdf").build().unwrap();
        request.dpi = 0;
        let err = convert_bytes(b"%PDF-1.4".to_vec(), &request, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn convert_missing_file() {
        let request = ConversionRequest::builder("nope.pdf").build().unwrap();
        let err = convert("/no/such/nope.pdf", &request, &ConversionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn inspect_bytes_rejects_non_pdf() {
        let err = inspect_bytes(b"<html>".to_vec(), None).await.unwrap_err();
        assert!(matches!(err, Pdf2ImgError::NotAPdf { .. }));
    }

    #[test]
    fn packaging_reports_artifact_to_callback() {
        let recorder = Arc::new(ArtifactRecorder::default());
        let config = ConversionConfig::builder()
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        let request = ConversionRequest::builder("slides.pdf").build().unwrap();

        let (artifact, summaries) =
            package_pages(vec![page(1), page(2)], &request, &config).unwrap();

        assert_eq!(artifact.name, "slides_images.zip");
        assert_eq!(summaries.len(), 2);
        assert_eq!((summaries[1].index, summaries[1].width), (2, 20));
        assert_eq!(
            *recorder.completed.lock().unwrap(),
            vec![("slides_images.zip".to_string(), artifact.bytes.len())]
        );
    }

    #[test]
    fn failed_packaging_reports_nothing() {
        let recorder = Arc::new(ArtifactRecorder::default());
        let config = ConversionConfig::builder()
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        let request = ConversionRequest::builder("empty.pdf").build().unwrap();

        let err = package_pages(Vec::new(), &request, &config).unwrap_err();
        assert!(matches!(err, Pdf2ImgError::EmptyInput));
        assert!(recorder.completed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn inspect_url_honours_download_timeout() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/slow.pdf", listener.local_addr().unwrap());

        let config = ConversionConfig::builder()
            .download_timeout_secs(1)
            .build()
            .unwrap();
        let err = inspect(&url, None, &config).await.unwrap_err();
        assert!(
            matches!(err, Pdf2ImgError::DownloadTimeout { secs: 1, .. }),
            "got: {err:?}"
        );
        drop(listener);
    }

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        std::fs::write(&path, b"old").unwrap();

        write_atomic(dir.path(), &path, b"new bytes").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new bytes");
        // Only the target remains; the temp file was renamed onto it.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
