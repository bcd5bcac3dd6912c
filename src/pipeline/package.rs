//! Output packaging: turn the rendered pages into exactly one artifact.
//!
//! ## Naming
//!
//! | Pages | `force_zip` | Artifact | Entries |
//! |-------|-------------|----------|---------|
//! | 1     | false       | `{base}.{ext}` | |
//! | 1     | true        | `{base}_images.zip` | `{base}.{ext}` |
//! | n > 1 | any         | `{base}_images.zip` | `{base}_page_{001..n}.{ext}` |
//!
//! Page numbers are zero-padded to three digits so entries sort in page
//! order in every archive viewer for documents up to 999 pages.

use crate::error::Pdf2ImgError;
use crate::output::{OutputArtifact, PageImage, ZIP_MIME};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Package `pages` (in page order) as a single file or a ZIP archive.
///
/// # Errors
/// * [`Pdf2ImgError::EmptyInput`] when `pages` is empty.
/// * [`Pdf2ImgError::ArchiveFailed`] if the ZIP writer fails.
pub fn package(
    pages: Vec<PageImage>,
    base_name: &str,
    force_zip: bool,
) -> Result<OutputArtifact, Pdf2ImgError> {
    if pages.is_empty() {
        return Err(Pdf2ImgError::EmptyInput);
    }

    if pages.len() == 1 && !force_zip {
        let page = pages.into_iter().next().ok_or(Pdf2ImgError::EmptyInput)?;
        return Ok(OutputArtifact {
            name: format!("{}.{}", base_name, page.extension()),
            mime: page.mime().to_string(),
            bytes: page.bytes,
        });
    }

    let archive_name = format!("{base_name}_images.zip");
    let bytes = write_archive(&pages, base_name).map_err(|e| Pdf2ImgError::ArchiveFailed {
        name: archive_name.clone(),
        detail: e.to_string(),
    })?;

    debug!(
        "Packaged {} pages into '{}' ({} bytes)",
        pages.len(),
        archive_name,
        bytes.len()
    );

    Ok(OutputArtifact {
        name: archive_name,
        bytes,
        mime: ZIP_MIME.to_string(),
    })
}

/// Name of one page inside the archive.
pub fn entry_name(base_name: &str, page: &PageImage, page_count: usize) -> String {
    if page_count == 1 {
        format!("{}.{}", base_name, page.extension())
    } else {
        format!("{}_page_{:03}.{}", base_name, page.index, page.extension())
    }
}

fn write_archive(pages: &[PageImage], base_name: &str) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for page in pages {
        zip.start_file(entry_name(base_name, page, pages.len()), options)?;
        zip.write_all(&page.bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}
