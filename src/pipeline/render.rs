//! PDF rasterisation via pdfium.
//!
//! Everything in this module is blocking and must run inside
//! `tokio::task::spawn_blocking`: pdfium keeps thread-local state and a page
//! render is pure CPU work. Pages are rendered strictly in document order,
//! and each raster is encoded and dropped before the next page is touched so
//! at most one full-resolution bitmap is alive at a time.

use crate::config::{ConversionConfig, ConversionRequest};
use crate::error::Pdf2ImgError;
use crate::output::{DocumentMetadata, PageImage};
use crate::pipeline::encode;
use crate::pipeline::input::PdfSource;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Bind to a pdfium shared library.
///
/// Lookup order: `PDFIUM_LIB_PATH` (a library file or the directory holding
/// it), the current directory, then the system library search path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2ImgError> {
    let mut attempts: Vec<String> = Vec::new();

    if let Ok(env_path) = std::env::var("PDFIUM_LIB_PATH") {
        let p = PathBuf::from(&env_path);
        let lib = if p.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&p)
        } else {
            p
        };
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => attempts.push(format!("{}: {:?}", lib.display(), e)),
        }
    }

    let local = Pdfium::pdfium_platform_library_name_at_path("./");
    match Pdfium::bind_to_library(&local) {
        Ok(bindings) => return Ok(Pdfium::new(bindings)),
        Err(e) => attempts.push(format!("{}: {:?}", local.display(), e)),
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(e) => {
            attempts.push(format!("system library: {:?}", e));
            Err(Pdf2ImgError::PdfiumBindingFailed(attempts.join("; ")))
        }
    }
}

/// Pixel size for a page of `width_pt` × `height_pt` points rendered at `dpi`,
/// with the longest edge capped at `max_pixels`.
pub fn target_size(width_pt: f32, height_pt: f32, dpi: u32, max_pixels: u32) -> (u32, u32) {
    let scale = dpi as f32 / 72.0;
    let width = (width_pt * scale).round().max(1.0);
    let height = (height_pt * scale).round().max(1.0);

    let longest = width.max(height);
    if longest <= max_pixels as f32 {
        return (width as u32, height as u32);
    }

    let ratio = max_pixels as f32 / longest;
    (
        ((width * ratio).round() as u32).max(1),
        ((height * ratio).round() as u32).max(1),
    )
}

/// Load `source` and render + encode every page in order.
pub fn render_document_blocking(
    source: &PdfSource,
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<Vec<PageImage>, Pdf2ImgError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, source, request.password.as_deref())?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF '{}' loaded: {} pages", source.name, total_pages);

    if total_pages == 0 {
        return Err(Pdf2ImgError::EmptyInput);
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total_pages);
    }

    let mut results = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let (width, height) = target_size(
            page.width().value,
            page.height().value,
            request.dpi,
            config.max_rendered_pixels,
        );

        let render_config = PdfRenderConfig::new()
            .set_target_width(width as i32)
            .set_target_height(height as i32)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2ImgError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );

        let bytes = encode::encode_page(&image, request.format, config.jpeg_quality).map_err(
            |e| Pdf2ImgError::EncodeFailed {
                page: page_num,
                format: request.format.to_string(),
                detail: e.to_string(),
            },
        )?;

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_rendered(page_num, total_pages, bytes.len());
        }

        results.push(PageImage {
            index: page_num,
            bytes,
            format: request.format,
            width: image.width(),
            height: image.height(),
        });
    }

    Ok(results)
}

/// Read document metadata without rendering any page.
pub fn extract_metadata_blocking(
    source: &PdfSource,
    password: Option<&str>,
) -> Result<DocumentMetadata, Pdf2ImgError> {
    let pdfium = bind_pdfium()?;
    let document = load_document(&pdfium, source, password)?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

fn load_document<'a>(
    pdfium: &'a Pdfium,
    source: &'a PdfSource,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, Pdf2ImgError> {
    pdfium
        .load_pdf_from_byte_slice(&source.bytes, password)
        .map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    Pdf2ImgError::WrongPassword {
                        name: source.name.clone(),
                    }
                } else {
                    Pdf2ImgError::PasswordRequired {
                        name: source.name.clone(),
                    }
                }
            } else {
                Pdf2ImgError::CorruptPdf {
                    name: source.name.clone(),
                    detail: err_str,
                }
            }
        })
}
