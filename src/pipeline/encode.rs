//! Image encoding: `DynamicImage` → PNG, JPEG or SVG bytes.
//!
//! pdfium only rasterises, so SVG output wraps the page raster in an SVG
//! document as a base64 PNG `<image>`. The result opens in any SVG viewer
//! and keeps the page's pixel dimensions in its `viewBox`.

use crate::config::OutputFormat;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rendered page in `format`.
///
/// JPEG has no alpha channel: the alpha plane is dropped, which is lossless
/// in practice because pdfium renders onto an opaque white background.
pub fn encode_page(
    img: &DynamicImage,
    format: OutputFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, image::ImageError> {
    let bytes = match format {
        OutputFormat::Png => encode_png(img)?,
        OutputFormat::Jpg => {
            let rgb = img.to_rgb8();
            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, jpeg_quality).encode_image(&rgb)?;
            buf
        }
        OutputFormat::Svg => wrap_svg(&encode_png(img)?, img.width(), img.height()).into_bytes(),
    };

    debug!(
        "Encoded {}x{} page as {} → {} bytes",
        img.width(),
        img.height(),
        format,
        bytes.len()
    );
    Ok(bytes)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Build an SVG document embedding `png` at `width` × `height` pixels.
fn wrap_svg(png: &[u8], width: u32, height: u32) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n\
  <image x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" \
xlink:href=\"data:image/png;base64,{}\"/>\n\
</svg>\n",
        STANDARD.encode(png)
    )
}
