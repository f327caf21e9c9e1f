//! PNG signature stamping.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::ImageFormat;

use super::canvas::{ImageHandle, OverlayDocument};
use super::layout::Rect;
use super::RenderError;

fn deflate(bytes: &[u8]) -> Result<Vec<u8>, RenderError> {
    let compress_err = |e: std::io::Error| RenderError::Serialize(format!("failed to compress image: {}", e));
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).map_err(compress_err)?;
    encoder.finish().map_err(compress_err)
}

/// Decodes PNG bytes and registers them as an image XObject. The alpha
/// channel becomes a soft mask so transparent pad areas stay transparent.
pub fn embed_png(canvas: &mut OverlayDocument, png: &[u8]) -> Result<ImageHandle, RenderError> {
    let decoded = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|e| RenderError::ImageDecode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    let mut alpha = Vec::with_capacity((width * height) as usize);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let opaque = alpha.iter().all(|&a| a == u8::MAX);
    let alpha = if opaque { None } else { Some(deflate(&alpha)?) };
    log::debug!("embedding {}x{} signature image (soft mask: {})", width, height, alpha.is_some());
    Ok(canvas.add_image(width, height, deflate(&rgb)?, alpha))
}

/// Draws `png` stretched to `rect`. Missing bytes draw nothing.
pub fn stamp_png(
    canvas: &mut OverlayDocument,
    page: usize,
    png: Option<&[u8]>,
    rect: Rect,
) -> Result<(), RenderError> {
    let Some(png) = png.filter(|bytes| !bytes.is_empty()) else {
        return Ok(());
    };
    if page >= canvas.page_count() {
        return Err(RenderError::PageOutOfRange {
            page,
            pages: canvas.page_count(),
        });
    }
    let handle = embed_png(canvas, png)?;
    canvas.draw_image(page, &handle, rect)
}
