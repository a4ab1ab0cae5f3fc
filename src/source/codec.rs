use std::path::Path;

use anyhow::Context;

use crate::foundation::core::Color;
use crate::foundation::error::{TileReelError, TileReelResult};

/// Decode encoded image bytes and scale them to exactly `width x height` packed ARGB pixels.
///
/// Scaling is nearest-neighbour; aspect ratio is not preserved.
pub fn decode_scaled(bytes: &[u8], width: u32, height: u32) -> TileReelResult<Vec<u32>> {
    if width == 0 || height == 0 {
        return Err(TileReelError::decode(format!(
            "target size must be non-zero, got {width}x{height}"
        )));
    }
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let scaled = if dyn_img.width() == width && dyn_img.height() == height {
        dyn_img
    } else {
        dyn_img.resize_exact(width, height, image::imageops::FilterType::Nearest)
    };
    let rgba = scaled.to_rgba8();
    Ok(rgba.pixels().map(|p| Color::from_rgba8(p.0)).collect())
}

/// Read a file and hand it to [`decode_scaled`]; any failure is reported as a decode error.
pub fn decode_file_scaled(path: &Path, width: u32, height: u32) -> TileReelResult<Vec<u32>> {
    let bytes = std::fs::read(path)
        .map_err(|e| TileReelError::decode(format!("read '{}': {e}", path.display())))?;
    decode_scaled(&bytes, width, height)
        .map_err(|e| TileReelError::decode(format!("'{}': {e}", path.display())))
}

/// Write packed ARGB pixels as an RGBA8 PNG.
pub fn write_png(path: &Path, pixels: &[u32], width: u32, height: u32) -> TileReelResult<()> {
    let expected = width as usize * height as usize;
    if pixels.len() != expected {
        return Err(TileReelError::size_mismatch(expected, pixels.len()));
    }
    let mut raw = Vec::with_capacity(expected * 4);
    for &px in pixels {
        raw.extend_from_slice(&Color::to_rgba8(px));
    }
    image::save_buffer_with_format(
        path,
        &raw,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/source/codec.rs"]
mod tests;
