//! Saving rendered frames as PNG.

use std::path::Path;

use image::RgbaImage;
use tracing::info;

use crate::error::ExportError;
use crate::surface::PixelSurface;

/// Convert a surface into an 8-bit straight-alpha image.
pub fn to_image(surface: &PixelSurface) -> Result<RgbaImage, ExportError> {
    let (width, height) = surface.physical_size();
    if width == 0 || height == 0 {
        return Err(ExportError::EmptySurface);
    }
    let pixels = surface.to_rgba8();
    let bytes: &[u8] = bytemuck::cast_slice(&pixels);
    RgbaImage::from_raw(width, height, bytes.to_vec()).ok_or(ExportError::EmptySurface)
}

/// Write the surface to `path` as a PNG with a transparent background.
pub fn save_png(surface: &PixelSurface, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let image = to_image(surface)?;
    image.save_with_format(path, image::ImageFormat::Png)?;
    info!(path = %path.display(), width = image.width(), height = image.height(), "saved frame");
    Ok(())
}
