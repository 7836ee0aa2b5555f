use image::{imageops::FilterType, RgbImage};
use std::path::Path;
use tracing::debug;

use crate::{OverlayError, Scale};

/// Loads an image from disk and resizes it once by `scale`.
///
/// Target dimensions are truncated toward zero, never below 1px.
pub fn load_scaled(path: &Path, scale: Scale) -> Result<RgbImage, OverlayError> {
    let img = image::open(path)
        .map_err(|source| OverlayError::Asset { path: path.to_path_buf(), source })?
        .to_rgb8();
    let out = scale_image(&img, scale)?;
    debug!(
        "overlay: loaded {} {}x{} -> {}x{}",
        path.display(),
        img.width(),
        img.height(),
        out.width(),
        out.height()
    );
    Ok(out)
}

pub fn scale_image(img: &RgbImage, scale: Scale) -> Result<RgbImage, OverlayError> {
    if !(scale.w > 0.0 && scale.h > 0.0) {
        return Err(OverlayError::BadScale { w: scale.w, h: scale.h });
    }
    let w = ((img.width() as f32 * scale.w) as u32).max(1);
    let h = ((img.height() as f32 * scale.h) as u32).max(1);
    Ok(image::imageops::resize(img, w, h, FilterType::Triangle))
}
