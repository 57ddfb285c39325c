// Copyright @yucwang 2026

pub mod exr_utils;
pub mod png_utils;

use crate::math::bitmap::Bitmap;
use std::path::Path;

#[derive(Debug)]
pub enum ImageIoError {
    Exr(exr::error::Error),
    Image(image::ImageError),
    UnsupportedFormat(String),
}

impl From<exr::error::Error> for ImageIoError {
    fn from(err: exr::error::Error) -> Self {
        ImageIoError::Exr(err)
    }
}

impl From<image::ImageError> for ImageIoError {
    fn from(err: image::ImageError) -> Self {
        ImageIoError::Image(err)
    }
}

impl std::fmt::Display for ImageIoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageIoError::Exr(err) => write!(f, "EXR error: {}", err),
            ImageIoError::Image(err) => write!(f, "image error: {}", err),
            ImageIoError::UnsupportedFormat(ext) => write!(f, "unsupported output format: {}", ext),
        }
    }
}

impl std::error::Error for ImageIoError {}

/// Writes `bitmap` as EXR (linear) or PNG (tonemapped), chosen by extension.
pub fn write_bitmap(bitmap: &Bitmap, file_path: &str) -> Result<(), ImageIoError> {
    let ext = Path::new(file_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "exr" => exr_utils::write_exr_to_file(&bitmap.raw_copy(), bitmap.width(), bitmap.height(), file_path),
        "png" => png_utils::write_png_to_file(bitmap, file_path),
        _ => Err(ImageIoError::UnsupportedFormat(ext)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension_is_rejected() {
        let bitmap = Bitmap::new(2, 2);
        match write_bitmap(&bitmap, "out.tga") {
            Err(ImageIoError::UnsupportedFormat(ext)) => assert_eq!(ext, "tga"),
            _ => panic!("expected unsupported format"),
        }
    }
}
