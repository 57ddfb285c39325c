// Copyright @yucwang 2026

use super::ImageIoError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::Float;

use image::{Rgb, RgbImage};

fn linear_to_srgb(v: Float) -> Float {
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Clamps a linear radiance value to [0, 1] and encodes it as 8-bit sRGB.
pub fn tonemap_channel(v: Float) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    let c = linear_to_srgb(v.max(0.0).min(1.0));
    (c * 255.0 + 0.5).min(255.0) as u8
}

pub fn tonemap(bitmap: &Bitmap) -> RgbImage {
    RgbImage::from_fn(bitmap.width() as u32, bitmap.height() as u32, |x, y| {
        let p = bitmap[(x as usize, y as usize)];
        Rgb([tonemap_channel(p.x), tonemap_channel(p.y), tonemap_channel(p.z)])
    })
}

pub fn write_png_to_file(bitmap: &Bitmap, file_path: &str) -> Result<(), ImageIoError> {
    log::info!("Starting writing png image: {}.", file_path);
    tonemap(bitmap).save(file_path)?;
    log::info!("PNG written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::Vector3f;

    #[test]
    fn test_tonemap_channel() {
        assert_eq!(tonemap_channel(0.0), 0);
        assert_eq!(tonemap_channel(1.0), 255);
        assert_eq!(tonemap_channel(4.0), 255);
        assert_eq!(tonemap_channel(-1.0), 0);
        assert_eq!(tonemap_channel(Float::NAN), 0);
        // Mid grey lands well above 0.5 * 255 after gamma.
        assert!(tonemap_channel(0.18) > 110);
    }

    #[test]
    fn test_tonemap_bitmap_layout() {
        let mut bitmap = Bitmap::new(4, 2);
        bitmap[(3, 1)] = Vector3f::new(1.0, 0.0, 1.0);
        let image = tonemap(&bitmap);
        assert_eq!(image.dimensions(), (4, 2));
        assert_eq!(image.get_pixel(3, 1), &Rgb([255, 0, 255]));
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }
}
