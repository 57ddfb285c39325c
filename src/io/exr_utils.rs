/* Copyright 2020 @TwoCookingMice */

use super::ImageIoError;
use crate::math::bitmap::Bitmap;
use crate::math::constants::{Float, Vector3f};

use exr::prelude::*;

// Read EXR Image from file
pub fn read_exr_from_file(file_path: &str) -> std::result::Result<Bitmap, ImageIoError> {
    log::info!("Starting reading OpenEXR image from: {}.", file_path);

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _| Bitmap::new(resolution.width(), resolution.height()),
            |bitmap, position, (r, g, b, _a): (f32, f32, f32, f32)| {
                bitmap[(position.x(), position.y())] = Vector3f::new(r, g, b);
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_file(file_path)?;

    let bitmap = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", bitmap.width(), bitmap.height());
    Ok(bitmap)
}

// Write EXR Image to file
pub fn write_exr_to_file(image: &[(Float, Float, Float)],
                         width: usize,
                         height: usize,
                         file_path: &str) -> std::result::Result<(), ImageIoError> {
    log::info!("Starting writing openexr images: {}.", file_path);

    write_rgb_file(file_path, width, height, |x, y| {
        let p = image[y * width + x];
        (p.0, p.1, p.2)
    })?;
    log::info!("EXR written to: {}.", file_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_read_back_exr() {
        let path = std::env::temp_dir().join("millefeuille_exr_utils_test.exr");
        let path = path.to_string_lossy().to_string();
        let mut pixels = vec![(0.0, 0.0, 0.0); 6];
        pixels[5] = (0.25, 0.5, 2.0);
        write_exr_to_file(&pixels, 3, 2, &path).unwrap();

        let bitmap = read_exr_from_file(&path).unwrap();
        assert_eq!(bitmap.width(), 3);
        assert_eq!(bitmap.height(), 2);
        assert_eq!(bitmap[(2, 1)], Vector3f::new(0.25, 0.5, 2.0));
        assert_eq!(bitmap[(0, 0)], Vector3f::zeros());
        let _ = std::fs::remove_file(&path);
    }
}
