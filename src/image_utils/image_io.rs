use image::{ImageResult, RgbImage};
use std::path::Path;

/// Read an image file into an 8-bit RGB buffer.
pub fn read_image_as_rgb8(filepath: &Path) -> ImageResult<RgbImage> {
    Ok(image::open(filepath)?.into_rgb8())
}
