//! The resize-and-pad transform used to build the network input.

use image::{Rgb, RgbImage, imageops};
use ndarray::Array4;

/// Gray value filling the letterbox padding, matching what the model saw in
/// training.
const PAD_FILL: u8 = 128;

/// Aspect-preserving fit of an image into the model's square input.
///
/// The same parameters drive the forward pixel transform and the inverse
/// coordinate transform, so boxes decoded in network-input space land back
/// on the original image without drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub ratio: f32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    /// Transform parameters for an `orig_width x orig_height` image and a
    /// square input of side `input_size`.
    pub fn new(orig_width: u32, orig_height: u32, input_size: u32) -> Self {
        let side = input_size as f32;
        let ratio = (side / orig_width as f32).min(side / orig_height as f32);
        Letterbox {
            ratio,
            pad_x: (side - ratio * orig_width as f32) / 2.0,
            pad_y: (side - ratio * orig_height as f32) / 2.0,
        }
    }

    /// Map a coordinate from original-image space into network-input space.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.ratio + self.pad_x, y * self.ratio + self.pad_y)
    }

    /// Map a coordinate from network-input space back onto the original
    /// image. Exact inverse of [`Letterbox::apply`].
    pub fn invert(&self, x: f32, y: f32) -> (f32, f32) {
        ((x - self.pad_x) / self.ratio, (y - self.pad_y) / self.ratio)
    }
}

/// Resize an image into the model input tensor: aspect-preserving resize,
/// centered gray padding, /255 normalization, NHWC layout with batch size 1.
pub fn letterbox_image(image: &RgbImage, input_size: u32) -> Array4<f32> {
    let letterbox = Letterbox::new(image.width(), image.height(), input_size);
    let new_width = (letterbox.ratio * image.width() as f32) as u32;
    let new_height = (letterbox.ratio * image.height() as f32) as u32;
    let resized = imageops::resize(image, new_width, new_height, imageops::FilterType::Triangle);

    let side = input_size as usize;
    let mut tensor = Array4::from_elem((1, side, side, 3), PAD_FILL as f32 / 255.0);
    let pad_left = (input_size - new_width) / 2;
    let pad_top = (input_size - new_height) / 2;
    for (x, y, pixel) in resized.enumerate_pixels() {
        let row = (y + pad_top) as usize;
        let col = (x + pad_left) as usize;
        let Rgb([r, g, b]) = *pixel;
        tensor[[0, row, col, 0]] = r as f32 / 255.0;
        tensor[[0, row, col, 1]] = g as f32 / 255.0;
        tensor[[0, row, col, 2]] = b as f32 / 255.0;
    }
    tensor
}
