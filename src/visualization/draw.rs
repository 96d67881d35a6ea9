//! Drawing final detections onto the source image.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::annotations::detection::Detection;

/// Color for a class id: evenly spaced hues at full saturation. The mapping
/// is fixed so the same class draws the same color on every image and every
/// run.
pub fn class_color(class_id: usize, num_classes: usize) -> Rgb<u8> {
    let hue = class_id as f32 / num_classes.max(1) as f32;
    hsv_to_rgb(hue, 1.0, 1.0)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);
    let (r, g, b) = match (sector as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
}

/// Draw each detection as a hollow rectangle on `image`.
pub fn draw_detections(image: &mut RgbImage, detections: &[Detection], num_classes: usize) {
    for detection in detections {
        let width = detection.bbox.width().max(1.0) as u32;
        let height = detection.bbox.height().max(1.0) as u32;
        let rect = Rect::at(detection.bbox.xmin as i32, detection.bbox.ymin as i32)
            .of_size(width, height);
        draw_hollow_rect_mut(image, rect, class_color(detection.class_id, num_classes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::bounding_box::BoundingBox;

    #[test]
    fn class_zero_is_pure_red() {
        assert_eq!(class_color(0, 80), Rgb([255, 0, 0]));
    }

    #[test]
    fn colors_are_stable_and_distinct() {
        assert_eq!(class_color(7, 80), class_color(7, 80));
        assert_ne!(class_color(7, 80), class_color(33, 80));
    }

    #[test]
    fn drawing_touches_the_box_outline() {
        let mut image = RgbImage::from_pixel(20, 20, Rgb([0, 0, 0]));
        let detections = vec![Detection {
            bbox: BoundingBox::new(2.0, 3.0, 10.0, 12.0),
            score: 0.9,
            class_id: 0,
        }];
        draw_detections(&mut image, &detections, 80);
        assert_ne!(*image.get_pixel(2, 3), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(15, 15), Rgb([0, 0, 0]));
    }
}
