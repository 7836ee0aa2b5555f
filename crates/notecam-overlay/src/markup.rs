use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};
use notecam_proto::Detection;
use serde::Deserialize;

const PALETTE: [[u8; 3]; 8] = [
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
];

#[derive(Debug, Clone, Deserialize)]
pub struct MarkupStyle {
    #[serde(default = "default_enable")]
    pub enable: bool,
    #[serde(default = "default_thickness")]
    pub thickness: u32,
}

fn default_enable() -> bool { true }
fn default_thickness() -> u32 { 1 }

impl Default for MarkupStyle {
    fn default() -> Self {
        Self { enable: default_enable(), thickness: default_thickness() }
    }
}

/// Stable colour for a label (FNV-1a over the bytes).
pub fn label_color(label: &str) -> Rgb<u8> {
    let mut h: u32 = 0x811c_9dc5;
    for b in label.bytes() {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    Rgb(PALETTE[h as usize % PALETTE.len()])
}

/// Draws each detection's box. Labels and confidences are not written on the frame.
pub fn draw_boxes(frame: &mut RgbImage, detections: &[Detection], style: &MarkupStyle) {
    if !style.enable {
        return;
    }
    for d in detections {
        let color = label_color(&d.label);
        for t in 0..style.thickness.max(1) {
            let t = t as i32;
            let w = d.bbox.width() as i32 - 2 * t;
            let h = d.bbox.height() as i32 - 2 * t;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(d.bbox.start_x + t, d.bbox.start_y + t).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(frame, rect, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notecam_proto::BoundingBox;

    #[test]
    fn color_is_stable_per_label() {
        assert_eq!(label_color("person"), label_color("person"));
        assert!(PALETTE.contains(&label_color("chair").0));
    }

    #[test]
    fn draws_box_edges_only() {
        let mut frame = RgbImage::new(20, 20);
        let d = Detection::new("person", 0.8, BoundingBox::new(2, 3, 12, 10));
        draw_boxes(&mut frame, &[d], &MarkupStyle::default());
        let c = label_color("person");
        assert_eq!(frame.get_pixel(2, 3), &c);
        assert_eq!(frame.get_pixel(11, 9), &c);
        assert_eq!(frame.get_pixel(6, 6), &Rgb([0, 0, 0]));
    }

    #[test]
    fn disabled_markup_draws_nothing() {
        let mut frame = RgbImage::new(20, 20);
        let d = Detection::new("person", 0.8, BoundingBox::new(2, 3, 12, 10));
        draw_boxes(&mut frame, &[d], &MarkupStyle { enable: false, thickness: 2 });
        assert!(frame.pixels().all(|p| p == &Rgb([0, 0, 0])));
    }

    #[test]
    fn boxes_partly_outside_frame_are_clipped() {
        let mut frame = RgbImage::new(10, 10);
        let d = Detection::new("cat", 0.8, BoundingBox::new(-5, -5, 30, 30));
        draw_boxes(&mut frame, &[d], &MarkupStyle::default());
    }
}
