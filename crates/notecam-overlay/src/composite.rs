use image::RgbImage;
use notecam_proto::BoundingBox;

use crate::OverlayError;

/// Destination rectangle of a note: right edge on the box's right edge, top on the box's top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn fits(&self, frame_w: u32, frame_h: u32) -> bool {
        self.x >= 0
            && self.y >= 0
            && self.x + self.width as i64 <= frame_w as i64
            && self.y + self.height as i64 <= frame_h as i64
    }
}

pub fn placement(bbox: &BoundingBox, width: u32, height: u32) -> Placement {
    Placement {
        x: bbox.end_x as i64 - width as i64,
        y: bbox.start_y as i64,
        width,
        height,
    }
}

/// Copies `note` into `frame` at the box's placement, replacing pixels outright.
///
/// A placement that does not fit entirely inside the frame writes nothing and returns
/// [`OverlayError::OutOfBounds`].
pub fn composite(frame: &mut RgbImage, bbox: &BoundingBox, note: &RgbImage) -> Result<Placement, OverlayError> {
    let p = placement(bbox, note.width(), note.height());
    let (frame_w, frame_h) = frame.dimensions();
    if !p.fits(frame_w, frame_h) {
        return Err(OverlayError::OutOfBounds {
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
            frame_w,
            frame_h,
        });
    }
    image::imageops::replace(frame, note, p.x, p.y);
    Ok(p)
}
