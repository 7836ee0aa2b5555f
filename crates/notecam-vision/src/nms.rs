use crate::Candidate;

pub fn iou(a: &Candidate, b: &Candidate) -> f32 {
    let (x1a, y1a, x1b, y1b) = (a.cx - a.w / 2.0, a.cy - a.h / 2.0, a.cx + a.w / 2.0, a.cy + a.h / 2.0);
    let (x2a, y2a, x2b, y2b) = (b.cx - b.w / 2.0, b.cy - b.h / 2.0, b.cx + b.w / 2.0, b.cy + b.h / 2.0);

    let iw = (x1b.min(x2b) - x1a.max(x2a)).max(0.0);
    let ih = (y1b.min(y2b) - y1a.max(y2a)).max(0.0);
    let inter = iw * ih;
    let a1 = (x1b - x1a).max(0.0) * (y1b - y1a).max(0.0);
    let a2 = (x2b - x2a).max(0.0) * (y2b - y2a).max(0.0);
    let union = a1 + a2 - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}
