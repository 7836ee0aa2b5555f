use image::{Rgb, RgbImage};
use notecam_overlay::{
    markup::MarkupStyle,
    report::sidebar_lines,
    FrameAnnotator, LabelMap, OverlaySelector,
};
use notecam_proto::{BoundingBox, Detection};
use std::{collections::HashMap, time::Duration};

fn camera_frame() -> RgbImage {
    RgbImage::from_fn(640, 480, |x, y| Rgb([(x % 251) as u8, (y % 241) as u8, 90]))
}

fn no_boxes() -> MarkupStyle {
    MarkupStyle { enable: false, thickness: 1 }
}

#[test]
fn person_gets_shared_note_and_raw_label_is_reported() {
    let note = RgbImage::from_pixel(80, 40, Rgb([250, 240, 200]));
    let annotator = FrameAnnotator::new(
        LabelMap::new([("person", "SPREAD KINDNESS")]),
        OverlaySelector::Single(note.clone()),
    )
    .with_markup(no_boxes());

    let input = camera_frame();
    let mut frame = input.clone();
    let mut dets = vec![Detection::new("person", 0.8765, BoundingBox::new(100, 50, 200, 300))];
    let out = annotator.annotate(&mut frame, &mut dets);

    assert_eq!(out.placed, 1);
    assert_eq!(out.skipped, 0);
    assert_eq!(dets[0].label, "SPREAD KINDNESS");

    for (x, y, px) in frame.enumerate_pixels() {
        if (120..200).contains(&x) && (50..90).contains(&y) {
            assert_eq!(px, note.get_pixel(x - 120, y - 50));
        } else {
            assert_eq!(px, input.get_pixel(x, y));
        }
    }

    let text = sidebar_lines("alwaysai/mobilenet_ssd", Duration::from_millis(31), 12.0, &out.entries);
    assert!(text.iter().all(|l| !l.contains("SPREAD KINDNESS")));
    assert!(text.contains(&"person: 87.65%".to_string()));
}

#[test]
fn remapped_labels_can_be_reported() {
    let annotator = FrameAnnotator::new(
        LabelMap::new([("bottle", "STAY HYDRATED !!!")]),
        OverlaySelector::PerLabel(HashMap::new()),
    )
    .report_remapped(true);

    let mut frame = RgbImage::new(64, 64);
    let mut dets = vec![Detection::new("bottle", 0.5, BoundingBox::new(1, 1, 30, 30))];
    let out = annotator.annotate(&mut frame, &mut dets);
    assert_eq!(out.entries[0].label, "STAY HYDRATED !!!");
    assert_eq!(out.placed, 0);
}

#[test]
fn out_of_bounds_note_is_skipped_and_others_still_drawn() {
    let note = RgbImage::from_pixel(80, 40, Rgb([1, 2, 3]));
    let annotator = FrameAnnotator::new(LabelMap::default(), OverlaySelector::Single(note)).with_markup(no_boxes());

    let input = camera_frame();
    let mut frame = input.clone();
    let mut dets = vec![
        Detection::new("chair", 0.7, BoundingBox::new(0, 10, 30, 100)),      // too close to the left edge
        Detection::new("chair", 0.7, BoundingBox::new(500, 460, 600, 479)),  // runs off the bottom
        Detection::new("tvmonitor", 0.9, BoundingBox::new(300, 100, 400, 200)),
    ];
    let out = annotator.annotate(&mut frame, &mut dets);
    assert_eq!(out.placed, 1);
    assert_eq!(out.skipped, 2);
    assert_eq!(frame.get_pixel(320, 100), &Rgb([1, 2, 3]));
    assert_eq!(frame.get_pixel(10, 10), input.get_pixel(10, 10));
    assert_eq!(frame.get_pixel(590, 470), input.get_pixel(590, 470));
}

#[test]
fn unmatched_label_does_not_reuse_previous_note() {
    let kindness = RgbImage::from_pixel(10, 10, Rgb([255, 0, 0]));
    let selector = OverlaySelector::PerLabel(HashMap::from([("SPREAD KINDNESS".to_string(), kindness)]));
    let annotator = FrameAnnotator::new(LabelMap::new([("person", "SPREAD KINDNESS")]), selector)
        .with_markup(no_boxes());

    let input = camera_frame();
    let mut frame = input.clone();
    let mut dets = vec![
        Detection::new("person", 0.9, BoundingBox::new(10, 10, 100, 100)),
        Detection::new("dog", 0.9, BoundingBox::new(200, 200, 300, 300)),
    ];
    let out = annotator.annotate(&mut frame, &mut dets);
    assert_eq!(out.placed, 1);
    assert_eq!(frame.get_pixel(95, 15), &Rgb([255, 0, 0]));
    // dog's placement would be [290,300)x[200,210)
    assert_eq!(frame.get_pixel(295, 205), input.get_pixel(295, 205));

    // same detections in reverse order give the same picture
    let mut frame2 = input.clone();
    let mut rev = vec![
        Detection::new("dog", 0.9, BoundingBox::new(200, 200, 300, 300)),
        Detection::new("person", 0.9, BoundingBox::new(10, 10, 100, 100)),
    ];
    annotator.annotate(&mut frame2, &mut rev);
    assert_eq!(frame, frame2);
}
