use image::RgbImage;
use notecam_proto::Detection;
use tracing::debug;

use crate::{
    composite::composite,
    markup::{draw_boxes, MarkupStyle},
    remap::LabelMap,
    report::ReportEntry,
    select::OverlaySelector,
};

/// Outcome of annotating one frame.
#[derive(Debug, Clone, Default)]
pub struct Annotated {
    pub placed: usize,
    pub skipped: usize,
    pub entries: Vec<ReportEntry>,
}

/// Remap, markup, note selection and compositing for a frame. Holds only read-only startup state.
#[derive(Debug)]
pub struct FrameAnnotator {
    labels: LabelMap,
    selector: OverlaySelector,
    markup: MarkupStyle,
    report_remapped: bool,
}

impl FrameAnnotator {
    pub fn new(labels: LabelMap, selector: OverlaySelector) -> Self {
        Self { labels, selector, markup: MarkupStyle::default(), report_remapped: false }
    }

    pub fn with_markup(mut self, markup: MarkupStyle) -> Self {
        self.markup = markup;
        self
    }

    /// Report the remapped text instead of the raw detector label.
    pub fn report_remapped(mut self, yes: bool) -> Self {
        self.report_remapped = yes;
        self
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn selector(&self) -> &OverlaySelector {
        &self.selector
    }

    /// Annotates `frame` in place. `detections` come back with remapped labels.
    pub fn annotate(&self, frame: &mut RgbImage, detections: &mut [Detection]) -> Annotated {
        let mut out = Annotated::default();
        if !self.report_remapped {
            out.entries = entries(detections);
        }

        self.labels.apply(detections);
        if self.report_remapped {
            out.entries = entries(detections);
        }

        draw_boxes(frame, detections, &self.markup);

        for d in detections.iter() {
            let Some(note) = self.selector.select(&d.label) else {
                debug!("overlay: no note for {:?}", d.label);
                continue;
            };
            match composite(frame, &d.bbox, &note) {
                Ok(_) => out.placed += 1,
                Err(e) => {
                    out.skipped += 1;
                    debug!("overlay: skip {:?}: {}", d.label, e);
                }
            }
        }
        out
    }
}

fn entries(detections: &[Detection]) -> Vec<ReportEntry> {
    detections
        .iter()
        .map(|d| ReportEntry { label: d.label.clone(), confidence: d.confidence })
        .collect()
}
