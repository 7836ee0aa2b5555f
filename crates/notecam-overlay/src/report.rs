use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub label: String,
    pub confidence: f32,
}

/// Sidebar text for one frame: model, inference time, frame rate, then one line per detection.
pub fn sidebar_lines(model_id: &str, inference: Duration, fps: f64, entries: &[ReportEntry]) -> Vec<String> {
    let mut text = Vec::with_capacity(4 + entries.len());
    text.push(format!("Model: {}", model_id));
    text.push(format!("Inference time: {:1.3} s", inference.as_secs_f64()));
    text.push("Objects:".to_string());
    text.push(format!("fps:{:2.2}", fps));
    for e in entries {
        text.push(format!("{}: {:2.2}%", e.label, e.confidence * 100.0));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_the_viewer_expects() {
        let lines = sidebar_lines(
            "mobilenet_ssd",
            Duration::from_millis(42),
            9.5,
            &[ReportEntry { label: "person".into(), confidence: 0.9731 }],
        );
        assert_eq!(
            lines,
            [
                "Model: mobilenet_ssd",
                "Inference time: 0.042 s",
                "Objects:",
                "fps:9.50",
                "person: 97.31%",
            ]
        );
    }

    #[test]
    fn no_detections_still_has_header() {
        let lines = sidebar_lines("m", Duration::ZERO, 0.0, &[]);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "fps:0.00");
    }
}
