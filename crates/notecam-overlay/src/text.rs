use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use std::path::Path;

use crate::{OverlayError, TextStyle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine<'a> {
    pub text: &'a str,
    pub x: i32,
    /// Baseline.
    pub y: i32,
}

/// One line per whitespace-separated word, stepping down by `line_step`.
pub fn layout_lines<'a>(label: &'a str, style: &TextStyle) -> Vec<TextLine<'a>> {
    label
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| TextLine {
            text: word,
            x: style.x,
            y: style.y + style.line_step * i as i32,
        })
        .collect()
}

/// Writes labels onto copies of a note template.
pub struct NoteRenderer {
    template: RgbImage,
    font: FontVec,
    style: TextStyle,
}

impl std::fmt::Debug for NoteRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteRenderer")
            .field("template", &self.template.dimensions())
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl NoteRenderer {
    pub fn new(template: RgbImage, font: FontVec, style: TextStyle) -> Self {
        Self { template, font, style }
    }

    pub fn from_font_file(template: RgbImage, font_path: &Path, style: TextStyle) -> Result<Self, OverlayError> {
        let data = std::fs::read(font_path)
            .map_err(|source| OverlayError::FontIo { path: font_path.to_path_buf(), source })?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| OverlayError::Font { path: font_path.to_path_buf() })?;
        Ok(Self::new(template, font, style))
    }

    pub fn template(&self) -> &RgbImage {
        &self.template
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Renders `label` onto a fresh copy of the template. The template itself is never touched.
    pub fn render(&self, label: &str) -> RgbImage {
        let mut note = self.template.clone();
        let scale = PxScale::from(self.style.size_px);
        let ascent = self.font.as_scaled(scale).ascent().round() as i32;
        let color = Rgb(self.style.color);
        for line in layout_lines(label, &self.style) {
            draw_text_mut(&mut note, color, line.x, line.y - ascent, scale, &self.font, line.text);
        }
        note
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_line_per_word_with_increasing_baselines() {
        let style = TextStyle::default();
        let lines = layout_lines("STAY HYDRATED !!!", &style);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().map(|l| l.text).collect::<Vec<_>>(), ["STAY", "HYDRATED", "!!!"]);
        assert!(lines.iter().all(|l| l.x == 10));
        assert_eq!(lines.iter().map(|l| l.y).collect::<Vec<_>>(), [10, 30, 50]);
    }

    #[test]
    fn repeated_whitespace_does_not_add_lines() {
        let style = TextStyle { x: 4, y: 12, line_step: 15, ..TextStyle::default() };
        let lines = layout_lines("  GO   OUTSIDE ", &style);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].y < lines[1].y);
        assert_eq!(lines[1].y - lines[0].y, 15);
    }

    #[test]
    fn empty_label_has_no_lines() {
        assert!(layout_lines("", &TextStyle::default()).is_empty());
    }

    #[test]
    fn missing_font_is_reported() {
        let err = NoteRenderer::from_font_file(RgbImage::new(4, 4), Path::new("/nonexistent.ttf"), TextStyle::default())
            .err()
            .unwrap();
        assert!(matches!(err, OverlayError::FontIo { .. }));
    }

    #[test]
    fn garbage_font_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        let err = NoteRenderer::from_font_file(RgbImage::new(4, 4), &path, TextStyle::default())
            .err()
            .unwrap();
        assert!(matches!(err, OverlayError::Font { .. }));
    }
}
