use image::RgbImage;
use std::{borrow::Cow, collections::HashMap, path::Path};
use tracing::info;

use crate::{assets::load_scaled, text::NoteRenderer, OverlayConfig, OverlayError};

/// Chooses the note for a display label. Selection depends on the label only.
#[derive(Debug)]
pub enum OverlaySelector {
    Single(RgbImage),
    PerLabel(HashMap<String, RgbImage>),
    DynamicText(NoteRenderer),
}

impl OverlaySelector {
    /// Loads and pre-scales every asset named by `cfg`. Relative paths resolve against `base_dir`.
    pub fn load(cfg: &OverlayConfig, base_dir: &Path) -> Result<Self, OverlayError> {
        let sel = match cfg {
            OverlayConfig::Single { image, scale } => {
                Self::Single(load_scaled(&base_dir.join(image), *scale)?)
            }
            OverlayConfig::PerLabel { scale, assets } => {
                let mut map = HashMap::with_capacity(assets.len());
                for (label, path) in assets {
                    map.insert(label.clone(), load_scaled(&base_dir.join(path), *scale)?);
                }
                Self::PerLabel(map)
            }
            OverlayConfig::DynamicText { template, scale, font_path, text } => {
                let template = load_scaled(&base_dir.join(template), *scale)?;
                Self::DynamicText(NoteRenderer::from_font_file(template, &base_dir.join(font_path), text.clone())?)
            }
        };
        info!("overlay: policy={} assets={}", sel.policy_name(), sel.asset_count());
        Ok(sel)
    }

    pub fn policy_name(&self) -> &'static str {
        match self {
            Self::Single(_) => "single",
            Self::PerLabel(_) => "per-label",
            Self::DynamicText(_) => "dynamic-text",
        }
    }

    pub fn asset_count(&self) -> usize {
        match self {
            Self::Single(_) | Self::DynamicText(_) => 1,
            Self::PerLabel(m) => m.len(),
        }
    }

    /// `None` means no note for this label.
    pub fn select(&self, label: &str) -> Option<Cow<'_, RgbImage>> {
        match self {
            Self::Single(img) => Some(Cow::Borrowed(img)),
            Self::PerLabel(map) => map.get(label).map(Cow::Borrowed),
            Self::DynamicText(r) => Some(Cow::Owned(r.render(label))),
        }
    }
}
