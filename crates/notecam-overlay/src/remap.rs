use notecam_proto::Detection;
use std::collections::HashMap;

/// Raw detector label -> display text. Built once at startup.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    map: HashMap<String, String>,
}

impl LabelMap {
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { map: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Mapped text for `label`, or `label` itself when unmapped.
    pub fn display<'a>(&'a self, label: &'a str) -> &'a str {
        self.map.get(label).map(String::as_str).unwrap_or(label)
    }

    /// Rewrites mapped labels in place. Unmapped labels are left alone.
    pub fn apply(&self, detections: &mut [Detection]) {
        for d in detections.iter_mut() {
            if let Some(v) = self.map.get(&d.label) {
                d.label.clone_from(v);
            }
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notecam_proto::BoundingBox;

    fn det(label: &str) -> Detection {
        Detection::new(label, 0.9, BoundingBox::new(0, 0, 10, 10))
    }

    fn labels() -> LabelMap {
        LabelMap::new([
            ("person", "SPREAD KINDNESS"),
            ("chair", "CAREFUL SITTING DOWN"),
            ("bottle", "STAY HYDRATED !!!"),
            ("tvmonitor", "GO OUTSIDE"),
        ])
    }

    #[test]
    fn mapped_labels_are_replaced_others_kept() {
        let mut dets = vec![det("person"), det("dog"), det("tvmonitor")];
        labels().apply(&mut dets);
        let got: Vec<_> = dets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(got, ["SPREAD KINDNESS", "dog", "GO OUTSIDE"]);
    }

    #[test]
    fn order_does_not_matter() {
        let map = labels();
        let mut a = vec![det("chair"), det("cat"), det("bottle")];
        let mut b = vec![det("bottle"), det("chair"), det("cat")];
        map.apply(&mut a);
        map.apply(&mut b);
        for d in &a {
            assert!(b.iter().any(|o| o.label == d.label));
        }
        assert_eq!(map.display("cat"), "cat");
        assert_eq!(map.display("chair"), "CAREFUL SITTING DOWN");
    }

    #[test]
    fn empty_map_is_noop() {
        let mut dets = vec![det("person")];
        LabelMap::default().apply(&mut dets);
        assert_eq!(dets[0].label, "person");
    }
}
