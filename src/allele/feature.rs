use crate::utils::{Error, Result};
use itertools::Itertools;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Utr,
    Exon,
    Intron,
    Other,
}

impl FeatureKind {
    /// Feature key used in flat-file records.
    pub fn flat_file_key(&self) -> &'static str {
        match self {
            FeatureKind::Utr => "UTR",
            FeatureKind::Exon => "exon",
            FeatureKind::Intron => "intron",
            FeatureKind::Other => "misc_feature",
        }
    }
}

impl FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utr" => Ok(FeatureKind::Utr),
            "exon" => Ok(FeatureKind::Exon),
            "intron" => Ok(FeatureKind::Intron),
            "" => Err("feature kind cannot be empty".to_string()),
            _ => Ok(FeatureKind::Other),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Utr => write!(f, "UTR"),
            FeatureKind::Exon => write!(f, "Exon"),
            FeatureKind::Intron => write!(f, "Intron"),
            FeatureKind::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeatureStatus {
    Complete,
    Partial,
    #[default]
    Unknown,
}

impl FromStr for FeatureStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "complete" => Ok(FeatureStatus::Complete),
            "partial" => Ok(FeatureStatus::Partial),
            "unknown" => Ok(FeatureStatus::Unknown),
            _ => Err(format!("unknown feature status '{}'", s)),
        }
    }
}

/// A named sub-region of an allele sequence. Coordinates are 1-based and
/// inclusive, relative to the owning allele's sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub kind: FeatureKind,
    pub order: usize,
    pub start: usize,
    pub end: usize,
    pub status: FeatureStatus,
    pub frame: Option<u8>,
}

impl Feature {
    pub fn new(
        name: impl Into<String>,
        kind: FeatureKind,
        order: usize,
        start: usize,
        end: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            order,
            start,
            end,
            status: FeatureStatus::Unknown,
            frame: None,
        }
    }

    pub fn with_status(mut self, status: FeatureStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_frame(mut self, frame: Option<u8>) -> Self {
        self.frame = frame;
        self
    }

    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Same feature placed at a new span.
    pub fn moved_to(&self, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            ..self.clone()
        }
    }
}

/// Features of one allele in 5' to 3' biological order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureTable {
    features: Vec<Feature>,
}

impl FeatureTable {
    /// Orders features by `order` and checks that spans are well formed and
    /// non-overlapping.
    pub fn new(mut features: Vec<Feature>) -> std::result::Result<Self, String> {
        features.sort_by_key(|f| f.order);

        if let Some(bad) = features.iter().find(|f| f.start == 0 || f.start > f.end) {
            return Err(format!(
                "feature {} has invalid span {}..{}",
                bad.name, bad.start, bad.end
            ));
        }

        let by_start = features.iter().sorted_by_key(|f| f.start).collect_vec();
        for (prev, next) in by_start.iter().tuple_windows() {
            if next.start <= prev.end {
                return Err(format!(
                    "features {} ({}..{}) and {} ({}..{}) overlap",
                    prev.name, prev.start, prev.end, next.name, next.start, next.end
                ));
            }
        }

        if let Some(name) = features.iter().map(|f| &f.name).duplicates().next() {
            return Err(format!("duplicate feature name {}", name));
        }

        Ok(Self { features })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn by_kind(&self, kind: FeatureKind) -> Vec<&Feature> {
        self.features.iter().filter(|f| f.kind == kind).collect()
    }

    /// The `index`-th (1-based) feature of the given kind.
    pub fn nth_of_kind(&self, kind: FeatureKind, index: usize) -> Result<&Feature> {
        index
            .checked_sub(1)
            .and_then(|i| self.by_kind(kind).into_iter().nth(i))
            .ok_or_else(|| Error::NotFound(format!("{} {}", kind, index)))
    }

    /// True if the features cover `1..=seq_len` with no gaps.
    pub fn tiles(&self, seq_len: usize) -> bool {
        let mut expected_start = 1;
        for feature in self.features.iter().sorted_by_key(|f| f.start) {
            if feature.start != expected_start {
                return false;
            }
            expected_start = feature.end + 1;
        }
        !self.features.is_empty() && expected_start == seq_len + 1
    }

    /// Reassigns contiguous coordinates from each feature's current length.
    pub fn renormalized(&self) -> Self {
        let lengths = self.features.iter().map(Feature::len).collect_vec();
        let features = self
            .features
            .iter()
            .zip(normalize(&lengths))
            .map(|(feature, (start, end))| feature.moved_to(start, end))
            .collect();
        Self { features }
    }
}

impl<'a> IntoIterator for &'a FeatureTable {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// Contiguous 1-based inclusive spans for fragments of the given lengths.
pub fn normalize(lengths: &[usize]) -> Vec<(usize, usize)> {
    lengths
        .iter()
        .scan(0, |end, &len| {
            let start = *end + 1;
            *end += len;
            Some((start, *end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FeatureTable {
        FeatureTable::new(vec![
            Feature::new("3'UTR", FeatureKind::Utr, 4, 21, 30),
            Feature::new("5'UTR", FeatureKind::Utr, 1, 1, 5),
            Feature::new("Exon1", FeatureKind::Exon, 2, 6, 10),
            Feature::new("Intron1", FeatureKind::Intron, 3, 11, 20),
        ])
        .unwrap()
    }

    #[test]
    fn normalize_derives_cumulative_spans() {
        assert_eq!(
            normalize(&[9, 100, 50]),
            vec![(1, 9), (10, 109), (110, 159)]
        );
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn features_are_kept_in_biological_order() {
        let names = table().iter().map(|f| f.name.clone()).collect_vec();
        assert_eq!(names, vec!["5'UTR", "Exon1", "Intron1", "3'UTR"]);
    }

    #[test]
    fn nth_of_kind_counts_within_kind() {
        let table = table();
        assert_eq!(table.nth_of_kind(FeatureKind::Utr, 2).unwrap().name, "3'UTR");
        assert_eq!(table.nth_of_kind(FeatureKind::Exon, 1).unwrap().name, "Exon1");
        assert!(matches!(
            table.nth_of_kind(FeatureKind::Utr, 3),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            table.nth_of_kind(FeatureKind::Exon, 0),
            Err(Error::NotFound(_))
        ));
        assert_eq!(table.by_kind(FeatureKind::Utr).len(), 2);
    }

    #[test]
    fn tiling_requires_full_contiguous_cover() {
        let table = table();
        assert!(table.tiles(30));
        assert!(!table.tiles(31));

        let gapped = FeatureTable::new(vec![
            Feature::new("Exon2", FeatureKind::Exon, 1, 1, 10),
            Feature::new("Exon3", FeatureKind::Exon, 2, 12, 20),
        ])
        .unwrap();
        assert!(!gapped.tiles(20));
    }

    #[test]
    fn overlapping_features_are_rejected() {
        let result = FeatureTable::new(vec![
            Feature::new("Exon1", FeatureKind::Exon, 1, 1, 10),
            Feature::new("Intron1", FeatureKind::Intron, 2, 10, 20),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn inverted_span_is_rejected() {
        let result = FeatureTable::new(vec![Feature::new("Exon1", FeatureKind::Exon, 1, 10, 5)]);
        assert!(result.is_err());
    }

    #[test]
    fn renormalized_closes_gaps() {
        let gapped = FeatureTable::new(vec![
            Feature::new("Exon2", FeatureKind::Exon, 1, 50, 59),
            Feature::new("Exon3", FeatureKind::Exon, 2, 300, 399),
        ])
        .unwrap();
        let spans = gapped
            .renormalized()
            .iter()
            .map(|f| (f.start, f.end))
            .collect_vec();
        assert_eq!(spans, vec![(1, 10), (11, 110)]);
    }

    #[test]
    fn kinds_parse_case_insensitively() {
        assert_eq!("EXON".parse::<FeatureKind>().unwrap(), FeatureKind::Exon);
        assert_eq!("utr".parse::<FeatureKind>().unwrap(), FeatureKind::Utr);
        assert_eq!("enhancer".parse::<FeatureKind>().unwrap(), FeatureKind::Other);
        assert!("".parse::<FeatureKind>().is_err());
    }
}
