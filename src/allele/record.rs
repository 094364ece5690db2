use super::{
    feature::{Feature, FeatureKind, FeatureStatus, FeatureTable},
    locus::locus_of,
};
use crate::utils::{Error, Result};
use itertools::Itertools;
use std::{collections::BTreeSet, str::FromStr};

/// Sample names from this lab mark large-scale typing submissions.
const LSL_SAMPLE_TAG: &str = "DKMS-LSL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CwdStatus {
    Common,
    WellDocumented,
    Rare,
    #[default]
    Unknown,
}

impl FromStr for CwdStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "common" | "c" => Ok(CwdStatus::Common),
            "well-documented" | "well documented" | "wd" => Ok(CwdStatus::WellDocumented),
            "rare" | "r" => Ok(CwdStatus::Rare),
            "unknown" | "" => Ok(CwdStatus::Unknown),
            _ => Err(format!("unknown CWD status '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlleleMetadata {
    pub id: String,
    pub g_group: Option<String>,
    pub p_group: Option<String>,
    pub cwd_status: CwdStatus,
    pub ethnicities: BTreeSet<String>,
    pub sample_names: BTreeSet<String>,
}

/// One allele as delivered by the database parser. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleRecord {
    name: String,
    sequence: String,
    features: FeatureTable,
    metadata: AlleleMetadata,
    is_complete: bool,
    is_lsl: bool,
}

impl AlleleRecord {
    pub fn new(
        name: impl Into<String>,
        sequence: impl Into<String>,
        features: Vec<Feature>,
        metadata: AlleleMetadata,
    ) -> Result<Self> {
        let name = name.into();
        let sequence = sequence.into();
        let invalid = |message: String| Error::InvalidFeatureTable {
            allele: name.clone(),
            message,
        };

        if let Some(c) = sequence
            .chars()
            .find(|c| !(c.is_ascii_alphabetic() || matches!(c, '-' | '.' | '*')))
        {
            return Err(invalid(format!("unexpected sequence character '{}'", c)));
        }

        let features = FeatureTable::new(features).map_err(&invalid)?;
        if let Some(outside) = features.iter().find(|f| f.end > sequence.len()) {
            return Err(invalid(format!(
                "feature {} ends at {} beyond sequence length {}",
                outside.name,
                outside.end,
                sequence.len()
            )));
        }

        let is_complete = is_full_length(&features, sequence.len());
        let is_lsl = metadata
            .sample_names
            .iter()
            .any(|sample| sample.contains(LSL_SAMPLE_TAG));

        Ok(Self {
            name,
            sequence,
            features,
            metadata,
            is_complete,
            is_lsl,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locus(&self) -> Option<String> {
        locus_of(&self.name)
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn features(&self) -> &FeatureTable {
        &self.features
    }

    pub fn metadata(&self) -> &AlleleMetadata {
        &self.metadata
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn is_lsl(&self) -> bool {
        self.is_lsl
    }

    /// Subsequence covered by one of this record's features.
    pub fn slice(&self, feature: &Feature) -> &str {
        &self.sequence[feature.start - 1..feature.end]
    }
}

fn is_full_length(features: &FeatureTable, seq_len: usize) -> bool {
    let Some(first) = features.iter().next() else {
        return false;
    };
    let consecutive_order = features
        .iter()
        .tuple_windows()
        .all(|(prev, next)| next.order == prev.order + 1);

    features.tiles(seq_len)
        && first.kind == FeatureKind::Utr
        && consecutive_order
        && features.iter().all(|f| f.status != FeatureStatus::Partial)
}

/// Read-only accessors shared by a single allele and a whole collection.
pub trait AlleleView {
    fn alleles(&self) -> Box<dyn Iterator<Item = &AlleleRecord> + '_>;

    fn names(&self) -> Vec<&str> {
        self.alleles().map(AlleleRecord::name).collect()
    }

    fn sequences(&self) -> Vec<&str> {
        self.alleles().map(AlleleRecord::sequence).collect()
    }

    fn feature_tables(&self) -> Vec<&FeatureTable> {
        self.alleles().map(AlleleRecord::features).collect()
    }

    fn ids(&self) -> Vec<&str> {
        self.alleles().map(|a| a.metadata().id.as_str()).collect()
    }

    fn g_groups(&self) -> Vec<Option<&str>> {
        self.alleles()
            .map(|a| a.metadata().g_group.as_deref())
            .collect()
    }

    fn p_groups(&self) -> Vec<Option<&str>> {
        self.alleles()
            .map(|a| a.metadata().p_group.as_deref())
            .collect()
    }

    fn cwd_statuses(&self) -> Vec<CwdStatus> {
        self.alleles().map(|a| a.metadata().cwd_status).collect()
    }

    fn completeness(&self) -> Vec<bool> {
        self.alleles().map(AlleleRecord::is_complete).collect()
    }
}

impl AlleleView for AlleleRecord {
    fn alleles(&self) -> Box<dyn Iterator<Item = &AlleleRecord> + '_> {
        Box::new(std::iter::once(self))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn complete_record(name: &str, exon2: &str) -> AlleleRecord {
        let utr5 = "ACGTA";
        let exon1 = "CCGGA";
        let intron1 = "TTTTTAAAAA";
        let utr3 = "GATCA";
        let sequence = format!("{}{}{}{}{}", utr5, exon1, intron1, exon2, utr3);
        let e2_start = 21;
        let e2_end = 20 + exon2.len();
        AlleleRecord::new(
            name,
            sequence,
            vec![
                Feature::new("5'UTR", FeatureKind::Utr, 1, 1, 5),
                Feature::new("Exon1", FeatureKind::Exon, 2, 6, 10),
                Feature::new("Intron1", FeatureKind::Intron, 3, 11, 20),
                Feature::new("Exon2", FeatureKind::Exon, 4, e2_start, e2_end),
                Feature::new("3'UTR", FeatureKind::Utr, 5, e2_end + 1, e2_end + 5),
            ],
            AlleleMetadata {
                id: format!("HLA{}", name.len()),
                ..Default::default()
            },
        )
        .unwrap()
    }

    pub fn exon2_record(name: &str, exon2: &str) -> AlleleRecord {
        AlleleRecord::new(
            name,
            exon2,
            vec![Feature::new("Exon2", FeatureKind::Exon, 4, 1, exon2.len())
                .with_status(FeatureStatus::Complete)],
            AlleleMetadata::default(),
        )
        .unwrap()
    }

    #[test]
    fn tiled_record_with_utrs_is_complete() {
        let record = complete_record("A*01:01:01:01", "ACGTACGTAC");
        assert!(record.is_complete());
        assert_eq!(record.len(), 35);
        assert_eq!(
            record.slice(record.features().get("Exon2").unwrap()),
            "ACGTACGTAC"
        );
        assert_eq!(record.locus().unwrap(), "HLA-A");
    }

    #[test]
    fn exon_only_record_is_partial() {
        let record = exon2_record("A*01:03", "ACGTACGTAA");
        assert!(!record.is_complete());
    }

    #[test]
    fn tiled_record_without_trailing_utr_is_complete() {
        let record = AlleleRecord::new(
            "A*01:01:01:01",
            "AAAACCCCGGTT",
            vec![
                Feature::new("5'UTR", FeatureKind::Utr, 1, 1, 4),
                Feature::new("Exon1", FeatureKind::Exon, 2, 5, 8),
                Feature::new("Intron1", FeatureKind::Intron, 3, 9, 10),
                Feature::new("Exon2", FeatureKind::Exon, 4, 11, 12),
            ],
            AlleleMetadata::default(),
        )
        .unwrap();
        assert!(record.is_complete());
    }

    #[test]
    fn tiled_record_without_leading_utr_is_partial() {
        let record = AlleleRecord::new(
            "A*01:07",
            "CCCCGGTT",
            vec![
                Feature::new("Exon1", FeatureKind::Exon, 2, 1, 4),
                Feature::new("Intron1", FeatureKind::Intron, 3, 5, 6),
                Feature::new("Exon2", FeatureKind::Exon, 4, 7, 8),
            ],
            AlleleMetadata::default(),
        )
        .unwrap();
        assert!(!record.is_complete());
    }

    #[test]
    fn partial_feature_status_prevents_completeness() {
        let record = AlleleRecord::new(
            "A*01:04",
            "AAAACCCCGG",
            vec![
                Feature::new("5'UTR", FeatureKind::Utr, 1, 1, 4),
                Feature::new("Exon1", FeatureKind::Exon, 2, 5, 8)
                    .with_status(FeatureStatus::Partial),
                Feature::new("3'UTR", FeatureKind::Utr, 3, 9, 10),
            ],
            AlleleMetadata::default(),
        )
        .unwrap();
        assert!(!record.is_complete());
    }

    #[test]
    fn feature_beyond_sequence_is_rejected() {
        let result = AlleleRecord::new(
            "A*01:05",
            "ACGT",
            vec![Feature::new("Exon2", FeatureKind::Exon, 1, 1, 5)],
            AlleleMetadata::default(),
        );
        assert!(matches!(result, Err(Error::InvalidFeatureTable { .. })));
    }

    #[test]
    fn lsl_flag_follows_sample_names() {
        let metadata = AlleleMetadata {
            sample_names: ["DKMS-LSL-A-1234".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let record = AlleleRecord::new("A*01:06", "ACGT", Vec::new(), metadata).unwrap();
        assert!(record.is_lsl());
        assert!(!record.is_complete());
    }

    #[test]
    fn single_record_view() {
        let record = complete_record("A*01:01:01:01", "ACGTACGTAC");
        assert_eq!(record.names(), vec!["A*01:01:01:01"]);
        assert_eq!(record.completeness(), vec![true]);
        assert_eq!(record.cwd_statuses(), vec![CwdStatus::Unknown]);
    }

    #[test]
    fn cwd_status_parses_catalog_spellings() {
        assert_eq!(
            "Well-documented".parse::<CwdStatus>().unwrap(),
            CwdStatus::WellDocumented
        );
        assert_eq!("COMMON".parse::<CwdStatus>().unwrap(), CwdStatus::Common);
        assert!("frequent".parse::<CwdStatus>().is_err());
    }
}
