use super::{
    locus::{canonical_locus, is_same_allele, matches_designation},
    record::{AlleleRecord, AlleleView},
};
use crate::{
    align::MultipleAligner,
    reference::{
        consensus::build_consensus,
        distance::{build_distance_matrix, DistanceMatrix},
        Params,
    },
    utils::{Error, Memo, Result},
};
use std::{collections::HashMap, sync::Arc};

/// All alleles of one locus, in database order.
///
/// Records are shared and immutable; the distance matrix and consensus are
/// computed on first request and cached on the collection.
#[derive(Debug)]
pub struct AlleleCollection {
    locus: String,
    db_version: Option<String>,
    records: Vec<Arc<AlleleRecord>>,
    index: HashMap<String, usize>,
    distance_matrix: Memo<DistanceMatrix>,
    consensus: Memo<String>,
}

impl AlleleCollection {
    /// Builds a collection; duplicate names keep their first occurrence.
    pub fn new(locus: &str, records: Vec<AlleleRecord>) -> Result<Self> {
        Self::from_shared(locus, records.into_iter().map(Arc::new))
    }

    fn from_shared(locus: &str, records: impl IntoIterator<Item = Arc<AlleleRecord>>) -> Result<Self> {
        let locus = canonical_locus(locus)?;
        let mut collection = Self {
            locus,
            db_version: None,
            records: Vec::new(),
            index: HashMap::new(),
            distance_matrix: Memo::default(),
            consensus: Memo::default(),
        };
        for record in records {
            collection.push(record)?;
        }
        Ok(collection)
    }

    fn push(&mut self, record: Arc<AlleleRecord>) -> Result<()> {
        if record.locus().as_deref() != Some(self.locus.as_str()) {
            return Err(Error::InvalidLocus(format!(
                "{} does not belong to {}",
                record.name(),
                self.locus
            )));
        }
        if self.index.contains_key(record.name()) {
            log::debug!("{}: skipping duplicate record", record.name());
            return Ok(());
        }
        self.index
            .insert(record.name().to_string(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    fn derived(&self, records: impl IntoIterator<Item = Arc<AlleleRecord>>) -> Result<Self> {
        let mut subset = Self::from_shared(&self.locus, records)?;
        subset.db_version = self.db_version.clone();
        Ok(subset)
    }

    pub fn with_db_version(mut self, db_version: impl Into<String>) -> Self {
        self.db_version = Some(db_version.into());
        self
    }

    pub fn locus(&self) -> &str {
        &self.locus
    }

    pub fn db_version(&self) -> Option<&str> {
        self.db_version.as_deref()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlleleRecord> + '_ {
        self.records.iter().map(|r| r.as_ref())
    }

    pub fn get(&self, name: &str) -> Result<&AlleleRecord> {
        self.position(name)
            .map(|i| self.records[i].as_ref())
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    pub fn at(&self, index: usize) -> Option<&AlleleRecord> {
        self.records.get(index).map(|r| r.as_ref())
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn complete(&self) -> impl Iterator<Item = &AlleleRecord> + '_ {
        self.iter().filter(|r| r.is_complete())
    }

    /// Indices of records that are `designation` itself or, with
    /// `match_partial`, extend it by whole fields. Collection order.
    pub fn resolve(&self, designation: &str, match_partial: bool) -> Vec<usize> {
        self.iter()
            .enumerate()
            .filter(|(_, r)| {
                is_same_allele(r.name(), designation)
                    || (match_partial && matches_designation(r.name(), designation))
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn subset_by_names(&self, names: &[&str]) -> Result<Self> {
        let mut indices = names
            .iter()
            .map(|name| {
                self.position(name)
                    .ok_or_else(|| Error::NotFound(name.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        indices.sort_unstable();
        self.derived(indices.into_iter().map(|i| Arc::clone(&self.records[i])))
    }

    /// Records whose accession is among `ids`, collection order.
    pub fn subset_by_ids(&self, ids: &[&str]) -> Result<Self> {
        if let Some(missing) = ids
            .iter()
            .find(|id| !self.records.iter().any(|r| r.metadata().id == **id))
        {
            return Err(Error::NotFound(missing.to_string()));
        }
        self.derived(
            self.records
                .iter()
                .filter(|r| ids.contains(&r.metadata().id.as_str()))
                .cloned(),
        )
    }

    pub fn subset_by_designation(&self, designation: &str) -> Result<Self> {
        let subset = self.derived(
            self.records
                .iter()
                .filter(|r| matches_designation(r.name(), designation))
                .cloned(),
        )?;
        if subset.is_empty() {
            return Err(Error::NotFound(designation.to_string()));
        }
        Ok(subset)
    }

    pub fn filter<P>(&self, predicate: P) -> Result<Self>
    where
        P: Fn(&AlleleRecord) -> bool,
    {
        self.derived(self.records.iter().filter(|r| predicate(r)).cloned())
    }

    /// Union of both collections by name, first occurrence order.
    pub fn concat(&self, other: &AlleleCollection) -> Result<Self> {
        if other.locus != self.locus {
            return Err(Error::InvalidLocus(format!(
                "cannot combine {} with {}",
                self.locus, other.locus
            )));
        }
        self.derived(self.records.iter().chain(other.records.iter()).cloned())
    }

    pub fn cached_distance_matrix(&self) -> Option<Arc<DistanceMatrix>> {
        self.distance_matrix.get()
    }

    pub fn distance_matrix(
        &self,
        aligner: &dyn MultipleAligner,
        params: &Params,
    ) -> Result<Arc<DistanceMatrix>> {
        self.distance_matrix
            .get_or_try_build(|| build_distance_matrix(self, aligner, params))
    }

    pub fn rebuild_distance_matrix(
        &self,
        aligner: &dyn MultipleAligner,
        params: &Params,
    ) -> Result<Arc<DistanceMatrix>> {
        self.distance_matrix
            .rebuild(|| build_distance_matrix(self, aligner, params))
    }

    pub fn consensus(&self, aligner: &dyn MultipleAligner) -> Result<Arc<String>> {
        self.consensus
            .get_or_try_build(|| build_consensus(self, aligner))
    }

    pub fn rebuild_consensus(&self, aligner: &dyn MultipleAligner) -> Result<Arc<String>> {
        self.consensus.rebuild(|| build_consensus(self, aligner))
    }
}

impl AlleleView for AlleleCollection {
    fn alleles(&self) -> Box<dyn Iterator<Item = &AlleleRecord> + '_> {
        Box::new(self.iter())
    }
}
