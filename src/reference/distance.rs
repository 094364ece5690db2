use super::{initialize_thread_pool, Params};
use crate::{
    align::MultipleAligner,
    allele::AlleleCollection,
    utils::{Error, Result},
};
use itertools::Itertools;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use std::collections::HashMap;

const GAP: u8 = b'-';

/// Symmetric all-pairs distances between alleles, in collection order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    names: Vec<String>,
    index: HashMap<String, usize>,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn from_rows(names: Vec<String>, rows: &[String]) -> Self {
        let n = names.len();
        let values = rows
            .par_iter()
            .enumerate()
            .flat_map_iter(|(i, a)| {
                rows.iter()
                    .enumerate()
                    .map(move |(j, b)| if i == j { 0.0 } else { aligned_distance(a, b) })
            })
            .collect::<Vec<_>>();
        debug_assert_eq!(values.len(), n * n);
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            index,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.names.len() + col]
    }

    pub fn between(&self, a: &str, b: &str) -> Option<f64> {
        Some(self.get(self.index_of(a)?, self.index_of(b)?))
    }
}

/// Builds the distance matrix over one anchor feature of every allele.
/// Alleles lacking the anchor are left out of the matrix.
pub fn build_distance_matrix(
    collection: &AlleleCollection,
    aligner: &dyn MultipleAligner,
    params: &Params,
) -> Result<DistanceMatrix> {
    let (names, anchors): (Vec<String>, Vec<String>) = collection
        .iter()
        .filter_map(|record| match record.features().get(&params.anchor_feature) {
            Some(feature) => Some((
                record.name().to_string(),
                record.slice(feature).to_ascii_uppercase(),
            )),
            None => {
                log::warn!(
                    "{}: no {} feature, left out of the distance matrix",
                    record.name(),
                    params.anchor_feature
                );
                None
            }
        })
        .unzip();

    log::info!(
        "{}: computing distance matrix over {} of {} alleles",
        collection.locus(),
        params.anchor_feature,
        anchors.len()
    );
    let pool = initialize_thread_pool(params.num_threads)?;
    pool.install(|| {
        let rows = aligner.align(&anchors.iter().map(String::as_str).collect_vec())?;
        if rows.len() != anchors.len() {
            return Err(Error::AlignmentUnavailable(format!(
                "expected {} aligned rows, got {}",
                anchors.len(),
                rows.len()
            )));
        }
        Ok(DistanceMatrix::from_rows(names, &rows))
    })
}

/// Fraction of mismatched columns between two aligned rows.
///
/// Columns where either row is still in its leading or trailing gap are not
/// counted. Internal gap against base is a mismatch, gap against gap is skipped.
pub fn aligned_distance(a: &str, b: &str) -> f64 {
    fn occupied_span(row: &[u8]) -> Option<(usize, usize)> {
        let first = row.iter().position(|&c| c != GAP)?;
        let last = row.iter().rposition(|&c| c != GAP)?;
        Some((first, last))
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (Some((first_a, last_a)), Some((first_b, last_b))) = (occupied_span(a), occupied_span(b))
    else {
        return 1.0;
    };
    let (start, end) = (first_a.max(first_b), last_a.min(last_b).min(a.len().min(b.len()) - 1));
    if start > end {
        return 1.0;
    }

    let mut compared = 0;
    let mut mismatches = 0;
    for (x, y) in a[start..=end].iter().zip(&b[start..=end]) {
        match (*x == GAP, *y == GAP) {
            (true, true) => continue,
            (false, false) if x.eq_ignore_ascii_case(y) => compared += 1,
            _ => {
                compared += 1;
                mismatches += 1;
            }
        }
    }

    if compared == 0 {
        1.0
    } else {
        mismatches as f64 / compared as f64
    }
}
