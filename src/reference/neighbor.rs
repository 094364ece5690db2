use super::Params;
use crate::{
    align::MultipleAligner,
    allele::AlleleCollection,
    utils::{Error, Result},
};
use itertools::Itertools;

/// Picks the complete allele best suited as a reconstruction template for
/// `query`.
///
/// A complete candidate is returned directly. Otherwise the complete allele
/// with the smallest summed distance to all candidates wins, first in
/// collection order on ties.
pub fn closest_complete_neighbor(
    collection: &AlleleCollection,
    query: &str,
    match_partial_name: bool,
    aligner: &dyn MultipleAligner,
    params: &Params,
) -> Result<String> {
    let records = collection
        .resolve(query, match_partial_name)
        .iter()
        .filter_map(|&i| collection.at(i))
        .collect_vec();
    if records.is_empty() {
        return Err(Error::NotFound(query.to_string()));
    }

    if let Some(complete) = records.iter().find(|r| r.is_complete()) {
        log::debug!("{}: {} is complete", query, complete.name());
        return Ok(complete.name().to_string());
    }

    if collection.complete().next().is_none() {
        return Err(Error::NoCompleteNeighbor(collection.locus().to_string()));
    }

    let matrix = collection.distance_matrix(aligner, params)?;
    let rows = records
        .iter()
        .map(|r| {
            matrix.index_of(r.name()).ok_or_else(|| {
                Error::NotFound(format!("{} of {}", params.anchor_feature, r.name()))
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let cols = collection
        .complete()
        .filter_map(|r| matrix.index_of(r.name()))
        .collect_vec();

    let mut best: Option<(usize, f64)> = None;
    for col in cols {
        let total = rows.iter().map(|&row| matrix.get(row, col)).sum::<f64>();
        match best {
            Some((_, best_total)) if best_total <= total => {}
            _ => best = Some((col, total)),
        }
    }

    let (col, total) =
        best.ok_or_else(|| Error::NoCompleteNeighbor(collection.locus().to_string()))?;
    let neighbor = matrix.names()[col].clone();
    log::debug!(
        "{}: closest complete allele is {} (summed distance {:.4} over {} candidates)",
        query,
        neighbor,
        total,
        rows.len()
    );
    Ok(neighbor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::StarAligner;
    use crate::allele::record::tests::{complete_record, exon2_record};

    fn collection() -> AlleleCollection {
        AlleleCollection::new(
            "HLA-A",
            vec![
                complete_record("A*02:01:01:01", "TTTTACGTAC"),
                exon2_record("A*01:03:01", "ACGTACGTAA"),
                complete_record("A*01:01:01:01", "ACGTACGTAC"),
                exon2_record("A*01:03:02", "ACGTACGTAG"),
                exon2_record("A*11:01", "TTTTACGTAA"),
            ],
        )
        .unwrap()
    }

    fn resolve(collection: &AlleleCollection, query: &str, match_partial: bool) -> Result<String> {
        closest_complete_neighbor(
            collection,
            query,
            match_partial,
            &StarAligner::default(),
            &Params::default(),
        )
    }

    #[test]
    fn complete_query_resolves_to_itself() {
        let collection = collection();
        assert_eq!(resolve(&collection, "A*01:01:01:01", true).unwrap(), "A*01:01:01:01");
        assert!(collection.cached_distance_matrix().is_none());
    }

    #[test]
    fn partial_query_uses_smallest_distance() {
        let collection = collection();
        assert_eq!(resolve(&collection, "A*01:03:01", false).unwrap(), "A*01:01:01:01");
        assert_eq!(resolve(&collection, "A*11:01", false).unwrap(), "A*02:01:01:01");
        assert!(collection.cached_distance_matrix().is_some());
    }

    #[test]
    fn partial_designation_sums_over_all_candidates() {
        assert_eq!(resolve(&collection(), "A*01:03", true).unwrap(), "A*01:01:01:01");
    }

    #[test]
    fn partial_designation_finds_complete_member_first() {
        assert_eq!(resolve(&collection(), "A*01:01", true).unwrap(), "A*01:01:01:01");
    }

    #[test]
    fn ties_go_to_the_first_complete_allele() {
        let collection = AlleleCollection::new(
            "HLA-A",
            vec![
                complete_record("A*01:01:01:01", "ACGTACGTAC"),
                complete_record("A*01:01:01:02", "ACGTACGTAG"),
                exon2_record("A*01:99", "ACGTACGTAT"),
            ],
        )
        .unwrap();
        assert_eq!(resolve(&collection, "A*01:99", false).unwrap(), "A*01:01:01:01");
    }

    #[test]
    fn unknown_query_is_not_found() {
        assert!(matches!(
            resolve(&collection(), "A*01:03", false),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn collection_without_complete_alleles() {
        let collection = AlleleCollection::new(
            "HLA-A",
            vec![exon2_record("A*01:03:01", "ACGTACGTAA")],
        )
        .unwrap();
        assert!(matches!(
            resolve(&collection, "A*01:03:01", false),
            Err(Error::NoCompleteNeighbor(_))
        ));
    }
}
