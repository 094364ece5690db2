use super::{
    initialize_thread_pool, neighbor::closest_complete_neighbor, patch::reconstruct, Params,
    PatchedAllele,
};
use crate::{
    align::MultipleAligner,
    allele::AlleleCollection,
    utils::{Error, Result},
};
use crossbeam_channel::{unbounded, Sender};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Position in the collection, allele name and its reconstruction outcome.
pub type BatchItem = (usize, String, Result<PatchedAllele>);

#[derive(Debug, Default)]
pub struct BatchReport {
    pub patched: Vec<PatchedAllele>,
    pub failures: Vec<(String, Error)>,
}

/// Reconstructs one allele on its closest complete neighbor. Complete
/// alleles come back unchanged.
pub fn reconstruct_one(
    collection: &AlleleCollection,
    name: &str,
    aligner: &dyn MultipleAligner,
    params: &Params,
) -> Result<PatchedAllele> {
    let query = collection.get(name)?;
    if query.is_complete() {
        return reconstruct(query, query);
    }
    let template_name = closest_complete_neighbor(collection, name, false, aligner, params)?;
    let template = collection.get(&template_name)?;
    reconstruct(template, query)
}

/// Reconstructs every allele of the collection on a dedicated thread pool,
/// sending each outcome as soon as it is ready. Per-allele failures are sent
/// like successes and never stop the batch.
pub fn stream_reconstructions(
    collection: &AlleleCollection,
    aligner: &dyn MultipleAligner,
    params: &Params,
    sender: &Sender<BatchItem>,
) -> Result<()> {
    let needs_matrix = collection.iter().any(|r| !r.is_complete());
    if needs_matrix && collection.complete().next().is_some() {
        collection.distance_matrix(aligner, params)?;
    }

    log::debug!(
        "Initializing thread pool with {} threads...",
        params.num_threads
    );
    let pool = initialize_thread_pool(params.num_threads)?;
    pool.install(|| {
        (0..collection.len())
            .into_par_iter()
            .for_each_with(sender.clone(), |s, index| {
                let Some(record) = collection.at(index) else {
                    return;
                };
                let name = record.name().to_string();
                let result = reconstruct_one(collection, &name, aligner, params);
                if let Err(e) = s.send((index, name, result)) {
                    log::error!("Failed to send reconstruction to receiver: {}", e);
                }
            });
    });
    Ok(())
}

/// Reconstructs every allele and reports results in collection order.
pub fn reconstruct_all(
    collection: &AlleleCollection,
    aligner: &dyn MultipleAligner,
    params: &Params,
) -> Result<BatchReport> {
    let (sender, receiver) = unbounded();
    stream_reconstructions(collection, aligner, params, &sender)?;
    drop(sender);

    let mut items = receiver.into_iter().collect::<Vec<_>>();
    items.sort_by_key(|(index, _, _)| *index);

    let mut report = BatchReport::default();
    for (_, name, result) in items {
        match result {
            Ok(patched) => report.patched.push(patched),
            Err(err) => report.failures.push((name, err)),
        }
    }
    log::info!(
        "{}: {} alleles reconstructed, {} failed",
        collection.locus(),
        report.patched.len(),
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::{ExternalAligner, StarAligner};
    use crate::allele::record::tests::{complete_record, exon2_record};
    use crate::allele::{AlleleMetadata, AlleleRecord, Feature, FeatureKind};

    fn params() -> Params {
        Params {
            num_threads: 2,
            ..Default::default()
        }
    }

    #[test]
    fn batch_reconstructs_in_collection_order() {
        let extra_feature = AlleleRecord::new(
            "A*01:77",
            "ACGTACGTAC",
            vec![
                Feature::new("Exon9", FeatureKind::Exon, 1, 1, 5),
                Feature::new("Exon2", FeatureKind::Exon, 2, 6, 10),
            ],
            AlleleMetadata::default(),
        )
        .unwrap();
        let collection = AlleleCollection::new(
            "HLA-A",
            vec![
                complete_record("A*01:01:01:01", "ACGTACGTAC"),
                exon2_record("A*01:03", "ACGTACGTAAGG"),
                extra_feature,
                complete_record("A*02:01:01:01", "TTTTACGTAC"),
            ],
        )
        .unwrap();

        let report = reconstruct_all(&collection, &StarAligner::default(), &params()).unwrap();
        assert!(report.failures.is_empty());
        let names = report
            .patched
            .iter()
            .map(|p| p.query.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec!["A*01:01:01:01", "A*01:03", "A*01:77", "A*02:01:01:01"]
        );
        assert_eq!(
            report.patched[0].sequence,
            collection.at(0).unwrap().sequence()
        );
        assert_eq!(report.patched[1].template, "A*01:01:01:01");
        assert_eq!(report.patched[1].len(), 37);
        assert!(collection.cached_distance_matrix().is_some());
    }

    #[test]
    fn full_length_template_ending_in_an_exon() {
        let reference = AlleleRecord::new(
            "A*01:01:01:01",
            format!(
                "{}{}{}{}",
                "A".repeat(50),
                "C".repeat(100),
                "G".repeat(9550),
                "T".repeat(75)
            ),
            vec![
                Feature::new("5'UTR", FeatureKind::Utr, 1, 1, 50),
                Feature::new("EXON1", FeatureKind::Exon, 2, 51, 150),
                Feature::new("INTRON1", FeatureKind::Intron, 3, 151, 9700),
                Feature::new("EXON2", FeatureKind::Exon, 4, 9701, 9775),
            ],
            AlleleMetadata::default(),
        )
        .unwrap();
        let alt_exon2 = "ACGTACGTAC".repeat(8);
        let alt = AlleleRecord::new(
            "A*01:02",
            alt_exon2.clone(),
            vec![Feature::new("EXON2", FeatureKind::Exon, 4, 1, 80)],
            AlleleMetadata::default(),
        )
        .unwrap();
        assert!(reference.is_complete());
        assert!(!alt.is_complete());

        let collection = AlleleCollection::new("HLA-A", vec![reference, alt]).unwrap();
        let params = Params {
            anchor_feature: "EXON2".to_string(),
            num_threads: 2,
        };
        let aligner = StarAligner::default();
        assert_eq!(
            closest_complete_neighbor(&collection, "A*01:02", true, &aligner, &params).unwrap(),
            "A*01:01:01:01"
        );

        let report = reconstruct_all(&collection, &aligner, &params).unwrap();
        assert!(report.failures.is_empty());
        assert_eq!(report.patched.len(), 2);
        assert_eq!(report.patched[0].len(), 9775);
        let patched = &report.patched[1];
        assert_eq!(patched.template, "A*01:01:01:01");
        assert_eq!(patched.len(), 9780);
        assert_eq!(&patched.sequence[9700..], alt_exon2);
    }

    #[test]
    fn batch_isolates_per_allele_failures() {
        let missing_anchor = AlleleRecord::new(
            "A*01:98",
            "ACGTA",
            vec![Feature::new("Exon4", FeatureKind::Exon, 1, 1, 5)],
            AlleleMetadata::default(),
        )
        .unwrap();
        let collection = AlleleCollection::new(
            "HLA-A",
            vec![
                complete_record("A*01:01:01:01", "ACGTACGTAC"),
                missing_anchor,
                exon2_record("A*01:03", "ACGTACGTAA"),
            ],
        )
        .unwrap();

        let report = reconstruct_all(&collection, &StarAligner::default(), &params()).unwrap();
        assert_eq!(report.patched.len(), 2);
        assert_eq!(report.patched[1].query, "A*01:03");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "A*01:98");
        assert!(matches!(report.failures[0].1, Error::NotFound(_)));
    }

    #[test]
    fn batch_without_templates_fails_per_allele() {
        let collection = AlleleCollection::new(
            "HLA-A",
            vec![
                exon2_record("A*01:03", "ACGTACGTAA"),
                exon2_record("A*01:04", "ACGTACGTAG"),
            ],
        )
        .unwrap();
        let report = reconstruct_all(&collection, &StarAligner::default(), &params()).unwrap();
        assert!(report.patched.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].0, "A*01:03");
        assert!(report
            .failures
            .iter()
            .all(|(_, e)| matches!(e, Error::NoCompleteNeighbor(_))));
    }

    #[test]
    fn missing_aligner_aborts_the_batch() {
        let collection = AlleleCollection::new(
            "HLA-A",
            vec![
                complete_record("A*01:01:01:01", "ACGTACGTAC"),
                exon2_record("A*01:03", "ACGTACGTAA"),
            ],
        )
        .unwrap();
        let aligner = ExternalAligner::new("/nonexistent/bin/mafft").unwrap();
        assert!(matches!(
            reconstruct_all(&collection, &aligner, &params()),
            Err(Error::AlignmentUnavailable(_))
        ));
    }
}
