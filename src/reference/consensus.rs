use crate::{
    align::MultipleAligner,
    allele::AlleleCollection,
    utils::{Error, Result},
};
use itertools::Itertools;

// Order doubles as the tie-break priority
const BASES: [u8; 4] = *b"ACGT";
const GAP: u8 = b'-';

/// Majority-base consensus over all complete alleles of a collection.
pub fn build_consensus(collection: &AlleleCollection, aligner: &dyn MultipleAligner) -> Result<String> {
    let seqs = collection
        .complete()
        .map(|r| r.sequence().to_ascii_uppercase())
        .collect_vec();
    if seqs.len() < 2 {
        return Err(Error::InsufficientData(seqs.len()));
    }

    log::info!(
        "{}: aligning {} complete alleles for consensus",
        collection.locus(),
        seqs.len()
    );
    let rows = aligner.align(&seqs.iter().map(String::as_str).collect_vec())?;
    if rows.len() != seqs.len() {
        return Err(Error::AlignmentUnavailable(format!(
            "expected {} aligned rows, got {}",
            seqs.len(),
            rows.len()
        )));
    }
    Ok(column_consensus(&rows))
}

/// Most frequent base per alignment column, gaps excluded.
///
/// Gap-only columns are dropped; columns holding only ambiguous bases give `N`.
pub fn column_consensus<S: AsRef<str>>(rows: &[S]) -> String {
    let width = rows.iter().map(|r| r.as_ref().len()).max().unwrap_or(0);
    let mut consensus = String::with_capacity(width);
    for col in 0..width {
        //                 A  C  G  T
        let mut counts = [0, 0, 0, 0];
        let mut occupied = false;
        for row in rows {
            let base = match row.as_ref().as_bytes().get(col) {
                Some(&base) if base != GAP => base.to_ascii_uppercase(),
                _ => continue,
            };
            occupied = true;
            if let Some(base_index) = BASES.iter().position(|&b| b == base) {
                counts[base_index] += 1;
            }
        }
        if !occupied {
            continue;
        }

        let (best, count) = counts
            .iter()
            .enumerate()
            .fold((0, 0), |(best, best_count), (index, &count)| {
                if count > best_count {
                    (index, count)
                } else {
                    (best, best_count)
                }
            });
        consensus.push(if count == 0 { 'N' } else { BASES[best] as char });
    }
    consensus
}
