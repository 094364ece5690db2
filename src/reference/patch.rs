use crate::{
    allele::{AlleleRecord, Feature, FeatureTable},
    utils::{Error, Result},
};
use itertools::Itertools;

/// A full-length sequence rebuilt from a partial allele and its template.
///
/// Template-derived bases are lowercase, bases taken from the query allele
/// are uppercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedAllele {
    /// `<query> <template> <feature:start-end|...>`; records where the query
    /// sequence was placed
    pub name: String,
    pub query: String,
    pub template: String,
    pub sequence: String,
    pub features: FeatureTable,
}

impl PatchedAllele {
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Substitutes every feature of `query` into the same-named feature of
/// `template`.
///
/// Features are visited in the template's biological order while tracking
/// the cumulative length difference, so spans after a longer or shorter
/// substitution are shifted accordingly. Template features missing from the
/// query keep the template sequence.
pub fn reconstruct(template: &AlleleRecord, query: &AlleleRecord) -> Result<PatchedAllele> {
    if template.name() == query.name() {
        return Ok(PatchedAllele {
            name: query.name().to_string(),
            query: query.name().to_string(),
            template: template.name().to_string(),
            sequence: template.sequence().to_string(),
            features: template.features().clone(),
        });
    }

    let pairs = template
        .features()
        .iter()
        .map(|rref| (rref, query.features().get(&rref.name)))
        .collect_vec();
    if pairs.iter().all(|(_, ralt)| ralt.is_none()) {
        return Err(Error::NoMatchingFeatures {
            query: query.name().to_string(),
            template: template.name().to_string(),
        });
    }
    for unplaced in query
        .features()
        .iter()
        .filter(|f| template.features().get(&f.name).is_none())
    {
        log::warn!(
            "{}: feature {} has no counterpart in {}",
            query.name(),
            unplaced.name,
            template.name()
        );
    }

    let mut sequence = template.sequence().to_ascii_lowercase();
    let mut features = Vec::with_capacity(pairs.len());
    let mut spans = Vec::new();
    let mut offset: isize = 0;
    for (rref, ralt) in pairs {
        let sr = rref.start.saturating_add_signed(offset);
        let er = rref.end.saturating_add_signed(offset);
        let Some(ralt) = ralt else {
            features.push(rref.moved_to(sr, er));
            continue;
        };

        let (wr, wa) = (rref.len() as isize, ralt.len() as isize);
        let end = er.saturating_add_signed(wa - wr);
        sequence.replace_range(sr - 1..er, &query.slice(ralt).to_ascii_uppercase());
        offset -= wr - wa;

        spans.push(format!("{}:{}-{}", rref.name, sr, end));
        features.push(Feature {
            start: sr,
            end,
            status: ralt.status,
            ..rref.clone()
        });
    }

    let features = FeatureTable::new(features).map_err(|message| Error::InvalidFeatureTable {
        allele: query.name().to_string(),
        message,
    })?;
    log::debug!(
        "{}: rebuilt on {} ({} bp, {} features substituted)",
        query.name(),
        template.name(),
        sequence.len(),
        spans.len()
    );

    Ok(PatchedAllele {
        name: format!("{} {} {}", query.name(), template.name(), spans.join("|")),
        query: query.name().to_string(),
        template: template.name().to_string(),
        sequence,
        features,
    })
}
