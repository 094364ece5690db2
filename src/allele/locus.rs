use crate::utils::{Error, Result};

const LOCUS_PREFIX: &str = "HLA-";

const RECOGNIZED_LOCI: &[&str] = &[
    "A", "B", "C", "E", "F", "G", "H", "J", "K", "L", "V", "DMA", "DMB", "DOA", "DOB", "DPA1",
    "DPB1", "DQA1", "DQB1", "DRA", "DRB1", "DRB3", "DRB4", "DRB5", "MICA", "MICB", "TAP1", "TAP2",
];

/// Canonical `HLA-<gene>` form of a locus designation given as `HLA-A` or `A`.
pub fn canonical_locus(designation: &str) -> Result<String> {
    let gene = designation
        .trim()
        .strip_prefix(LOCUS_PREFIX)
        .unwrap_or(designation.trim())
        .to_ascii_uppercase();
    if RECOGNIZED_LOCI.contains(&gene.as_str()) {
        Ok(format!("{}{}", LOCUS_PREFIX, gene))
    } else {
        Err(Error::InvalidLocus(designation.to_string()))
    }
}

/// Locus part of an allele name (`HLA-A*01:01` and `A*01:01` both give `HLA-A`).
pub fn locus_of(allele_name: &str) -> Option<String> {
    let (gene, _) = allele_name.split_once('*')?;
    canonical_locus(gene).ok()
}

/// Allele fields after the `*` separator, or the whole name if there is none.
pub fn allele_fields(allele_name: &str) -> &str {
    allele_name
        .split_once('*')
        .map_or(allele_name, |(_, fields)| fields)
}

/// True if `name` is `designation` or extends it by whole `:`-separated fields.
///
/// Designations containing `*` are compared locus first (`A*` and `HLA-A*` are
/// the same locus), then by allele fields. Bare field designations (`01:03`)
/// are compared against the allele fields only.
pub fn matches_designation(name: &str, designation: &str) -> bool {
    designation_remainder(name, designation)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
}

/// True if `designation` names exactly this allele.
pub fn is_same_allele(name: &str, designation: &str) -> bool {
    designation_remainder(name, designation).is_some_and(str::is_empty)
}

fn designation_remainder<'a>(name: &'a str, designation: &str) -> Option<&'a str> {
    let fields = match designation.split_once('*') {
        Some((gene, fields)) => {
            let (name_gene, _) = name.split_once('*')?;
            if canonical_locus(name_gene).ok()? != canonical_locus(gene).ok()? {
                return None;
            }
            fields
        }
        None => designation,
    };
    allele_fields(name).strip_prefix(fields)
}

/// Designation written to flat-file description lines.
pub fn display_designation(allele_name: &str) -> String {
    if allele_name.starts_with(LOCUS_PREFIX) {
        allele_name.to_string()
    } else {
        format!("{}{}", LOCUS_PREFIX, allele_name)
    }
}
