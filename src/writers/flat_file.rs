//! Defines the `FlatFileWriter` struct for writing reconstructed alleles as
//! EMBL-style submission records.
//!
use crate::{
    allele::{display_designation, FeatureKind, FeatureTable},
    reference::PatchedAllele,
    utils::Result,
};
use itertools::Itertools;
use std::{
    collections::HashMap,
    fs::File,
    io::{BufWriter, Write},
};

const SUBMISSION_ID: &str = "HLAxxxxx";
const BASES_PER_GROUP: usize = 10;
const GROUPS_PER_LINE: usize = 6;
const FEATURE_KEY_WIDTH: usize = 16;
const QUALIFIER_INDENT: &str = "FT                   ";

/// Structure for writing flat-file records, one per allele.
pub struct FlatFileWriter<W: Write> {
    writer: W,
    num_records: usize,
}

impl FlatFileWriter<BufWriter<File>> {
    /// Creates the output file at `path`.
    pub fn new(path: &str) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> FlatFileWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer,
            num_records: 0,
        }
    }

    /// Writes the record of a reconstructed allele.
    ///
    /// # Arguments
    ///
    /// * `patched` - Reconstructed allele; its audit-trail name supplies the
    ///   designation on the description line.
    pub fn write(&mut self, patched: &PatchedAllele) -> Result<()> {
        let record = format_flat_file(&patched.name, &patched.sequence, &patched.features);
        self.writer.write_all(record.as_bytes())?;
        self.num_records += 1;
        Ok(())
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Formats one flat-file record. Sequence case is kept as given.
pub fn format_flat_file(name: &str, sequence: &str, features: &FeatureTable) -> String {
    let designation = name.split_whitespace().next().unwrap_or(name);
    let mut lines = vec![
        format!(
            "ID   {}; SV 1; standard; DNA; HUM; {} BP.",
            SUBMISSION_ID,
            sequence.len()
        ),
        format!(
            "DE   {}, Human MHC sequence",
            display_designation(designation)
        ),
    ];

    let mut serials: HashMap<FeatureKind, usize> = HashMap::new();
    for feature in features {
        lines.push(format!(
            "FT   {:<width$}{}..{}",
            feature.kind.flat_file_key(),
            feature.start,
            feature.end,
            width = FEATURE_KEY_WIDTH
        ));
        if matches!(feature.kind, FeatureKind::Exon | FeatureKind::Intron) {
            let serial = serials.entry(feature.kind).or_insert(0);
            *serial += 1;
            lines.push(format!("{}/number=\"{}\"", QUALIFIER_INDENT, serial));
        }
    }

    lines.push(format!("SQ   Sequence {} BP;", sequence.len()));
    for line in sequence
        .as_bytes()
        .chunks(BASES_PER_GROUP * GROUPS_PER_LINE)
    {
        let groups = line
            .chunks(BASES_PER_GROUP)
            .map(String::from_utf8_lossy)
            .join(" ");
        lines.push(format!("     {}", groups));
    }
    lines.push("//".to_string());

    let mut record = lines.join("\n");
    record.push('\n');
    record
}
