use super::select_aligner;
use crate::allele::load_collection;
use crate::cli::ConsensusArgs;
use crate::utils::{create_writer, Result};
use bio::io::fasta;
use std::fs::File;

pub fn consensus(args: ConsensusArgs) -> Result<()> {
    let collection = load_collection(&args.catalog_path, &args.locus)?;
    let aligner = select_aligner(args.msa_tool.as_deref())?;
    let sequence = collection.consensus(aligner.as_ref())?;

    let mut writer = create_writer(&args.output_prefix, "fa", |path| {
        Ok(fasta::Writer::new(File::create(path)?))
    })?;
    let description = format!(
        "consensus of {} complete alleles",
        collection.complete().count()
    );
    writer.write(
        &format!("{}_consensus", collection.locus()),
        Some(description.as_str()),
        sequence.as_bytes(),
    )?;
    writer.flush()?;

    log::info!(
        "{} consensus: {} bp",
        collection.locus(),
        sequence.len()
    );
    Ok(())
}
