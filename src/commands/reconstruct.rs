use super::select_aligner;
use crate::allele::{load_collection, AlleleCollection};
use crate::cli::ReconstructArgs;
use crate::reference::{reconstruct_one, stream_reconstructions, BatchItem, Params};
use crate::utils::{create_writer, Error, Result};
use crate::writers::FlatFileWriter;
use crossbeam_channel::{bounded, Receiver};
use std::{collections::BTreeMap, io::Write, thread};

const CHANNEL_BUFFER_SIZE: usize = 2048;

pub fn reconstruct(args: ReconstructArgs) -> Result<()> {
    let mut collection = load_collection(&args.catalog_path, &args.locus)?;
    if let Some(db_version) = args.db_version {
        collection = collection.with_db_version(db_version);
    }
    let aligner = select_aligner(args.msa_tool.as_deref())?;
    let params = Params {
        anchor_feature: args.anchor_feature,
        num_threads: args.num_threads,
    };

    let mut writer = create_writer(&args.output_prefix, "embl", FlatFileWriter::new)?;

    if let Some(allele) = &args.allele {
        let patched = reconstruct_one(&collection, allele, aligner.as_ref(), &params)?;
        writer.write(&patched)?;
        writer.flush()?;
        log::info!("{}: reconstructed on {}", patched.query, patched.template);
        return Ok(());
    }

    let (sender, receiver) = bounded(CHANNEL_BUFFER_SIZE);
    let num_alleles = collection.len();
    let writer_thread = thread::spawn(move || write_in_order(&mut writer, receiver, num_alleles));

    let streamed = stream_reconstructions(&collection, aligner.as_ref(), &params, &sender);

    // Clean-up
    drop(sender);
    let (num_written, num_failed) = writer_thread
        .join()
        .map_err(|_| Error::Io(std::io::Error::other("Writer thread panicked")))??;
    log::trace!("Writer thread finished");
    streamed?;

    log_summary(&collection, num_written, num_failed);
    Ok(())
}

/// Writes reconstructions as they arrive, holding back early results so the
/// output keeps collection order.
fn write_in_order<W: Write>(
    writer: &mut FlatFileWriter<W>,
    receiver: Receiver<BatchItem>,
    num_alleles: usize,
) -> Result<(usize, usize)> {
    let mut pending = BTreeMap::new();
    let mut next_index = 0;
    let mut num_failed = 0;
    for (index, name, result) in receiver {
        pending.insert(index, (name, result));
        while let Some((name, result)) = pending.remove(&next_index) {
            match result {
                Ok(patched) => writer.write(&patched)?,
                Err(err) => {
                    log::error!("{}: {}", name, err);
                    num_failed += 1;
                }
            }
            next_index += 1;
        }
    }
    if next_index < num_alleles {
        log::warn!(
            "{} of {} alleles produced no result",
            num_alleles - next_index,
            num_alleles
        );
    }
    writer.flush()?;
    Ok((writer.num_records(), num_failed))
}

fn log_summary(collection: &AlleleCollection, num_written: usize, num_failed: usize) {
    let version = collection.db_version().unwrap_or("unversioned");
    log::info!(
        "{} ({}): {} records written, {} alleles failed",
        collection.locus(),
        version,
        num_written,
        num_failed
    );
}
