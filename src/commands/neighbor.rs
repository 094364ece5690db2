use super::select_aligner;
use crate::allele::load_collection;
use crate::cli::NeighborArgs;
use crate::reference::{closest_complete_neighbor, Params};
use crate::utils::Result;

pub fn neighbor(args: NeighborArgs) -> Result<()> {
    let collection = load_collection(&args.catalog_path, &args.locus)?;
    let aligner = select_aligner(args.msa_tool.as_deref())?;
    let params = Params {
        anchor_feature: args.anchor_feature,
        ..Default::default()
    };

    let template = closest_complete_neighbor(
        &collection,
        &args.allele,
        !args.exact,
        aligner.as_ref(),
        &params,
    )?;
    log::info!("{}: closest complete allele is {}", args.allele, template);
    println!("{}", template);
    Ok(())
}
