pub mod consensus;
pub mod neighbor;
pub mod reconstruct;

use crate::{
    align::{ExternalAligner, MultipleAligner, StarAligner},
    utils::Result,
};
use std::path::Path;

/// The external program when one is given, the built-in star aligner otherwise.
fn select_aligner(msa_tool: Option<&Path>) -> Result<Box<dyn MultipleAligner>> {
    match msa_tool {
        Some(program) => {
            log::debug!("Using {} for multiple alignments", program.display());
            Ok(Box::new(ExternalAligner::new(program)?))
        }
        None => Ok(Box::new(StarAligner::default())),
    }
}
