mod external;
mod star;

pub use external::ExternalAligner;
pub use star::StarAligner;

use crate::utils::Result;

/// Multiple sequence alignment primitive.
///
/// Returns one gapped row (`-` for gaps) per input sequence, in input order,
/// all of equal width.
pub trait MultipleAligner: Send + Sync {
    fn align(&self, seqs: &[&str]) -> Result<Vec<String>>;
}
