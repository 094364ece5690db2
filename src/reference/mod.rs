pub mod batch;
pub mod consensus;
pub mod distance;
pub mod neighbor;
pub mod patch;

pub use batch::{reconstruct_all, reconstruct_one, stream_reconstructions, BatchItem, BatchReport};
pub use consensus::{build_consensus, column_consensus};
pub use distance::{aligned_distance, build_distance_matrix, DistanceMatrix};
pub use neighbor::closest_complete_neighbor;
pub use patch::{reconstruct, PatchedAllele};

use crate::utils::{Error, Result};
use rayon::ThreadPoolBuilder;

pub const DEFAULT_ANCHOR_FEATURE: &str = "Exon2";

/// Number of threads the system offers, at least 1.
pub fn available_threads() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

#[derive(Debug, Clone)]
pub struct Params {
    /// Name of the feature every allele carries; partial and complete alleles
    /// are compared over it
    pub anchor_feature: String,
    pub num_threads: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            anchor_feature: DEFAULT_ANCHOR_FEATURE.to_string(),
            num_threads: available_threads(),
        }
    }
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("hlaref-{}", i))
        .build()
        .map_err(|e| {
            Error::Io(std::io::Error::other(format!(
                "Failed to initialize thread pool: {}",
                e
            )))
        })
}
