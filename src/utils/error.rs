use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Locus {0} has no complete allele to serve as a template")]
    NoCompleteNeighbor(String),

    #[error("Alleles {query} and {template} share no feature names")]
    NoMatchingFeatures { query: String, template: String },

    #[error("Consensus requires at least 2 complete alleles, found {0}")]
    InsufficientData(usize),

    #[error("Unrecognized locus: {0}")]
    InvalidLocus(String),

    #[error("Alignment unavailable: {0}")]
    AlignmentUnavailable(String),

    #[error("Invalid feature table for {allele}: {message}")]
    InvalidFeatureTable { allele: String, message: String },

    #[error("Error at catalog line {line}: {message}")]
    Catalog { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn handle_error_and_exit(err: Error) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}
