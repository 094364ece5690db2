pub mod catalog;
pub mod collection;
pub mod feature;
pub mod locus;
pub mod record;

pub use catalog::{load_collection, parse_record, read_collection};
pub use collection::AlleleCollection;
pub use feature::{normalize, Feature, FeatureKind, FeatureStatus, FeatureTable};
pub use locus::{canonical_locus, display_designation, is_same_allele, locus_of, matches_designation};
pub use record::{AlleleMetadata, AlleleRecord, AlleleView, CwdStatus};
