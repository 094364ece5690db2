pub mod flat_file;

pub use flat_file::{format_flat_file, FlatFileWriter};
