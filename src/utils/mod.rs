mod error;
mod io_utils;
mod memo;
mod readers;

pub use error::{handle_error_and_exit, Error, Result};
pub use io_utils::create_writer;
pub use memo::Memo;
pub use readers::open_catalog_reader;
