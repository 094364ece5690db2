pub mod align;
pub mod allele;
pub mod cli;
pub mod commands;
pub mod reference;
pub mod utils;
pub mod writers;
