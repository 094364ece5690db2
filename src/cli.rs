use crate::allele::canonical_locus;
use crate::reference::{available_threads, DEFAULT_ANCHOR_FEATURE};
use chrono::Datelike;
use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

type ArgResult<T> = std::result::Result<T, String>;

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="hlaref",
          version=&**FULL_VERSION,
          about="Reference reconstruction for partially sequenced HLA alleles",
          long_about = None,
          disable_help_subcommand = true,
          after_help = format!("Copyright (C) {}
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Closest complete allele for a partial allele")]
    Neighbor(NeighborArgs),
    #[clap(about = "Full-length reconstruction of partial alleles")]
    Reconstruct(ReconstructArgs),
    #[clap(about = "Consensus sequence of the complete alleles of a locus")]
    Consensus(ConsensusArgs),
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("neighbor")))]
#[command(arg_required_else_help(true))]
pub struct NeighborArgs {
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "catalog")]
    #[clap(help = "Allele catalog (plain or gzipped)")]
    #[clap(value_name = "CATALOG")]
    #[arg(value_parser = check_file_exists)]
    pub catalog_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'l')]
    #[clap(long = "locus")]
    #[clap(help = "Locus (e.g. HLA-A or A)")]
    #[clap(value_name = "LOCUS")]
    #[arg(value_parser = check_locus)]
    pub locus: String,

    #[clap(required = true)]
    #[clap(short = 'a')]
    #[clap(long = "allele")]
    #[clap(help = "Allele name or designation prefix")]
    #[clap(value_name = "ALLELE")]
    pub allele: String,

    #[clap(long = "exact")]
    #[clap(help = "Only consider the allele with exactly this name")]
    pub exact: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "msa-tool")]
    #[clap(value_name = "PROGRAM")]
    #[clap(help = "External multiple aligner (mafft, clustalo or muscle) instead of the built-in one")]
    pub msa_tool: Option<PathBuf>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "anchor-feature")]
    #[clap(value_name = "FEATURE")]
    #[clap(help = "Feature compared between alleles to rank templates")]
    #[clap(default_value = DEFAULT_ANCHOR_FEATURE)]
    pub anchor_feature: String,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("reconstruct")))]
#[command(arg_required_else_help(true))]
pub struct ReconstructArgs {
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "catalog")]
    #[clap(help = "Allele catalog (plain or gzipped)")]
    #[clap(value_name = "CATALOG")]
    #[arg(value_parser = check_file_exists)]
    pub catalog_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'l')]
    #[clap(long = "locus")]
    #[clap(help = "Locus (e.g. HLA-A or A)")]
    #[clap(value_name = "LOCUS")]
    #[arg(value_parser = check_locus)]
    pub locus: String,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(short = 'a')]
    #[clap(long = "allele")]
    #[clap(help = "Reconstruct only this allele")]
    #[clap(value_name = "ALLELE")]
    pub allele: Option<String>,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value_t = available_threads())]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "db-version")]
    #[clap(value_name = "VERSION")]
    #[clap(help = "Version of the allele database the catalog was exported from")]
    pub db_version: Option<String>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "msa-tool")]
    #[clap(value_name = "PROGRAM")]
    #[clap(help = "External multiple aligner (mafft, clustalo or muscle) instead of the built-in one")]
    pub msa_tool: Option<PathBuf>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "anchor-feature")]
    #[clap(value_name = "FEATURE")]
    #[clap(help = "Feature compared between alleles to rank templates")]
    #[clap(default_value = DEFAULT_ANCHOR_FEATURE)]
    pub anchor_feature: String,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("consensus")))]
#[command(arg_required_else_help(true))]
pub struct ConsensusArgs {
    #[clap(required = true)]
    #[clap(short = 'c')]
    #[clap(long = "catalog")]
    #[clap(help = "Allele catalog (plain or gzipped)")]
    #[clap(value_name = "CATALOG")]
    #[arg(value_parser = check_file_exists)]
    pub catalog_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'l')]
    #[clap(long = "locus")]
    #[clap(help = "Locus (e.g. HLA-A or A)")]
    #[clap(value_name = "LOCUS")]
    #[arg(value_parser = check_locus)]
    pub locus: String,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "msa-tool")]
    #[clap(value_name = "PROGRAM")]
    #[clap(help = "External multiple aligner (mafft, clustalo or muscle) instead of the built-in one")]
    pub msa_tool: Option<PathBuf>,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> ArgResult<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn threads_in_range(s: &str) -> ArgResult<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> ArgResult<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_locus(s: &str) -> ArgResult<String> {
    canonical_locus(s).map_err(|e| e.to_string())
}
