use clap::Parser;
use hlaref::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{consensus, neighbor, reconstruct},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Neighbor(_) => "neighbor",
        Command::Reconstruct(_) => "reconstruct",
        Command::Consensus(_) => "consensus",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Neighbor(args) => neighbor::neighbor(args)?,
        Command::Reconstruct(args) => reconstruct::reconstruct(args)?,
        Command::Consensus(args) => consensus::consensus(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
