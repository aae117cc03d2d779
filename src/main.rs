//! Dropforge CLI - Beat-Synchronized Edit Synthesis
//!
//! Command-line interface for the Dropforge edit engine.

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use dropforge::cli::{commands, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Dropforge v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd)?,
        None => {
            println!("Dropforge v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
        }
    }
    Ok(())
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Process {
            original,
            vocals,
            instrumental,
            bpm,
            out_dir,
            policy,
        } => commands::process(
            &original,
            &vocals,
            &instrumental,
            bpm,
            &out_dir,
            policy.as_deref(),
        )?,
        Commands::Separate {
            input,
            out_dir,
            model,
        } => commands::separate(&input, &out_dir, &model)?,
    }
    Ok(())
}
