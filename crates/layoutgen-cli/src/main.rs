//! layoutgen-cli: command-line client for the layoutgen HTTP API.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod io;
mod print;


use clap::Parser;

use args::{Cli, Commands};
use client::{CliError, build_ctx_from_cli};
use handlers::{catalog, generate};

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let ctx = build_ctx_from_cli(&cli)?;

    match cli.command {
        Commands::Slides(cmd) => catalog::handle_slides(&ctx, cmd.action).await?,
        Commands::Infographics(cmd) => catalog::handle_infographics(&ctx, cmd.action).await?,
        Commands::Generate(args) => generate::handle(&ctx, args).await?,
    }

    Ok(())
}
