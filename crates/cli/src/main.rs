use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use iconslim_cli::cli::Cli;

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).format_timestamp(None).init();
    Cli::parse().command.run()
}
