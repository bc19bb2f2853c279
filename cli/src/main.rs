mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{import, models, query, shapes};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    match &cli.command {
        Commands::Import(args) => import::run(&cli, args),
        Commands::Query(args) => query::run(&cli, args),
        Commands::Shapes(args) => shapes::run(&cli, args),
        Commands::Models(args) => models::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
