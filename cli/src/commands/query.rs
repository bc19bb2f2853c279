use std::fs;

use anyhow::{Context, Result};
use muland::{AssemblyEngine, Database, parse_locations};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::QueryArgs) -> Result<()> {
    let text = fs::read_to_string(&args.request)
        .with_context(|| format!("Failed to read request {}", args.request.display()))?;
    let request: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse request {}", args.request.display()))?;
    let locations = parse_locations(&request);
    if cli.verbose > 0 {
        eprintln!("[query] {} locations from {}", locations.len(), args.request.display());
    }

    let db = Database::open(&args.store)?.with_verbose(cli.verbose);
    let dataset = AssemblyEngine::new(&db)
        .with_verbose(cli.verbose)
        .get(&args.model, &locations)?;

    let json = serde_json::to_string_pretty(&dataset)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            if cli.verbose > 0 {
                eprintln!("[query] wrote {} tables to {}", dataset.len(), path.display());
            }
        }
        None => println!("{json}"),
    }
    Ok(())
}
