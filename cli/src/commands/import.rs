use anyhow::{Context, Result};
use muland::{Database, ModelImporter, Srid};

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::ImportArgs) -> Result<()> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args.dir.file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .with_context(|| format!("cannot derive a model name from {}", args.dir.display()))?,
    };

    let db = if args.store.join("manifest.json").is_file() {
        Database::open(&args.store)?
    } else {
        Database::new()
    };
    let db = db.with_verbose(cli.verbose);

    eprintln!("[import] importing model {name:?} from {}", args.dir.display());
    let id = ModelImporter::new(&args.dir, &name)
        .with_srid(Srid::from_epsg(args.srid)?)
        .with_verbose(cli.verbose)
        .import(&db)?;

    eprintln!("[import] writing store to {}", args.store.display());
    db.save(&args.store)?;

    println!("{id}\t{name}");
    Ok(())
}
