use anyhow::Result;
use muland::Database;

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::ModelsArgs) -> Result<()> {
    let db = Database::open(&args.store)?.with_verbose(cli.verbose);
    let conn = db.connect()?;

    for model in conn.catalog().models() {
        let zones = conn.geometry().zones(model.id).count();
        let agents = conn.facts().agents.model(model.id).count();
        println!("{}\t{}\t{zones} zones\t{agents} agents", model.id, model.name);
        if cli.verbose > 0 {
            eprintln!("[models] {}: zones header {:?}", model.name, model.headers.zones);
        }
    }
    Ok(())
}
