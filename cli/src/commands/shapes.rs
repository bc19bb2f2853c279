use anyhow::Result;
use muland::ShapefileImporter;

pub fn run(cli: &crate::cli::Cli, args: &crate::cli::ShapesArgs) -> Result<()> {
    let shapes = ShapefileImporter::new(&args.shapefile)
        .with_id_field(&args.id_field)
        .with_verbose(cli.verbose)
        .zone_wkt()?;

    for (id, wkt) in shapes {
        println!("{id}\t{wkt}");
    }
    Ok(())
}
