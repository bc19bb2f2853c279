use std::path::PathBuf;

/// MULAND input assembly CLI
#[derive(clap::Parser, Debug)]
#[command(name = "muland", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Import a model directory (CSV files + shapefile) into a store
    Import(ImportArgs),

    /// Assemble the simulation input tables for a request file
    Query(QueryArgs),

    /// Print the zone polygons of a shapefile as WKT
    Shapes(ShapesArgs),

    /// List the models of a store
    Models(ModelsArgs),
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Model directory holding zones.csv, agents.csv, ... and <name>.shp
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Model name, defaults to the directory name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Store directory, created if missing
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub store: PathBuf,

    /// EPSG code of the shapefile coordinates
    #[arg(long, default_value_t = 4326)]
    pub srid: u32,
}

#[derive(clap::Args, Debug)]
pub struct QueryArgs {
    /// Request file: a JSON list of {lng, lat, units: [{type}]} locations
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub request: PathBuf,

    /// Store directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub store: PathBuf,

    /// Model name
    #[arg(short, long)]
    pub model: String,

    /// Output file, defaults to stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ShapesArgs {
    /// Polygon shapefile (.shp)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub shapefile: PathBuf,

    /// Attribute holding the zone id
    #[arg(long, default_value = "ID")]
    pub id_field: String,
}

#[derive(clap::Args, Debug)]
pub struct ModelsArgs {
    /// Store directory
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub store: PathBuf,
}
