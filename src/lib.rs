#![doc = "MULAND input assembly: zone resolution, per-model fact tables and model import"]
mod assembly;
mod common;
mod error;
mod geom;
mod import;
mod pack;
mod store;
mod types;

#[doc(inline)]
pub use assembly::{AssemblyEngine, Category, Dataset, Location, Overrides, Position, QueryPoint, Table, Unit, ZoneResolver, parse_locations};

#[doc(inline)]
pub use common::{Projection, STORAGE_SRID, Srid};

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use import::{ModelImporter, ShapefileImporter};

#[doc(inline)]
pub use pack::{DiskPack, MemPack, PackSink, PackSource};

#[doc(inline)]
pub use store::*;

#[doc(inline)]
pub use types::*;
