mod data;
mod fs;
mod proj;

pub(crate) use data::*;
pub(crate) use fs::*;
pub use proj::{Projection, Srid, STORAGE_SRID};
