mod manifest;
mod source;

pub(crate) use manifest::Manifest;
pub use source::{DiskPack, MemPack, PackSink, PackSource};
pub(crate) use source::{get_json, put_json};
