use std::path::PathBuf;

use crate::types::ZoneId;

/// Errors surfaced by the store, the assembly engine and the import pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested model name has no matching Model.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// A model with this name was already committed.
    #[error("model already exists: {0}")]
    ModelExists(String),

    /// A request location failed validation before any data access.
    #[error("invalid location #{index}: {reason}")]
    InvalidLocation { index: usize, reason: String },

    /// A shapefile record is not a plain polygon.
    #[error("unsupported shape type {shape_type} at record {record} of {}", .path.display())]
    UnsupportedShape { path: PathBuf, record: usize, shape_type: String },

    /// A zone listed in zones.csv has no polygon in the shapefile.
    #[error("zone {zone} has no geometry in {}", .path.display())]
    MissingZoneGeometry { path: PathBuf, zone: ZoneId },

    /// A CSV data row could not be interpreted.
    #[error("{}:{line}: {reason}", .path.display())]
    InvalidRow { path: PathBuf, line: usize, reason: String },

    /// A batch violates a key, reference or header-width rule.
    #[error("integrity violation in {table}: {reason}")]
    Integrity { table: &'static str, reason: String },

    /// An assembled record does not match its table header.
    #[error("{category}: record has {got} values, header has {expected}")]
    RecordWidth { category: &'static str, expected: usize, got: usize },

    /// The data store failed; propagated without retry.
    #[error("data store error: {0:#}")]
    Store(anyhow::Error),

    /// Reading or decoding a source file failed.
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn integrity(table: &'static str, reason: impl Into<String>) -> Self {
        Error::Integrity { table, reason: reason.into() }
    }
}
