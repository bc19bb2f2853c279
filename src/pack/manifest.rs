use std::collections::BTreeMap;

use anyhow::{Context, Result, bail, ensure};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};

use crate::common::STORAGE_SRID;
use crate::pack::{PackSink, PackSource, get_json, put_json};

const MANIFEST: &str = "manifest.json";
const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FileHash {
    pub sha256: String,
}

impl FileHash {
    fn of(bytes: &[u8]) -> Self {
        Self { sha256: hex::encode(Sha256::digest(bytes)) }
    }
}

/// Index of a store pack: format version, storage CRS, row counts and file hashes.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Manifest {
    version: u32,
    crs: String,
    counts: BTreeMap<String, usize>,
    files: BTreeMap<String, FileHash>,
}

impl Manifest {
    pub(crate) fn new() -> Self {
        Self {
            version: VERSION,
            crs: format!("EPSG:{}", STORAGE_SRID.epsg()),
            counts: BTreeMap::new(),
            files: BTreeMap::new(),
        }
    }

    /// Record a file that has been written to the pack.
    pub(crate) fn add_file(&mut self, rel: &str, bytes: &[u8]) {
        self.files.insert(rel.to_string(), FileHash::of(bytes));
    }

    /// Add to a named row count.
    pub(crate) fn count(&mut self, name: &str, n: usize) {
        *self.counts.entry(name.to_string()).or_default() += n;
    }

    pub(crate) fn write(&self, sink: &mut dyn PackSink) -> Result<()> {
        put_json(sink, MANIFEST, self)?;
        Ok(())
    }

    /// Read the manifest and check its version and storage CRS.
    pub(crate) fn read(src: &dyn PackSource) -> Result<Self> {
        let manifest: Manifest = get_json(src, MANIFEST)?;
        ensure!(manifest.version == VERSION, "unsupported store pack version: {}", manifest.version);

        let crs = format!("EPSG:{}", STORAGE_SRID.epsg());
        ensure!(manifest.crs == crs, "store pack CRS {} does not match {crs}", manifest.crs);
        Ok(manifest)
    }

    /// Read a file listed in the manifest, checking its hash.
    pub(crate) fn get_verified(&self, src: &dyn PackSource, rel: &str) -> Result<std::sync::Arc<[u8]>> {
        let Some(expected) = self.files.get(rel) else {
            bail!("{rel} is not listed in the manifest");
        };
        let bytes = src.get(rel)?;
        let actual = FileHash::of(&bytes);
        ensure!(actual.sha256 == expected.sha256, "hash mismatch for {rel}");
        Ok(bytes)
    }

    /// Read and decode a JSON file listed in the manifest, checking its hash.
    pub(crate) fn get_json<T: DeserializeOwned>(&self, src: &dyn PackSource, rel: &str) -> Result<T> {
        let bytes = self.get_verified(src, rel)?;
        serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {rel}"))
    }
}
