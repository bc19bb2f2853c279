use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow};
use serde::{Serialize, de::DeserializeOwned};

/// Read-only access to store pack files by pack-relative path, e.g.
/// "catalog.json", "models/1/zones.wkb", "manifest.json".
pub trait PackSource: Send + Sync {
    fn get(&self, rel: &str) -> Result<Arc<[u8]>>;
    fn has(&self, rel: &str) -> bool;
}

/// Write access to store pack files by pack-relative path.
pub trait PackSink: Send + Sync {
    fn put(&mut self, rel: &str, bytes: &[u8]) -> Result<()>;
}

/// Decode a JSON pack file.
pub(crate) fn get_json<T: DeserializeOwned>(src: &dyn PackSource, rel: &str) -> Result<T> {
    let bytes = src.get(rel).with_context(|| format!("Failed to read {rel}"))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse {rel}"))
}

/// Encode a JSON pack file, returning the bytes written.
pub(crate) fn put_json<T: Serialize>(sink: &mut dyn PackSink, rel: &str, value: &T) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(value).with_context(|| format!("Failed to encode {rel}"))?;
    sink.put(rel, &bytes)?;
    Ok(bytes)
}

/// A store pack laid out as a directory on disk.
pub struct DiskPack {
    root: PathBuf,
}

impl DiskPack {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    fn full(&self, rel: &str) -> PathBuf { self.root.join(rel) }
}

impl PackSource for DiskPack {
    fn get(&self, rel: &str) -> Result<Arc<[u8]>> {
        let path = self.full(rel);
        let bytes = std::fs::read(&path)
            .with_context(|| format!("Failed to read pack file {}", path.display()))?;
        Ok(Arc::from(bytes))
    }

    fn has(&self, rel: &str) -> bool { self.full(rel).is_file() }
}

impl PackSink for DiskPack {
    fn put(&mut self, rel: &str, bytes: &[u8]) -> Result<()> {
        let path = self.full(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write pack file {}", path.display()))
    }
}

/// A store pack held in memory, keyed by pack-relative path.
#[derive(Default, Clone)]
pub struct MemPack {
    files: BTreeMap<String, Arc<[u8]>>,
}

impl MemPack {
    pub fn new() -> Self { Self::default() }

    /// Pack-relative paths currently held, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> { self.files.keys().map(String::as_str) }
}

impl PackSource for MemPack {
    fn get(&self, rel: &str) -> Result<Arc<[u8]>> {
        self.files.get(rel).cloned()
            .ok_or_else(|| anyhow!("missing pack file: {rel}"))
    }

    fn has(&self, rel: &str) -> bool { self.files.contains_key(rel) }
}

impl PackSink for MemPack {
    fn put(&mut self, rel: &str, bytes: &[u8]) -> Result<()> {
        self.files.insert(rel.to_string(), Arc::from(bytes));
        Ok(())
    }
}
