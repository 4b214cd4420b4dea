use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::Context as _;

use crate::foundation::error::{PosereelError, PosereelResult};

/// Byte-level storage for image/audio/font sources and rendered output.
///
/// Retry policy, if any, belongs to implementations of this trait; the compositor treats every
/// error as fatal for the current render.
pub trait BlobStore: Send + Sync {
    /// Read the full contents stored at `uri`.
    fn get_bytes(&self, uri: &str) -> PosereelResult<Vec<u8>>;
    /// Store `bytes` at `uri`, replacing any previous content.
    fn put_bytes(&self, uri: &str, bytes: &[u8]) -> PosereelResult<()>;
}

/// Normalize and validate store-relative paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> PosereelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(PosereelError::asset("blob paths must be relative"));
    }
    if s.is_empty() {
        return Err(PosereelError::asset("blob path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PosereelError::asset("blob paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(PosereelError::asset("blob path must contain a file name"));
    }

    Ok(out.join("/"))
}

/// Strip a `file://` scheme and normalize the remainder.
pub(crate) fn normalize_uri(uri: &str) -> PosereelResult<String> {
    let rest = uri.strip_prefix("file://").unwrap_or(uri);
    if rest.contains("://") {
        return Err(PosereelError::asset(format!(
            "unsupported blob uri scheme in '{uri}'"
        )));
    }
    normalize_rel_path(rest)
}

/// Blob store backed by a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. Uris resolve relative to it.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, uri: &str) -> PosereelResult<PathBuf> {
        let norm = normalize_uri(uri)?;
        Ok(self.root.join(Path::new(&norm)))
    }
}

impl BlobStore for FsBlobStore {
    fn get_bytes(&self, uri: &str) -> PosereelResult<Vec<u8>> {
        let p = self.path_for(uri)?;
        std::fs::read(&p).map_err(|e| {
            PosereelError::asset(format!("failed to read blob '{}': {e}", p.display()))
        })
    }

    fn put_bytes(&self, uri: &str, bytes: &[u8]) -> PosereelResult<()> {
        let p = self.path_for(uri)?;
        if let Some(parent) = p.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create blob directory '{}'", parent.display()))?;
        }
        std::fs::write(&p, bytes)
            .with_context(|| format!("failed to write blob '{}'", p.display()))?;
        Ok(())
    }
}

/// In-memory blob store for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, uri: &str, bytes: Vec<u8>) -> PosereelResult<Self> {
        self.put_bytes(uri, &bytes)?;
        Ok(self)
    }

    /// Return `true` when a blob exists at `uri`.
    pub fn contains(&self, uri: &str) -> bool {
        let Ok(key) = normalize_uri(uri) else {
            return false;
        };
        self.blobs
            .read()
            .map(|m| m.contains_key(&key))
            .unwrap_or(false)
    }
}

impl BlobStore for MemoryBlobStore {
    fn get_bytes(&self, uri: &str) -> PosereelResult<Vec<u8>> {
        let key = normalize_uri(uri)?;
        let blobs = self
            .blobs
            .read()
            .map_err(|_| PosereelError::asset("memory blob store lock poisoned"))?;
        blobs
            .get(&key)
            .cloned()
            .ok_or_else(|| PosereelError::asset(format!("blob '{uri}' not found")))
    }

    fn put_bytes(&self, uri: &str, bytes: &[u8]) -> PosereelResult<()> {
        let key = normalize_uri(uri)?;
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| PosereelError::asset("memory blob store lock poisoned"))?;
        blobs.insert(key, bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;
