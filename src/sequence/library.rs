use std::collections::BTreeMap;
use std::sync::Arc;

use crate::assets::store::BlobStore;
use crate::foundation::error::{PosereelError, PosereelResult};
use crate::sequence::posable::PosableCharacterSequence;

/// Keyed collection of reusable animation snippets ("pop_in", "<voice>_giggle1", ...).
pub trait SequenceLibrary: Send + Sync {
    /// Look up and validate the sequence stored under `id`.
    fn get_sequence(&self, id: &str) -> PosereelResult<PosableCharacterSequence>;
}

/// In-memory library.
#[derive(Clone, Debug, Default)]
pub struct MemorySequenceLibrary {
    sequences: BTreeMap<String, PosableCharacterSequence>,
}

impl MemorySequenceLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `seq` under `id`, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, seq: PosableCharacterSequence) {
        self.sequences.insert(id.into(), seq);
    }

    /// Builder-style [`MemorySequenceLibrary::insert`].
    pub fn with(mut self, id: impl Into<String>, seq: PosableCharacterSequence) -> Self {
        self.insert(id, seq);
        self
    }
}

impl SequenceLibrary for MemorySequenceLibrary {
    fn get_sequence(&self, id: &str) -> PosereelResult<PosableCharacterSequence> {
        let seq = self
            .sequences
            .get(id)
            .cloned()
            .ok_or_else(|| PosereelError::asset(format!("sequence '{id}' not found in library")))?;
        seq.validate()?;
        Ok(seq)
    }
}

/// Library reading `<prefix>/<id>.json` documents from a blob store.
#[derive(Clone)]
pub struct BlobSequenceLibrary {
    store: Arc<dyn BlobStore>,
    prefix: String,
}

impl BlobSequenceLibrary {
    /// Create a library rooted at `prefix` inside `store`.
    pub fn new(store: Arc<dyn BlobStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn uri_for(&self, id: &str) -> PosereelResult<String> {
        if id.is_empty() || id.contains('/') || id.contains('\\') {
            return Err(PosereelError::asset(format!("invalid sequence id '{id}'")));
        }
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            Ok(format!("{id}.json"))
        } else {
            Ok(format!("{prefix}/{id}.json"))
        }
    }
}

impl SequenceLibrary for BlobSequenceLibrary {
    fn get_sequence(&self, id: &str) -> PosereelResult<PosableCharacterSequence> {
        let uri = self.uri_for(id)?;
        let bytes = self.store.get_bytes(&uri)?;
        let seq: PosableCharacterSequence = serde_json::from_slice(&bytes).map_err(|e| {
            PosereelError::serde(format!("failed to parse sequence '{uri}': {e}"))
        })?;
        seq.validate()?;
        Ok(seq)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sequence/library.rs"]
mod tests;
