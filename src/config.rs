//! Configuration consumed by the core: pool sizing, snapshot retention, and
//! which tree backend to mount. No CLI or environment parsing lives here.

use std::path::PathBuf;

/// Selects which [`crate::trie::StateTrie`] implementation backs a factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieBackend {
    /// The in-memory reference tree.
    InMemory,
    /// A disk-backed tree rooted at `path`.
    ///
    /// Not implemented by this crate; mounting one fails with
    /// [`crate::Error::Tree`].
    Persistent { path: PathBuf },
}

/// Factory configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cap of the active pool (`N`).
    pub num_active_candidates: usize,
    /// Capacity of the historical snapshot LRU.
    pub delegate_snapshot_cache_capacity: usize,
    /// Which tree collaborator to mount.
    pub backend: TrieBackend,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            num_active_candidates: 101,
            delegate_snapshot_cache_capacity: 128,
            backend: TrieBackend::InMemory,
        }
    }
}
