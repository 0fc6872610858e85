//! A bounded LRU mapping block height to the active candidate list at that
//! height.

use ethereum_types::{Address, U256};
use lru_cache::LruCache;

/// A candidate's address and total votes, as exposed by `Candidates` and
/// `CandidatesByHeight`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateSummary {
    pub address: Address,
    pub votes: U256,
}

/// LRU of fixed capacity keyed by block height.
pub struct SnapshotCache {
    inner: LruCache<u64, Vec<CandidateSummary>>,
}

impl SnapshotCache {
    pub fn new(capacity: usize) -> Self {
        SnapshotCache {
            inner: LruCache::new(capacity.max(1)),
        }
    }

    /// Records the active list as of `height`. Called once per successful
    /// commit.
    pub fn insert(&mut self, height: u64, active: Vec<CandidateSummary>) {
        self.inner.insert(height, active);
    }

    /// Looks up the snapshot for `height`, if it is still retained.
    pub fn get(&mut self, height: u64) -> Option<Vec<CandidateSummary>> {
        self.inner.get_mut(&height).cloned()
    }
}
