//! The state factory: the entry point that drives a block's transfers and
//! votes, reconciles touched accounts into the candidate ranking, and
//! batch-commits to the tree.

use std::collections::HashMap;

use ethereum_types::{Address, H256, U256};
use log::trace;
use parking_lot::{Mutex, RwLock};

use crate::account::Account;
use crate::actions::{apply_transfer, apply_vote, AccountCache, Transfer, Vote};
use crate::address::{hash_address, parse_address};
use crate::config::{Config, TrieBackend};
use crate::error::{Error, Result};
use crate::ranking::CandidateRanking;
use crate::snapshot::{CandidateSummary, SnapshotCache};
use crate::trie::{InMemoryTrie, StateTrie};

/// Everything guarded by the single-writer lock: the tree and the ranking.
/// The snapshot cache is guarded separately (see [`StateFactory`]) so that
/// `CandidatesByHeight` never has to wait behind a commit-sized critical
/// section just to bump LRU recency.
struct Inner {
    trie: Box<dyn StateTrie>,
    ranking: CandidateRanking,
    current_height: u64,
}

/// Per-account state mutation and delegate candidate ranking.
///
/// `CommitStateChanges` is the sole mutating entry point and is expected to
/// be invoked serially by the caller; every other method may be called
/// concurrently with other reads, but never concurrently with a commit.
pub struct StateFactory {
    state: RwLock<Inner>,
    snapshots: Mutex<SnapshotCache>,
}

impl StateFactory {
    /// Mounts a factory against the backend named in `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let trie: Box<dyn StateTrie> = match &config.backend {
            TrieBackend::InMemory => Box::new(InMemoryTrie::new()),
            TrieBackend::Persistent { path } => {
                return Err(Error::Tree(format!(
                    "persistent backend at {} is not implemented",
                    path.display()
                )))
            }
        };

        Ok(StateFactory {
            state: RwLock::new(Inner {
                trie,
                ranking: CandidateRanking::new(config.num_active_candidates),
                current_height: 0,
            }),
            snapshots: Mutex::new(SnapshotCache::new(config.delegate_snapshot_cache_capacity)),
        })
    }

    /// Writes a fresh account directly into the tree and returns it.
    pub fn create_state(&self, address: &str, initial_balance: u64) -> Result<Account> {
        let address = parse_address(address)?;
        let account = Account::new(U256::from(initial_balance));
        let encoded = account.encode();
        let mut state = self.state.write();
        state.trie.upsert(hash_address(&address), encoded)?;
        trace!("state factory: created account {address:#x} with balance {initial_balance}");
        Ok(account)
    }

    /// The full account record for `address`.
    pub fn state(&self, address: &str) -> Result<Account> {
        let address = parse_address(address)?;
        let state = self.state.read();
        let bytes = state
            .trie
            .get(&hash_address(&address))?
            .ok_or(Error::AccountNotExist(address))?;
        Account::decode(&bytes)
    }

    pub fn balance(&self, address: &str) -> Result<U256> {
        Ok(self.state(address)?.balance)
    }

    pub fn nonce(&self, address: &str) -> Result<u64> {
        Ok(self.state(address)?.nonce)
    }

    /// The authenticated root hash reflecting the tree as of the last commit.
    pub fn root_hash(&self) -> H256 {
        self.state.read().trie.root_hash()
    }

    /// The current block height and the active pool, sorted ascending by
    /// `(votes, address)`.
    pub fn candidates(&self) -> (u64, Vec<CandidateSummary>) {
        let state = self.state.read();
        (state.current_height, state.ranking.sorted_active())
    }

    /// The active pool as of immediately after the commit at `height`, if
    /// still retained by the snapshot cache.
    pub fn candidates_by_height(&self, height: u64) -> (Vec<CandidateSummary>, bool) {
        match self.snapshots.lock().get(height) {
            Some(list) => (list, true),
            None => (Vec::new(), false),
        }
    }

    /// Applies a block's transfers then votes, reconciles every touched
    /// account into the ranking, and atomically commits to the tree.
    ///
    /// On error, the first failure aborts the whole block; the caller must
    /// not reuse the factory without recreating it.
    pub fn commit_state_changes(
        &self,
        height: u64,
        transfers: &[Transfer],
        votes: &[Vote],
    ) -> Result<()> {
        let mut state = self.state.write();
        let Inner {
            trie,
            ranking,
            current_height,
        } = &mut *state;

        let mut cache = AccountCache::new(trie.as_ref());
        let mut pending_candidates: HashMap<Address, (Vec<u8>, u64)> = HashMap::new();

        for transfer in transfers {
            apply_transfer(&mut cache, transfer)?;
        }
        for vote in votes {
            apply_vote(&mut cache, vote, height, &mut pending_candidates)?;
        }

        let modified = cache.into_modified();
        let mut batch = Vec::with_capacity(modified.len());
        for (address, account) in modified {
            batch.push((hash_address(&address), account.encode()));

            if !account.is_candidate {
                ranking.remove_candidate(address);
            } else {
                let total_votes = account.total_candidate_votes(address);
                let meta = pending_candidates.get(&address).cloned();
                ranking.update_candidate(address, total_votes, height, meta);
            }
        }

        *current_height = height;
        let snapshot = ranking.sorted_active();

        trie.commit(batch)?;

        self.snapshots.lock().insert(height, snapshot);
        trace!("state factory: committed block {height}");
        Ok(())
    }
}
