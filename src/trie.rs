//! The authenticated key-value tree the factory persists account records to.
//!
//! The real Merkle-Patricia trie is out of scope here (its internal structure
//! is a collaborator, per the crate docs); [`InMemoryTrie`] is a flat,
//! content-addressed stand-in that satisfies the same contract: batched
//! commit, point lookup, and a root hash that reflects every committed pair.

use std::collections::BTreeMap;

use ethereum_types::H256;
use keccak_hash::keccak;
use parity_bytes::Bytes;
use rlp::RlpStream;

use crate::address::AddressHash;
use crate::error::Result;

/// A Merkleized mapping from address-hash to account-record bytes.
pub trait StateTrie: Send {
    /// Looks up the value stored for `key`, if any.
    fn get(&self, key: &AddressHash) -> Result<Option<Bytes>>;

    /// Writes a single pair immediately (used for direct, uncommitted writes).
    fn upsert(&mut self, key: AddressHash, value: Bytes) -> Result<()>;

    /// Atomically applies a batch of pairs: either all land or none do.
    fn commit(&mut self, batch: Vec<(AddressHash, Bytes)>) -> Result<()>;

    /// The root hash reflecting every pair committed or upserted so far.
    fn root_hash(&self) -> H256;
}

/// An in-memory [`StateTrie`] keyed by address hash, rooted by hashing the
/// RLP encoding of its sorted entries.
///
/// This is the same pairing of primitives the account codec itself uses
/// (keccak over RLP bytes); it stands in for a real trie's internal
/// structure, which this crate does not implement.
#[derive(Default)]
pub struct InMemoryTrie {
    entries: BTreeMap<AddressHash, Bytes>,
    root: H256,
}

impl InMemoryTrie {
    pub fn new() -> Self {
        Self::default()
    }

    fn recompute_root(&mut self) {
        let mut stream = RlpStream::new_list(self.entries.len());
        for (key, value) in &self.entries {
            stream.begin_list(2);
            stream.append(key);
            stream.append(value);
        }
        self.root = keccak(stream.out());
    }
}

impl StateTrie for InMemoryTrie {
    fn get(&self, key: &AddressHash) -> Result<Option<Bytes>> {
        Ok(self.entries.get(key).cloned())
    }

    fn upsert(&mut self, key: AddressHash, value: Bytes) -> Result<()> {
        self.entries.insert(key, value);
        self.recompute_root();
        Ok(())
    }

    fn commit(&mut self, batch: Vec<(AddressHash, Bytes)>) -> Result<()> {
        for (key, value) in batch {
            self.entries.insert(key, value);
        }
        self.recompute_root();
        Ok(())
    }

    fn root_hash(&self) -> H256 {
        self.root
    }
}
