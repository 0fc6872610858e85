//! The candidate record tracked by the dual-heap ranking.

use ethereum_types::{Address, U256};
use parity_bytes::Bytes;

/// A candidate: an account that has self-nominated and not since unvoted.
///
/// The `*_index` fields are maintained exclusively by [`crate::heap`] and
/// [`crate::ranking`]; at most one of `active_index` or the buffer pair is
/// ever set at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub address: Address,
    pub pub_key: Bytes,
    pub creation_height: u64,
    pub last_update_height: u64,
    pub votes: U256,
    pub(crate) active_index: Option<usize>,
    pub(crate) buffer_min_index: Option<usize>,
    pub(crate) buffer_max_index: Option<usize>,
}

impl Candidate {
    pub(crate) fn new(address: Address, pub_key: Bytes, creation_height: u64, votes: U256) -> Self {
        Candidate {
            address,
            pub_key,
            creation_height,
            last_update_height: creation_height,
            votes,
            active_index: None,
            buffer_min_index: None,
            buffer_max_index: None,
        }
    }

    /// The key used by every heap comparison: votes ascending, then address
    /// ascending as a deterministic tie-breaker.
    pub(crate) fn order_key(&self) -> (U256, Address) {
        (self.votes, self.address)
    }
}
