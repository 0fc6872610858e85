//! The bounded delegate candidate ranking: an active top-N pool plus a
//! buffer of the next-best B candidates, kept consistent via paired heaps.

use std::collections::HashMap;

use ethereum_types::{Address, U256};
use log::warn;
use parity_bytes::Bytes;

use crate::candidate::Candidate;
use crate::heap::{HeapKind, IndexedHeap};
use crate::snapshot::CandidateSummary;

/// Buffer pool capacity; fixed rather than configured.
pub const BUFFER_CAPACITY: usize = 100;

/// Metadata carried only by a brand-new self-nomination, supplied by the
/// caller the first time a never-before-seen candidate is updated.
pub type NewCandidateMeta = (Bytes, u64);

/// The active pool plus buffer, and the candidate records backing both.
pub struct CandidateRanking {
    active_capacity: usize,
    buffer_capacity: usize,
    candidates: HashMap<Address, Candidate>,
    active: IndexedHeap,
    buffer_min: IndexedHeap,
    buffer_max: IndexedHeap,
}

impl CandidateRanking {
    pub fn new(active_capacity: usize) -> Self {
        CandidateRanking {
            active_capacity,
            buffer_capacity: BUFFER_CAPACITY,
            candidates: HashMap::new(),
            active: IndexedHeap::new(HeapKind::ActiveMin),
            buffer_min: IndexedHeap::new(HeapKind::BufferMin),
            buffer_max: IndexedHeap::new(HeapKind::BufferMax),
        }
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_min.len()
    }

    /// The active pool, sorted ascending by `(votes, address)`.
    pub fn sorted_active(&self) -> Vec<CandidateSummary> {
        let mut out: Vec<CandidateSummary> = self
            .active
            .iter()
            .map(|addr| CandidateSummary {
                address: *addr,
                votes: self.candidates[addr].votes,
            })
            .collect();
        out.sort_by_key(|c| (c.votes, c.address));
        out
    }

    #[cfg(test)]
    pub(crate) fn candidate(&self, addr: Address) -> Option<&Candidate> {
        self.candidates.get(&addr)
    }

    fn votes_of(&self, addr: Address) -> U256 {
        self.candidates[&addr].votes
    }

    /// Inserts a brand-new entrant into active or the buffer (or drops it if
    /// it fits in neither), per the capacity rules.
    ///
    /// Qualification compares `votes` alone, not the full tie-broken
    /// `order_key`: a challenger tying the incumbent on votes must not
    /// displace it merely for having a lexicographically larger address
    /// (§8.4 — strict improvement is required to swap).
    fn admit(&mut self, addr: Address) {
        let qualifies_active = self.active.len() < self.active_capacity
            || self
                .active
                .top()
                .map(|top| self.votes_of(addr) > self.votes_of(top))
                .unwrap_or(true);

        let mut overflow = None;
        if qualifies_active {
            self.active.push(addr, &mut self.candidates);
            if self.active.len() > self.active_capacity {
                overflow = self.active.pop(&mut self.candidates);
            }
        } else {
            overflow = Some(addr);
        }

        let Some(cand) = overflow else { return };

        let qualifies_buffer = self.buffer_min.len() < self.buffer_capacity
            || self
                .buffer_min
                .top()
                .map(|top| self.votes_of(cand) > self.votes_of(top))
                .unwrap_or(true);

        if qualifies_buffer {
            self.buffer_min.push(cand, &mut self.candidates);
            self.buffer_max.push(cand, &mut self.candidates);
            if self.buffer_min.len() > self.buffer_capacity {
                let evicted = self.buffer_min.pop(&mut self.candidates).unwrap();
                let evicted_max_idx = self.candidates[&evicted]
                    .buffer_max_index
                    .expect("buffer pair consistency");
                self.buffer_max.remove_at(evicted_max_idx, &mut self.candidates);
                self.candidates.remove(&evicted);
            }
        } else {
            self.candidates.remove(&cand);
        }
    }

    /// Restores the global invariant "every active candidate's votes are at
    /// least every buffered candidate's votes" by swapping the weakest
    /// active member with the strongest buffered member until it holds.
    fn balance(&mut self) {
        loop {
            let (Some(active_top), Some(buffer_top)) = (self.active.top(), self.buffer_max.top()) else {
                break;
            };
            if self.candidates[&active_top].votes >= self.candidates[&buffer_top].votes {
                break;
            }

            let demoted = self.active.pop(&mut self.candidates).unwrap();
            let promoted = self.buffer_max.pop(&mut self.candidates).unwrap();
            let promoted_min_idx = self.candidates[&promoted]
                .buffer_min_index
                .expect("buffer pair consistency");
            self.buffer_min.remove_at(promoted_min_idx, &mut self.candidates);

            self.active.push(promoted, &mut self.candidates);
            self.buffer_min.push(demoted, &mut self.candidates);
            self.buffer_max.push(demoted, &mut self.candidates);
        }
    }

    fn check_buffer_consistency(&self) {
        if self.buffer_min.len() != self.buffer_max.len() {
            warn!(
                "candidate ranking buffer heaps desynced: min={} max={}",
                self.buffer_min.len(),
                self.buffer_max.len()
            );
        }
    }

    /// Updates (or inserts) a candidate's vote total and re-sorts it into
    /// place. `new_meta` supplies `(pub_key, creation_height)` the first
    /// time an address is seen; subsequent calls ignore it.
    pub fn update_candidate(
        &mut self,
        addr: Address,
        votes: U256,
        height: u64,
        new_meta: Option<NewCandidateMeta>,
    ) {
        let is_new = !self.candidates.contains_key(&addr);
        if is_new {
            let (pub_key, creation_height) = new_meta.unwrap_or_else(|| (Bytes::new(), height));
            self.candidates
                .insert(addr, Candidate::new(addr, pub_key, creation_height, votes));
        } else {
            let candidate = self.candidates.get_mut(&addr).unwrap();
            candidate.votes = votes;
            candidate.last_update_height = height;
        }

        let active_idx = self.candidates[&addr].active_index;
        let buffer_idx = self.candidates[&addr].buffer_min_index;

        if let Some(idx) = active_idx {
            self.active.fix(idx, &mut self.candidates);
        } else if let Some(idx) = buffer_idx {
            self.buffer_min.fix(idx, &mut self.candidates);
            let max_idx = self.candidates[&addr]
                .buffer_max_index
                .expect("buffer pair consistency");
            self.buffer_max.fix(max_idx, &mut self.candidates);
        } else {
            self.admit(addr);
        }

        self.balance();
        self.check_buffer_consistency();
    }

    /// Removes a candidate from whichever pool holds it, promoting the
    /// strongest buffered candidate into the vacated active slot.
    pub fn remove_candidate(&mut self, addr: Address) {
        let Some(candidate) = self.candidates.get(&addr) else {
            return;
        };

        if let Some(active_idx) = candidate.active_index {
            self.active.remove_at(active_idx, &mut self.candidates);
            self.candidates.remove(&addr);
            if let Some(promoted) = self.buffer_max.pop(&mut self.candidates) {
                let min_idx = self.candidates[&promoted]
                    .buffer_min_index
                    .expect("buffer pair consistency");
                self.buffer_min.remove_at(min_idx, &mut self.candidates);
                self.active.push(promoted, &mut self.candidates);
            }
        } else if let Some(min_idx) = candidate.buffer_min_index {
            let max_idx = candidate.buffer_max_index.expect("buffer pair consistency");
            self.buffer_min.remove_at(min_idx, &mut self.candidates);
            self.buffer_max.remove_at(max_idx, &mut self.candidates);
            self.candidates.remove(&addr);
        }

        self.balance();
        self.check_buffer_consistency();
    }
}
