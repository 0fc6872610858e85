//! A binary heap whose elements know their own position, so an arbitrary
//! element (not just the root) can be removed in O(log n).
//!
//! The candidate ranking keeps three of these over the same candidate set
//! (active min-heap, buffer min-heap, buffer max-heap); each candidate
//! carries the index fields this module reads and writes back.

use std::collections::HashMap;

use ethereum_types::Address;

use crate::candidate::Candidate;

/// Which ordering a heap enforces and which index field on [`Candidate`] it
/// keeps in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeapKind {
    ActiveMin,
    BufferMin,
    BufferMax,
}

/// An array-backed binary heap over candidate addresses, ordered by
/// `(votes, address)` ascending (min-heap kinds) or descending (max-heap).
pub(crate) struct IndexedHeap {
    kind: HeapKind,
    entries: Vec<Address>,
}

impl IndexedHeap {
    pub(crate) fn new(kind: HeapKind) -> Self {
        IndexedHeap {
            kind,
            entries: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn top(&self) -> Option<Address> {
        self.entries.first().copied()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Address> {
        self.entries.iter()
    }

    fn index_of(&self, candidate: &Candidate) -> Option<usize> {
        match self.kind {
            HeapKind::ActiveMin => candidate.active_index,
            HeapKind::BufferMin => candidate.buffer_min_index,
            HeapKind::BufferMax => candidate.buffer_max_index,
        }
    }

    fn set_index(&self, addr: Address, idx: Option<usize>, candidates: &mut HashMap<Address, Candidate>) {
        if let Some(candidate) = candidates.get_mut(&addr) {
            match self.kind {
                HeapKind::ActiveMin => candidate.active_index = idx,
                HeapKind::BufferMin => candidate.buffer_min_index = idx,
                HeapKind::BufferMax => candidate.buffer_max_index = idx,
            }
        }
    }

    /// True if `a` should sit strictly closer to the root than `b`.
    fn precedes(&self, a: Address, b: Address, candidates: &HashMap<Address, Candidate>) -> bool {
        let ka = candidates[&a].order_key();
        let kb = candidates[&b].order_key();
        match self.kind {
            HeapKind::ActiveMin | HeapKind::BufferMin => ka < kb,
            HeapKind::BufferMax => kb < ka,
        }
    }

    fn sift_up(&mut self, mut index: usize, candidates: &mut HashMap<Address, Candidate>) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.precedes(self.entries[index], self.entries[parent], candidates) {
                self.entries.swap(index, parent);
                self.set_index(self.entries[index], Some(index), candidates);
                self.set_index(self.entries[parent], Some(parent), candidates);
                index = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize, candidates: &mut HashMap<Address, Candidate>) {
        let len = self.entries.len();
        loop {
            let left = 2 * index + 1;
            let right = 2 * index + 2;
            let mut best = index;
            if left < len && self.precedes(self.entries[left], self.entries[best], candidates) {
                best = left;
            }
            if right < len && self.precedes(self.entries[right], self.entries[best], candidates) {
                best = right;
            }
            if best == index {
                break;
            }
            self.entries.swap(index, best);
            self.set_index(self.entries[index], Some(index), candidates);
            self.set_index(self.entries[best], Some(best), candidates);
            index = best;
        }
    }

    /// Restores heap order around `index` after its key changed, or after it
    /// was just overwritten by [`Self::remove_at`].
    pub(crate) fn fix(&mut self, index: usize, candidates: &mut HashMap<Address, Candidate>) {
        if index >= self.entries.len() {
            return;
        }
        if index > 0 {
            let parent = (index - 1) / 2;
            if self.precedes(self.entries[index], self.entries[parent], candidates) {
                self.sift_up(index, candidates);
                return;
            }
        }
        self.sift_down(index, candidates);
    }

    pub(crate) fn push(&mut self, addr: Address, candidates: &mut HashMap<Address, Candidate>) {
        let index = self.entries.len();
        self.entries.push(addr);
        self.set_index(addr, Some(index), candidates);
        self.sift_up(index, candidates);
    }

    /// Removes and returns the element at `index`, restoring heap order.
    pub(crate) fn remove_at(&mut self, index: usize, candidates: &mut HashMap<Address, Candidate>) -> Address {
        let last = self.entries.len() - 1;
        let removed = self.entries[index];
        if index != last {
            self.entries.swap(index, last);
        }
        self.entries.pop();
        self.set_index(removed, None, candidates);
        if index < self.entries.len() {
            self.set_index(self.entries[index], Some(index), candidates);
            self.fix(index, candidates);
        }
        removed
    }

    pub(crate) fn pop(&mut self, candidates: &mut HashMap<Address, Candidate>) -> Option<Address> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.remove_at(0, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;

    fn candidates_with(votes: &[(u64, u64)]) -> HashMap<Address, Candidate> {
        votes
            .iter()
            .map(|&(addr, v)| {
                let address = Address::from_low_u64_be(addr);
                (
                    address,
                    Candidate::new(address, Vec::new(), 0, U256::from(v)),
                )
            })
            .collect()
    }

    #[test]
    fn min_heap_pops_in_ascending_order() {
        let mut candidates = candidates_with(&[(1, 30), (2, 10), (3, 20)]);
        let mut heap = IndexedHeap::new(HeapKind::ActiveMin);
        for addr in [1u64, 2, 3] {
            heap.push(Address::from_low_u64_be(addr), &mut candidates);
        }
        let mut popped = Vec::new();
        while let Some(addr) = heap.pop(&mut candidates) {
            popped.push(candidates[&addr].votes.as_u64());
        }
        assert_eq!(popped, vec![10, 20, 30]);
    }

    #[test]
    fn max_heap_pops_in_descending_order() {
        let mut candidates = candidates_with(&[(1, 30), (2, 10), (3, 20)]);
        let mut heap = IndexedHeap::new(HeapKind::BufferMax);
        for addr in [1u64, 2, 3] {
            heap.push(Address::from_low_u64_be(addr), &mut candidates);
        }
        let mut popped = Vec::new();
        while let Some(addr) = heap.pop(&mut candidates) {
            popped.push(candidates[&addr].votes.as_u64());
        }
        assert_eq!(popped, vec![30, 20, 10]);
    }

    #[test]
    fn ties_break_by_address_ascending() {
        let mut candidates = candidates_with(&[(5, 10), (2, 10), (9, 10)]);
        let mut heap = IndexedHeap::new(HeapKind::ActiveMin);
        for addr in [5u64, 2, 9] {
            heap.push(Address::from_low_u64_be(addr), &mut candidates);
        }
        let top = heap.top().unwrap();
        assert_eq!(top, Address::from_low_u64_be(2));
    }

    #[test]
    fn remove_at_arbitrary_index_preserves_order() {
        let mut candidates = candidates_with(&[(1, 5), (2, 1), (3, 9), (4, 3), (5, 7)]);
        let mut heap = IndexedHeap::new(HeapKind::ActiveMin);
        for addr in [1u64, 2, 3, 4, 5] {
            heap.push(Address::from_low_u64_be(addr), &mut candidates);
        }
        let target = Address::from_low_u64_be(4);
        let idx = candidates[&target].active_index.unwrap();
        let removed = heap.remove_at(idx, &mut candidates);
        assert_eq!(removed, target);
        assert!(candidates[&target].active_index.is_none());

        let mut popped = Vec::new();
        while let Some(addr) = heap.pop(&mut candidates) {
            popped.push(candidates[&addr].votes.as_u64());
        }
        assert_eq!(popped, vec![1, 5, 7, 9]);
    }

    #[test]
    fn indices_stay_consistent_with_positions() {
        let mut candidates = candidates_with(&[(1, 5), (2, 1), (3, 9), (4, 3), (5, 7)]);
        let mut heap = IndexedHeap::new(HeapKind::ActiveMin);
        for addr in [1u64, 2, 3, 4, 5] {
            heap.push(Address::from_low_u64_be(addr), &mut candidates);
        }
        for (i, addr) in heap.entries.iter().enumerate() {
            assert_eq!(candidates[addr].active_index, Some(i));
        }
    }
}
