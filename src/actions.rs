//! Pure functions that interpret a block's transfers and votes against the
//! per-commit scratch of modified accounts.

use std::collections::HashMap;

use ethereum_types::{Address, U256};
use log::trace;
use parity_bytes::Bytes;

use crate::account::Account;
use crate::address::hash_address;
use crate::error::{Error, Result};
use crate::trie::StateTrie;

/// A value transfer to apply during a commit.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub sender: Address,
    pub recipient: Address,
    pub amount: U256,
    pub nonce: u64,
    pub is_coinbase: bool,
}

/// A vote (including self-nomination and unvote) to apply during a commit.
#[derive(Debug, Clone)]
pub struct Vote {
    pub voter: Address,
    /// `None` is an unvote.
    pub votee: Option<Address>,
    pub nonce: u64,
    pub self_pub_key: Bytes,
}

/// The read-through cache of accounts touched during a single commit.
///
/// On first reference, an address is loaded from the tree; a tree miss is
/// synthesized as a zero-balance account. Every later reference returns the
/// same cached, mutable record. This is the only place a read auto-creates.
pub(crate) struct AccountCache<'a> {
    trie: &'a dyn StateTrie,
    modified: HashMap<Address, Account>,
}

impl<'a> AccountCache<'a> {
    pub(crate) fn new(trie: &'a dyn StateTrie) -> Self {
        AccountCache {
            trie,
            modified: HashMap::new(),
        }
    }

    fn load(&mut self, address: Address) -> Result<&mut Account> {
        if !self.modified.contains_key(&address) {
            let account = match self.trie.get(&hash_address(&address))? {
                Some(bytes) => Account::decode(&bytes)?,
                None => {
                    trace!("state factory: {address:#x} not found in tree, synthesizing zero account");
                    Account::default()
                }
            };
            self.modified.insert(address, account);
        }
        Ok(self.modified.get_mut(&address).unwrap())
    }

    pub(crate) fn into_modified(self) -> HashMap<Address, Account> {
        self.modified
    }
}

/// Applies a single transfer: moves balance and keeps voting weight in sync
/// with whichever votee each side currently points at.
pub(crate) fn apply_transfer(cache: &mut AccountCache, transfer: &Transfer) -> Result<()> {
    if !transfer.is_coinbase {
        let (sender_balance, old_votee) = {
            let sender = cache.load(transfer.sender)?;
            if transfer.amount > sender.balance {
                return Err(Error::NotEnoughBalance {
                    address: transfer.sender,
                    balance: sender.balance,
                    amount: transfer.amount,
                });
            }
            sender.balance -= transfer.amount;
            if transfer.nonce > sender.nonce {
                sender.nonce = transfer.nonce;
            }
            (transfer.amount, sender.votee.filter(|&v| v != transfer.sender))
        };
        if let Some(old) = old_votee {
            let votee = cache.load(old)?;
            votee.voting_weight -= sender_balance;
        }
    }

    let recipient_votee = {
        let recipient = cache.load(transfer.recipient)?;
        recipient.balance += transfer.amount;
        recipient.votee.filter(|&v| v != transfer.recipient)
    };
    if let Some(votee) = recipient_votee {
        let votee_account = cache.load(votee)?;
        votee_account.voting_weight += transfer.amount;
    }

    trace!(
        "state factory: applied transfer {:#x} -> {:#x} amount={}",
        transfer.sender,
        transfer.recipient,
        transfer.amount
    );
    Ok(())
}

/// Applies a single vote: detaches from any prior votee, then either unvotes,
/// delegates to someone else, or self-nominates.
pub(crate) fn apply_vote(
    cache: &mut AccountCache,
    vote: &Vote,
    height: u64,
    new_candidates: &mut HashMap<Address, (Bytes, u64)>,
) -> Result<()> {
    let (voter_balance, old_votee) = {
        let voter = cache.load(vote.voter)?;
        if vote.nonce > voter.nonce {
            voter.nonce = vote.nonce;
        }
        let old = voter.votee.filter(|&v| v != vote.voter);
        if old.is_some() {
            voter.votee = None;
        }
        (voter.balance, old)
    };

    if let Some(old) = old_votee {
        let old_votee_account = cache.load(old)?;
        old_votee_account.voting_weight -= voter_balance;
    }

    let Some(votee) = vote.votee else {
        let voter = cache.load(vote.voter)?;
        voter.is_candidate = false;
        voter.votee = None;
        trace!("state factory: {:#x} unvoted", vote.voter);
        return Ok(());
    };

    if votee != vote.voter {
        let votee_account = cache.load(votee)?;
        votee_account.voting_weight += voter_balance;
        let voter = cache.load(vote.voter)?;
        voter.votee = Some(votee);
        trace!("state factory: {:#x} voted for {:#x}", vote.voter, votee);
    } else {
        let voter = cache.load(vote.voter)?;
        voter.votee = Some(vote.voter);
        voter.is_candidate = true;
        new_candidates
            .entry(vote.voter)
            .or_insert_with(|| (vote.self_pub_key.clone(), height));
        trace!("state factory: {:#x} self-nominated at height {height}", vote.voter);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::InMemoryTrie;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn seed(trie: &mut InMemoryTrie, address: Address, balance: u64) {
        let account = Account::new(U256::from(balance));
        trie.upsert(hash_address(&address), account.encode()).unwrap();
    }

    #[test]
    fn transfer_moves_balance_and_rejects_insufficient_funds() {
        let mut trie = InMemoryTrie::new();
        seed(&mut trie, addr(1), 100);
        seed(&mut trie, addr(2), 0);

        let mut cache = AccountCache::new(&trie);
        let err = apply_transfer(
            &mut cache,
            &Transfer {
                sender: addr(1),
                recipient: addr(2),
                amount: U256::from(1000u64),
                nonce: 1,
                is_coinbase: false,
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::NotEnoughBalance { .. }));

        apply_transfer(
            &mut cache,
            &Transfer {
                sender: addr(1),
                recipient: addr(2),
                amount: U256::from(40u64),
                nonce: 1,
                is_coinbase: false,
            },
        )
        .unwrap();

        let modified = cache.into_modified();
        assert_eq!(modified[&addr(1)].balance, U256::from(60u64));
        assert_eq!(modified[&addr(2)].balance, U256::from(40u64));
    }

    #[test]
    fn coinbase_transfer_skips_sender() {
        let mut trie = InMemoryTrie::new();
        seed(&mut trie, addr(2), 0);
        let mut cache = AccountCache::new(&trie);
        apply_transfer(
            &mut cache,
            &Transfer {
                sender: addr(1),
                recipient: addr(2),
                amount: U256::from(50u64),
                nonce: 0,
                is_coinbase: true,
            },
        )
        .unwrap();
        let modified = cache.into_modified();
        assert_eq!(modified[&addr(2)].balance, U256::from(50u64));
        assert!(!modified.contains_key(&addr(1)));
    }

    #[test]
    fn self_nomination_sets_candidacy_and_records_meta() {
        let mut trie = InMemoryTrie::new();
        seed(&mut trie, addr(1), 100);
        let mut cache = AccountCache::new(&trie);
        let mut new_candidates = HashMap::new();
        apply_vote(
            &mut cache,
            &Vote {
                voter: addr(1),
                votee: Some(addr(1)),
                nonce: 1,
                self_pub_key: vec![0xAB],
            },
            7,
            &mut new_candidates,
        )
        .unwrap();

        let modified = cache.into_modified();
        let account = &modified[&addr(1)];
        assert!(account.is_candidate);
        assert_eq!(account.votee, Some(addr(1)));
        assert_eq!(new_candidates[&addr(1)], (vec![0xAB], 7));
    }

    #[test]
    fn voting_for_another_moves_weight_without_self_candidacy() {
        let mut trie = InMemoryTrie::new();
        seed(&mut trie, addr(1), 100);
        seed(&mut trie, addr(2), 0);
        let mut cache = AccountCache::new(&trie);
        let mut new_candidates = HashMap::new();
        apply_vote(
            &mut cache,
            &Vote {
                voter: addr(1),
                votee: Some(addr(2)),
                nonce: 1,
                self_pub_key: vec![],
            },
            0,
            &mut new_candidates,
        )
        .unwrap();

        let modified = cache.into_modified();
        assert!(!modified[&addr(1)].is_candidate);
        assert_eq!(modified[&addr(1)].votee, Some(addr(2)));
        assert_eq!(modified[&addr(2)].voting_weight, U256::from(100u64));
        assert!(new_candidates.is_empty());
    }

    #[test]
    fn unvote_clears_candidacy_but_keeps_votee_weight_movement_separate() {
        let mut trie = InMemoryTrie::new();
        seed(&mut trie, addr(1), 100);
        let mut cache = AccountCache::new(&trie);
        let mut new_candidates = HashMap::new();
        apply_vote(
            &mut cache,
            &Vote {
                voter: addr(1),
                votee: Some(addr(1)),
                nonce: 1,
                self_pub_key: vec![],
            },
            0,
            &mut new_candidates,
        )
        .unwrap();
        apply_vote(
            &mut cache,
            &Vote {
                voter: addr(1),
                votee: None,
                nonce: 1,
                self_pub_key: vec![],
            },
            0,
            &mut new_candidates,
        )
        .unwrap();

        let modified = cache.into_modified();
        assert!(!modified[&addr(1)].is_candidate);
        assert_eq!(modified[&addr(1)].votee, None);
    }

    #[test]
    fn nonce_is_monotone_max_not_overwritten_by_lower_value() {
        let mut trie = InMemoryTrie::new();
        seed(&mut trie, addr(1), 100);
        let mut cache = AccountCache::new(&trie);
        apply_transfer(
            &mut cache,
            &Transfer {
                sender: addr(1),
                recipient: addr(2),
                amount: U256::zero(),
                nonce: 5,
                is_coinbase: false,
            },
        )
        .unwrap();
        apply_transfer(
            &mut cache,
            &Transfer {
                sender: addr(1),
                recipient: addr(2),
                amount: U256::zero(),
                nonce: 2,
                is_coinbase: false,
            },
        )
        .unwrap();
        let modified = cache.into_modified();
        assert_eq!(modified[&addr(1)].nonce, 5);
    }
}
