//! Per-account state mutation and delegate candidate ranking for a
//! DPoS-style chain.
//!
//! Given a block's ordered transfers and votes, [`StateFactory`] mutates
//! per-account balances, nonces, voting weight and candidacy, maintains a
//! bounded active/buffer ranking of delegate candidates, and persists the
//! result to an authenticated [`trie`], snapshotting the ranking at every
//! committed height (see [`snapshot`]).
//!
//! Out of scope: the peer-to-peer overlay, action admission, consensus
//! scheduling, block production, the cryptographic address/keypair
//! primitives, the tree's internal structure, action wire encoding, CLI, and
//! configuration loading — all treated as collaborators.

pub mod account;
pub mod actions;
pub mod address;
mod candidate;
pub mod config;
mod error;
mod factory;
mod heap;
mod ranking;
pub mod snapshot;
pub mod trie;

pub use account::Account;
pub use actions::{Transfer, Vote};
pub use address::{format_address, hash_address, parse_address, AddressHash};
pub use config::{Config, TrieBackend};
pub use error::{Error, Result};
pub use factory::StateFactory;
pub use ranking::BUFFER_CAPACITY;
pub use snapshot::CandidateSummary;
pub use trie::{InMemoryTrie, StateTrie};
