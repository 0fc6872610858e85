//! Error taxonomy for the state factory.

use std::fmt;

use ethereum_types::{Address, U256};

/// Everything that can go wrong while mutating or reading account state.
#[derive(Debug)]
pub enum Error {
    /// An address string could not be decoded to a 20-byte address hash.
    InvalidAddress(String),
    /// The tree has no entry for the requested account.
    AccountNotExist(Address),
    /// A transfer's amount exceeds the sender's balance.
    NotEnoughBalance {
        address: Address,
        balance: U256,
        amount: U256,
    },
    /// The codec refused to produce bytes for a record.
    ///
    /// Part of the §7 error taxonomy; unreachable in this crate today
    /// because [`crate::account::Account::encode`] only ever RLP-encodes
    /// fixed-width integers, hashes and byte strings, none of which can fail
    /// to encode. Kept so a future field (or backend) that *can* reject an
    /// encode has a variant to report through without widening the taxonomy.
    FailedToMarshalState(String),
    /// The codec refused to decode bytes into a record.
    FailedToUnmarshalState(String),
    /// The tree collaborator reported a failure (I/O, commit failure, ...).
    Tree(String),
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidAddress(addr) => write!(f, "invalid address: {addr}"),
            Error::AccountNotExist(addr) => write!(f, "account does not exist: {addr:#x}"),
            Error::NotEnoughBalance {
                address,
                balance,
                amount,
            } => write!(
                f,
                "account {address:#x} has balance {balance} but a transfer of {amount} was requested"
            ),
            Error::FailedToMarshalState(msg) => write!(f, "failed to marshal account state: {msg}"),
            Error::FailedToUnmarshalState(msg) => {
                write!(f, "failed to unmarshal account state: {msg}")
            }
            Error::Tree(msg) => write!(f, "state trie error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        format!("{self}") == format!("{other}")
    }
}
