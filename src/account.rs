//! The per-address state entity and its deterministic byte encoding.

use ethereum_types::{Address, H256, U256};
use parity_bytes::Bytes;
use rlp::{Rlp, RlpStream};

use crate::error::{Error, Result};

/// Plain per-account state: balance, nonce, and the voting bookkeeping the
/// delegate candidate ranking is built on top of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Monotonically non-decreasing action counter.
    pub nonce: u64,
    /// Current balance.
    pub balance: U256,
    /// Reserved for future contract storage; always zero for plain accounts.
    pub root: H256,
    /// Reserved for future contract code; `None` for plain accounts.
    pub code_hash: Option<Bytes>,
    /// Whether this account has an active self-nomination.
    pub is_candidate: bool,
    /// Sum of the balances of other accounts currently voting for this one.
    pub voting_weight: U256,
    /// The address this account delegates its balance-weighted vote to.
    pub votee: Option<Address>,
}

impl Default for Account {
    fn default() -> Self {
        Account {
            nonce: 0,
            balance: U256::zero(),
            root: H256::zero(),
            code_hash: None,
            is_candidate: false,
            voting_weight: U256::zero(),
            votee: None,
        }
    }
}

impl Account {
    /// A freshly created account with the given balance and otherwise
    /// default fields.
    pub fn new(balance: U256) -> Self {
        Account {
            balance,
            ..Default::default()
        }
    }

    /// The total weight this account contributes to heap comparisons,
    /// assuming `address` is this account's own address.
    ///
    /// Only meaningful when `is_candidate` is true.
    pub fn total_candidate_votes(&self, address: Address) -> U256 {
        let self_weight = if self.votee == Some(address) {
            self.balance
        } else {
            U256::zero()
        };
        self.voting_weight + self_weight
    }

    /// Encodes the record to the bytes stored in the tree.
    pub fn encode(&self) -> Bytes {
        let mut stream = RlpStream::new_list(7);
        stream.append(&self.nonce);
        stream.append(&self.balance);
        stream.append(&self.root);
        stream.append(&self.code_hash.clone().unwrap_or_default());
        stream.append(&(self.is_candidate as u8));
        stream.append(&self.voting_weight);
        stream.append(&self.votee.map(|a| a.as_bytes().to_vec()).unwrap_or_default());
        stream.out()
    }

    /// Decodes bytes previously produced by [`Account::encode`].
    ///
    /// An empty slice is always rejected, so that "tree had no entry" can be
    /// told apart from "entry exists but is corrupt".
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::FailedToUnmarshalState(
                "account record is empty".into(),
            ));
        }

        let rlp = Rlp::new(data);
        let bad = |_| Error::FailedToUnmarshalState("malformed account record".into());

        let nonce: u64 = rlp.val_at(0).map_err(bad)?;
        let balance: U256 = rlp.val_at(1).map_err(bad)?;
        let root: H256 = rlp.val_at(2).map_err(bad)?;
        let code_hash_bytes: Vec<u8> = rlp.val_at(3).map_err(bad)?;
        let is_candidate_flag: u8 = rlp.val_at(4).map_err(bad)?;
        let voting_weight: U256 = rlp.val_at(5).map_err(bad)?;
        let votee_bytes: Vec<u8> = rlp.val_at(6).map_err(bad)?;

        let code_hash = if code_hash_bytes.is_empty() {
            None
        } else {
            Some(code_hash_bytes)
        };

        let votee = if votee_bytes.is_empty() {
            None
        } else if votee_bytes.len() == 20 {
            Some(Address::from_slice(&votee_bytes))
        } else {
            return Err(Error::FailedToUnmarshalState(
                "malformed votee address".into(),
            ));
        };

        Ok(Account {
            nonce,
            balance,
            root,
            code_hash,
            is_candidate: is_candidate_flag != 0,
            voting_weight,
            votee,
        })
    }
}
