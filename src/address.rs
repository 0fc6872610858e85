//! Address parsing and the hash used as a tree key.
//!
//! The cryptographic keypair/address primitives themselves are a collaborator
//! (see the crate docs); this module only covers the two operations the
//! factory depends on directly: turning a canonical address string into an
//! [`Address`], and turning an [`Address`] into the 20-byte key the tree is
//! indexed by.

use ethereum_types::Address;
use keccak_hash::keccak;
use rustc_hex::FromHex;

use crate::error::{Error, Result};

/// The 20-byte value used to key the authenticated tree.
pub type AddressHash = Address;

/// Parses a canonical `0x`-prefixed (or bare) 40-hex-digit address string.
pub fn parse_address(addr: &str) -> Result<Address> {
    let trimmed = addr.strip_prefix("0x").unwrap_or(addr);
    let bytes: Vec<u8> = trimmed
        .from_hex()
        .map_err(|_| Error::InvalidAddress(addr.to_string()))?;
    if bytes.len() != 20 {
        return Err(Error::InvalidAddress(addr.to_string()));
    }
    Ok(Address::from_slice(&bytes))
}

/// Renders an address in its canonical `0x`-prefixed lowercase form.
pub fn format_address(addr: &Address) -> String {
    format!("{addr:#x}")
}

/// Hashes an address down to the 20-byte key used by the tree.
///
/// Truncating keccak256 to its low 20 bytes keeps the key the same width as
/// the address while still depending on every input byte.
pub fn hash_address(addr: &Address) -> AddressHash {
    let digest = keccak(addr.as_bytes());
    Address::from_slice(&digest.as_bytes()[12..])
}
