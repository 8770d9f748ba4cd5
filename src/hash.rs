use bitcoin::{hashes::Hash as _, BlockHash};
use std::{fmt, str::FromStr};

use crate::{config::TRUNCATED_HASH_LEN, error::Error};

/// 16-byte comparison key for a block hash.
///
/// `BlockHash::to_byte_array()` is already in internal (little-endian) order,
/// i.e. the reverse of the displayed hex, so the key is simply its prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TruncatedHash([u8; TRUNCATED_HASH_LEN]);

impl TruncatedHash {
    /// Wrap raw record bytes.
    pub const fn from_bytes(bytes: [u8; TRUNCATED_HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Key for `hash`.
    pub fn from_block_hash(hash: &BlockHash) -> Self {
        let full = hash.to_byte_array();
        let mut b = [0u8; TRUNCATED_HASH_LEN];
        b.copy_from_slice(&full[..TRUNCATED_HASH_LEN]);
        Self(b)
    }

    /// Parse one record; `None` unless `s` is exactly 16 bytes.
    pub fn from_slice(s: &[u8]) -> Option<Self> {
        <[u8; TRUNCATED_HASH_LEN]>::try_from(s).ok().map(Self)
    }

    /// Raw record bytes, as stored on disk and on the wire.
    pub fn as_bytes(&self) -> &[u8; TRUNCATED_HASH_LEN] {
        &self.0
    }
}

impl From<BlockHash> for TruncatedHash {
    fn from(h: BlockHash) -> Self {
        Self::from_block_hash(&h)
    }
}

impl fmt::Display for TruncatedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for TruncatedHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TruncatedHash({self})")
    }
}

impl FromStr for TruncatedHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut b = [0u8; TRUNCATED_HASH_LEN];
        hex::decode_to_slice(s, &mut b)
            .map_err(|e| Error::Decode(format!("truncated hash {s:?}: {e}")))?;
        Ok(Self(b))
    }
}
