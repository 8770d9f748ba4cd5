use crate::{error::Result, hash::TruncatedHash};

/// Sole record written to a freshly created cache: the truncated mainnet
/// genesis block hash, in on-disk byte order.
pub const MAINNET_GENESIS_SEED: &str = "3fd7ba4cdd47e969d1ef0412dc9d2175";

/// Parsed mainnet genesis seed.
pub fn mainnet_genesis_seed() -> Result<TruncatedHash> {
    MAINNET_GENESIS_SEED.parse()
}
