//! Abstractions for querying trusted servers (HTTP by default).
use async_trait::async_trait;
use bitcoin::Amount;
use reqwest::Url;

use crate::{error::Result, hash::TruncatedHash};

/// Transport to a single trusted server.
///
/// Every error is a per-attempt failure: the failover driver logs it and
/// moves on to the next candidate.
#[async_trait]
pub trait HashSource: Send + Sync {
    /// POST the raw `locator` bytes and decode the reply as consecutive
    /// 16-byte records, stopping after `limit` records. A trailing partial
    /// record is dropped.
    async fn download_hashes(
        &self,
        server: &Url,
        locator: &[u8],
        limit: usize,
    ) -> Result<Vec<TruncatedHash>>;

    /// Ask `server` for the fee of a `size_bytes` transaction moving `amount`.
    async fn get_fee(&self, server: &Url, size_bytes: usize, amount: Amount) -> Result<Amount>;
}
