#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! trusted-hash-sync: cross-check recent block hashes against trusted servers
//! before an SPV wallet treats them as final.
//!
//! ## What you implement
//! - [`ChainCursor`]: the local best header and a way to walk to its parents.
//! - [`TrustedServers`]: which trusted server to try next and outcome feedback
//!   (or use the bundled [`ServerList`]).
//!
//! ## What the store does
//! - Keeps the trusted list in a flat file of 16-byte truncated hashes,
//!   seeded with the genesis record on first use.
//! - Answers [`ValidHashStore::is_valid`] from the cache while the queried
//!   hashes keep arriving in the trusted order.
//! - On a miss, posts a locator of up to 100 recent hashes to the servers
//!   (failing over between them) and replaces the cache with the reply.
//! - Quotes transaction fees from the same servers
//!   ([`ValidHashStore::estimate_fee`]).
//!
//! Fail-closed: if no server can be reached the call errors; it never
//! reports an unverified hash as valid.
//!
//! ## Minimal usage
//! ```rust,ignore
//! use trusted_hash_sync::prelude::*;
//! use bitcoin::block::Header;
//! use async_trait::async_trait;
//!
//! struct MyChain;
//! #[async_trait]
//! impl ChainCursor for MyChain {
//!     async fn head(&self) -> anyhow::Result<Header> { todo!() }
//!     async fn previous(&self, _h: &Header) -> anyhow::Result<Option<Header>> { Ok(None) }
//! }
//!
//! async fn run(hash: bitcoin::BlockHash) -> anyhow::Result<()> {
//!     let servers = ServerList::new(vec!["https://trusted.example/".parse()?]);
//!     let store = ValidHashStore::open("valid_hashes.bin", servers)?;
//!     if store.is_valid(hash, &MyChain, false).await? {
//!         // safe to treat as final
//!     }
//!     Ok(())
//! }
//! ```
/// Validator, sync and fee queries over the trusted servers.
pub mod engine;

/// Transport abstraction for talking to trusted servers.
pub mod source;

/// HTTP transport.
pub mod http;

/// Local header chain access and sync locators.
pub mod headers;

/// Trusted server selection.
pub mod servers;

/// Generic failover loop shared by sync and fee queries.
pub mod failover;

/// Limits, timeouts and [`ValidHashConfig`].
pub mod config;

/// Error type.
pub mod error;

/// Persistence of the trusted hash list.
pub mod store;

// Internal helpers:
mod checkpoints;
mod hash;
mod matcher;

// Public re-exports
pub use checkpoints::{mainnet_genesis_seed, MAINNET_GENESIS_SEED};
pub use config::ValidHashConfig;
pub use engine::ValidHashStore;
pub use error::{Error, Result};
pub use hash::TruncatedHash;
pub use headers::{ChainCursor, Locator};
pub use http::HttpSource;
pub use matcher::SyncCursor;
pub use servers::{ServerList, TrustedServers};
pub use source::HashSource;
pub use store::HashCache;

/// Convenience prelude for end users.
pub mod prelude {
    pub use crate::{
        ChainCursor, HashCache, HashSource, ServerList, TrustedServers, ValidHashConfig,
        ValidHashStore,
    };
}
