//! Trusted-hash validator:
//! 1) match the queried hash against the cached trusted list (two-phase),
//! 2) on a miss, send a locator to the trusted servers and replace the cache,
//! 3) match again; anything unverifiable fails closed.
use async_trait::async_trait;
use bitcoin::{Amount, BlockHash};
use reqwest::Url;
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    config::ValidHashConfig,
    error::Result,
    failover::{self, ServerTask},
    hash::TruncatedHash,
    headers::{ChainCursor, Locator},
    http::HttpSource,
    matcher::SyncCursor,
    servers::TrustedServers,
    source::HashSource,
    store::HashCache,
};

/// Cache and cursor; always locked together.
struct State {
    cache: HashCache,
    cursor: SyncCursor,
}

impl State {
    fn scan(&mut self, cmp: &TruncatedHash) -> bool {
        self.cursor.scan(self.cache.get(), cmp)
    }
}

/// Core store. `T` = trusted server selector, `S` = transport to the servers.
pub struct ValidHashStore<T, S = HttpSource> {
    servers: T,
    source: S,
    config: ValidHashConfig,
    state: Mutex<State>,
}

impl<T: TrustedServers> ValidHashStore<T, HttpSource> {
    /// Open (or seed) the cache at `path` and talk HTTP with default settings.
    pub fn open(path: impl Into<PathBuf>, servers: T) -> Result<Self> {
        Self::open_with_config(path, servers, ValidHashConfig::default())
    }

    /// Like [`open`](Self::open) with explicit timeouts, grace period and cap.
    pub fn open_with_config(
        path: impl Into<PathBuf>,
        servers: T,
        config: ValidHashConfig,
    ) -> Result<Self> {
        let source = HttpSource::new(&config)?;
        Ok(Self::new(HashCache::open(path)?, servers, source).with_config(config))
    }
}

impl<T, S> ValidHashStore<T, S>
where
    T: TrustedServers,
    S: HashSource,
{
    /// Create a store over an already opened cache and a custom transport.
    pub fn new(cache: HashCache, servers: T, source: S) -> Self {
        Self {
            servers,
            source,
            config: ValidHashConfig::default(),
            state: Mutex::new(State {
                cache,
                cursor: SyncCursor::default(),
            }),
        }
    }

    /// Replace the configuration (grace period, record cap).
    pub fn with_config(mut self, config: ValidHashConfig) -> Self {
        self.config = config;
        self
    }

    /// Is `hash` attested by the trusted servers?
    ///
    /// Answers from the cache when the selector's set is unchanged and the
    /// hash is the next one in sequence. Otherwise builds a locator from
    /// `chain`, optionally waits [`ValidHashConfig::grace_period`] so the
    /// servers can see a just-mined block, syncs, and matches again.
    ///
    /// The whole call, sync included, runs under the store lock.
    ///
    /// # Errors
    /// [`Error::NoServersAvailable`](crate::Error::NoServersAvailable) when
    /// every server failed (the hash is then *unverified*, never valid),
    /// [`Error::ChainStore`](crate::Error::ChainStore) if the chain cursor fails.
    pub async fn is_valid<C>(
        &self,
        hash: BlockHash,
        chain: &C,
        wait_for_server: bool,
    ) -> Result<bool>
    where
        C: ChainCursor + ?Sized,
    {
        let cmp = TruncatedHash::from_block_hash(&hash);
        let mut state = self.state.lock().await;

        if !self.servers.invalidated() && state.scan(&cmp) {
            debug!(%hash, "trusted hash cache hit");
            return Ok(true);
        }

        let locator = Locator::from_chain(chain).await?;

        if wait_for_server && !self.config.grace_period.is_zero() {
            debug!(
                grace = ?self.config.grace_period,
                "waiting for trusted servers to see the block"
            );
            tokio::time::sleep(self.config.grace_period).await;
        }

        let mut task = SyncTask {
            state: &mut *state,
            source: &self.source,
            locator: &locator,
            limit: self.config.max_hashes,
        };
        failover::run_all(&mut task, &self.servers, true).await?;

        let ok = state.scan(&cmp);
        debug!(%hash, valid = ok, "checked against fresh trusted hashes");
        Ok(ok)
    }

    /// Fee quote for a transaction of `size_bytes` moving `amount`.
    ///
    /// Failures do not count against the servers.
    pub async fn estimate_fee(&self, size_bytes: usize, amount: Amount) -> Result<Amount> {
        let mut task = FeeTask {
            source: &self.source,
            size_bytes,
            amount,
        };
        failover::run_all(&mut task, &self.servers, false).await
    }

    /// Snapshot of the cached trusted hashes, oldest first.
    pub async fn cached_hashes(&self) -> Vec<TruncatedHash> {
        self.state.lock().await.cache.get().to_vec()
    }

    /// Current matcher position.
    pub async fn cursor(&self) -> SyncCursor {
        self.state.lock().await.cursor
    }

    /// The server selector.
    pub fn servers(&self) -> &T {
        &self.servers
    }

    /// The transport.
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Download + replace against one server. A failed file rewrite is also a
/// per-server failure, like a failed read.
struct SyncTask<'a, S> {
    state: &'a mut State,
    source: &'a S,
    locator: &'a Locator,
    limit: usize,
}

#[async_trait]
impl<'a, S: HashSource> ServerTask for SyncTask<'a, S> {
    type Output = ();

    async fn run(&mut self, server: &Url) -> Result<()> {
        let hashes = self
            .source
            .download_hashes(server, self.locator.as_bytes(), self.limit)
            .await?;
        self.state.cache.replace(hashes, self.limit).await?;
        self.state.cursor.reset();
        Ok(())
    }
}

struct FeeTask<'a, S> {
    source: &'a S,
    size_bytes: usize,
    amount: Amount,
}

#[async_trait]
impl<'a, S: HashSource> ServerTask for FeeTask<'a, S> {
    type Output = Amount;

    async fn run(&mut self, server: &Url) -> Result<Amount> {
        self.source.get_fee(server, self.size_bytes, self.amount).await
    }
}
