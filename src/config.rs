//! Operational parameters: record sizes, sync limits, timeouts.
use std::time::Duration;

/// Size of one cached record (truncated block hash).
pub const TRUNCATED_HASH_LEN: usize = 16;

/// Upper bound on records kept after a sync.
pub const MAX_TRUSTED_HASHES: usize = 50_000;

/// Ancestors (head included) sent in a sync locator.
pub const MAX_LOCATOR_HASHES: usize = 100;

/// Capacity of the locator buffer: 100 full 32-byte hashes.
pub const LOCATOR_BYTES: usize = MAX_LOCATOR_HASHES * 32;

/// Connect and read timeout for each trusted-server request (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Pause before syncing for a freshly mined block (seconds).
pub const GRACE_PERIOD_SECS: u64 = 30;

/// Runtime configuration for [`crate::ValidHashStore`] and [`crate::HttpSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidHashConfig {
    /// Sleep before querying when the caller asks to wait for the servers
    /// to see a just-mined block. Zero disables the pause.
    pub grace_period: Duration,
    /// TCP/TLS connect timeout per request.
    pub connect_timeout: Duration,
    /// Read timeout per request.
    pub read_timeout: Duration,
    /// Maximum records accepted from a sync response.
    pub max_hashes: usize,
}

impl Default for ValidHashConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(GRACE_PERIOD_SECS),
            connect_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_hashes: MAX_TRUSTED_HASHES,
        }
    }
}

impl ValidHashConfig {
    /// Override the pre-sync grace period.
    pub fn with_grace_period(mut self, d: Duration) -> Self {
        self.grace_period = d;
        self
    }

    /// Override both request timeouts.
    pub fn with_timeouts(mut self, connect: Duration, read: Duration) -> Self {
        self.connect_timeout = connect;
        self.read_timeout = read;
        self
    }

    /// Override the record cap, clamped to [`MAX_TRUSTED_HASHES`].
    pub fn with_max_hashes(mut self, n: usize) -> Self {
        self.max_hashes = n.min(MAX_TRUSTED_HASHES);
        self
    }
}
