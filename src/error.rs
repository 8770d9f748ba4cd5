//! Error taxonomy shared by the cache, the failover driver and the engine.
use std::{io, path::PathBuf};

/// Errors produced while maintaining or querying the trusted hash set.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cache file is corrupt, unreadable or unwritable.
    #[error("hash cache storage error at {}: {source}", .path.display())]
    Storage {
        /// Backing file of the cache.
        path: PathBuf,
        /// Underlying I/O failure (`InvalidData` for a corrupt length).
        #[source]
        source: io::Error,
    },

    /// The server selector ran out of candidates during a failover loop.
    #[error("no trusted servers available")]
    NoServersAvailable,

    /// Transport or protocol failure talking to a single server.
    #[error("network error: {0}")]
    Network(String),

    /// A response body (or the genesis seed) did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// The chain cursor could not read the local header chain.
    #[error("chain store error: {0:#}")]
    ChainStore(#[source] anyhow::Error),
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Storage {
            path: path.into(),
            source,
        }
    }

    /// True when the failure means no trusted server could be reached.
    /// Callers must treat the hash as unverified in that case.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::NoServersAvailable | Error::Network(_) | Error::Decode(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

/// Crate result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
